//! Conversation domain.
//!
//! - [`turn::ChatTurn`] - a single user or bot message
//! - [`message::OutgoingMessage`] - validated user input ready to send
//! - [`markup`] - lightweight inline formatting for rendering
//! - [`transcript::Transcript`] - plain-text export

pub mod markup;
pub mod message;
pub mod transcript;
pub mod turn;
