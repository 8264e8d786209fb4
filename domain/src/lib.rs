//! Domain layer for chatline
//!
//! This crate contains the conversation entities and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A [`SessionId`] is an opaque, client-side token that groups the turns of
//! one conversation for persistence. It is never authenticated or verified
//! by the remote service.
//!
//! ## Conversation
//!
//! - [`ChatTurn`]: one message from the user or the bot, immutable once created
//! - [`OutgoingMessage`]: validated (trimmed, non-empty) user input
//! - [`Transcript`]: plain-text export of a conversation
//! - [`markup`]: turns message content into styled segments for rendering

pub mod conversation;
pub mod core;
pub mod session;

// Re-export commonly used types
pub use conversation::{
    markup::{self, Segment},
    message::OutgoingMessage,
    transcript::{Transcript, TranscriptLabels},
    turn::{ChatTurn, Sender, TurnKind},
};
pub use core::error::DomainError;
pub use session::entities::SessionId;
