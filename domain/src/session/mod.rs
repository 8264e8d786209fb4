//! Session identity.
//!
//! - [`entities::SessionId`] - opaque token grouping the turns of one conversation

pub mod entities;
