//! Application-level configuration.
//!
//! - [`ChatConfig`] - send lifecycle settings

pub mod chat_config;

pub use chat_config::{ChatConfig, PersistencePolicy};
