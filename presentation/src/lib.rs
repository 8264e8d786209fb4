//! Presentation layer for chatline
//!
//! This crate contains CLI definitions, output formatters,
//! the typing indicator, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatAction, ChatCommand, ChatRepl};
pub use cli::commands::Cli;
pub use config::ReplConfig;
pub use output::console::ConsoleFormatter;
pub use progress::reporter::TypingIndicator;
