//! Interactive chat module
//!
//! Provides a reedline-based interactive chat interface with slash commands
//! and keyboard shortcuts.

pub mod command;
pub mod keymap;
mod repl;

pub use command::ChatCommand;
pub use keymap::ChatAction;
pub use repl::ChatRepl;
