//! Use cases (application services)

pub mod chat_history;
pub mod debounced_save;
pub mod send_message;
