//! HTTP adapter for the chat endpoint port

pub mod chat_client;

pub use chat_client::{DEFAULT_FALLBACK_REPLY, HttpChatEndpoint};
