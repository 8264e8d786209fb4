//! Chat turn entity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// What a turn represents in the conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    /// Regular message
    #[default]
    Message,
    /// Generic apology shown when the endpoint call failed
    Error,
    /// Greeting placeholder; never persisted or exported
    Welcome,
}

impl TurnKind {
    pub fn is_message(&self) -> bool {
        matches!(self, TurnKind::Message)
    }
}

/// One message in a conversation (Entity)
///
/// Immutable once created. The stored form is
/// `{"sender": "user", "content": "...", "timestamp": "14:05"}`; `kind` is
/// only written for error and welcome turns, and records using the older
/// `time` field name still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    sender: Sender,
    content: String,
    #[serde(alias = "time")]
    timestamp: String,
    #[serde(default, skip_serializing_if = "TurnKind::is_message")]
    kind: TurnKind,
}

impl ChatTurn {
    fn now(sender: Sender, kind: TurnKind, content: impl Into<String>) -> Self {
        Self {
            sender,
            content: content.into(),
            timestamp: Self::clock_label(),
            kind,
        }
    }

    /// A message typed by the user, stamped with the current local time
    pub fn user(content: impl Into<String>) -> Self {
        Self::now(Sender::User, TurnKind::Message, content)
    }

    /// A reply from the bot
    pub fn bot(content: impl Into<String>) -> Self {
        Self::now(Sender::Bot, TurnKind::Message, content)
    }

    /// An error-flagged bot turn
    pub fn error(content: impl Into<String>) -> Self {
        Self::now(Sender::Bot, TurnKind::Error, content)
    }

    /// The greeting shown at the top of an empty conversation
    pub fn welcome(content: impl Into<String>) -> Self {
        Self::now(Sender::Bot, TurnKind::Welcome, content)
    }

    /// Replace the timestamp label
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Local wall-clock label used for turn timestamps (`HH:MM`)
    pub fn clock_label() -> String {
        chrono::Local::now().format("%H:%M").to_string()
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn kind(&self) -> TurnKind {
        self.kind
    }

    pub fn is_error(&self) -> bool {
        self.kind == TurnKind::Error
    }

    pub fn is_welcome(&self) -> bool {
        self.kind == TurnKind::Welcome
    }

    /// Short single-line preview for logs.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.content.replace('\n', " ");
        if flat.chars().count() <= max_chars {
            return flat;
        }
        let cut: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
