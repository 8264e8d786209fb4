//! Slash commands typed at the chat prompt

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    Clear,
    Export,
    Session,
    Quit,
}

/// A line that starts with `/` but names no known command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown command: {}", self.0)
    }
}

/// Prefix that sends a line starting with `/` as a message
pub const ESCAPE: &str = "//";

/// Message text of a non-command line: `//etc` is sent as `/etc`
pub fn message_text(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with(ESCAPE) {
        &trimmed[1..]
    } else {
        line
    }
}

impl ChatCommand {
    pub const ALL: [ChatCommand; 5] = [
        ChatCommand::Help,
        ChatCommand::Clear,
        ChatCommand::Export,
        ChatCommand::Session,
        ChatCommand::Quit,
    ];

    /// Parse a prompt line. Returns `None` for ordinary messages, including
    /// lines escaped with `//`.
    pub fn parse(line: &str) -> Option<Result<Self, UnknownCommand>> {
        let line = line.trim();
        if !line.starts_with('/') || line.starts_with(ESCAPE) {
            return None;
        }

        let command = match line {
            "/help" | "/h" | "/?" => ChatCommand::Help,
            "/clear" => ChatCommand::Clear,
            "/export" | "/save" => ChatCommand::Export,
            "/session" => ChatCommand::Session,
            "/quit" | "/exit" | "/q" => ChatCommand::Quit,
            other => return Some(Err(UnknownCommand(other.to_string()))),
        };
        Some(Ok(command))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChatCommand::Help => "/help",
            ChatCommand::Clear => "/clear",
            ChatCommand::Export => "/export",
            ChatCommand::Session => "/session",
            ChatCommand::Quit => "/quit",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ChatCommand::Help => "Show this help",
            ChatCommand::Clear => "Clear the conversation (Ctrl+L)",
            ChatCommand::Export => "Export the conversation to a text file (Ctrl+S)",
            ChatCommand::Session => "Show the current session id",
            ChatCommand::Quit => "Exit chat",
        }
    }
}
