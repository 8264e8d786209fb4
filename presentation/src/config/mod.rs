//! Presentation-level configuration
//!
//! Settings for the interactive prompt that the application layer does not
//! care about.

use std::path::PathBuf;

/// REPL configuration for the presentation layer
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Highlight the character count above this many characters
    pub long_message_chars: usize,
    /// Directory exported transcripts are written to
    pub export_dir: PathBuf,
    /// Prompt line history file (`None` keeps it in memory)
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            long_message_chars: 900,
            export_dir: PathBuf::from("."),
            history_file: dirs::data_dir().map(|d| d.join("chatline").join("prompt_history.txt")),
        }
    }
}

impl ReplConfig {
    pub fn with_long_message_chars(mut self, chars: usize) -> Self {
        self.long_message_chars = chars;
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }
}
