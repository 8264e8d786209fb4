//! Send progress display: turn output and the typing indicator

use crate::output::console::ConsoleFormatter;
use chatline_application::ports::send_progress::SendProgressNotifier;
use chatline_domain::{ChatTurn, Sender, TranscriptLabels};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Prints turns as they are appended and shows a spinner while the bot is
/// "typing".
pub struct TypingIndicator {
    labels: TranscriptLabels,
    spinner_enabled: bool,
    echo_user_turns: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl TypingIndicator {
    pub fn new(labels: TranscriptLabels) -> Self {
        Self {
            labels,
            spinner_enabled: true,
            echo_user_turns: true,
            spinner: Mutex::new(None),
        }
    }

    /// Set whether to show the spinner
    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.spinner_enabled = enabled;
        self
    }

    /// Set whether user turns are printed back (off for one-shot output)
    pub fn with_user_echo(mut self, echo: bool) -> Self {
        self.echo_user_turns = echo;
        self
    }

    pub fn is_typing(&self) -> bool {
        self.spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl SendProgressNotifier for TypingIndicator {
    fn on_input_locked(&self) {}

    fn on_turn_appended(&self, turn: &ChatTurn) {
        if turn.sender() == Sender::User && !self.echo_user_turns {
            return;
        }
        println!("{}", ConsoleFormatter::format_turn(turn, &self.labels));
    }

    fn on_typing_started(&self) {
        if !self.spinner_enabled {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message(format!("{} is typing...", self.labels.assistant_name));
        pb.enable_steady_tick(TICK);

        *self.spinner.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn on_typing_finished(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }

    fn on_input_unlocked(&self) {}
}
