//! REPL (Read-Eval-Print Loop) for interactive chat

use super::command::{self, ChatCommand};
use super::keymap;
use crate::ConsoleFormatter;
use crate::config::ReplConfig;
use chatline_application::{ClearError, SaveStatus, SendLifecycleController, SendOutcome};
use chatline_domain::{OutgoingMessage, SessionId};
use reedline::{
    DefaultPrompt, DefaultPromptSegment, Emacs, FileBackedHistory, Reedline, Signal,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Prompt line history entries kept on disk
const PROMPT_HISTORY_CAPACITY: usize = 500;

/// Interactive chat REPL
pub struct ChatRepl {
    controller: Arc<SendLifecycleController>,
    config: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(controller: Arc<SendLifecycleController>, config: ReplConfig) -> Self {
        Self { controller, config }
    }

    pub fn controller(&self) -> &SendLifecycleController {
        &self.controller
    }

    fn editor(&self) -> Reedline {
        let mut editor = Reedline::create()
            .with_edit_mode(Box::new(Emacs::new(keymap::keybindings())))
            .use_kitty_keyboard_enhancement(true)
            .use_bracketed_paste(true);

        if let Some(path) = &self.config.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(PROMPT_HISTORY_CAPACITY, path.clone()) {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => warn!("Prompt history unavailable ({}): {}", path.display(), e),
            }
        }

        editor
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(self.controller.config().labels.user_name.clone()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    match ChatCommand::parse(line) {
                        Some(Ok(command)) => {
                            if self.handle_command(command, &mut editor).await? {
                                break;
                            }
                        }
                        Some(Err(unknown)) => {
                            println!("{}", unknown);
                            println!(
                                "Type /help for available commands, or start with {} to send it as a message",
                                command::ESCAPE
                            );
                        }
                        None => {
                            self.send_line(command::message_text(line)).await;
                        }
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        self.finish().await;
        Ok(())
    }

    /// Send a canned message as if the user had typed it
    pub async fn send_quick(&self, message: &str) -> SendOutcome {
        self.send_line(message).await
    }

    async fn send_line(&self, line: &str) -> SendOutcome {
        if let Some(message) = OutgoingMessage::try_new(line) {
            let count = message.char_count();
            if count > self.config.long_message_chars {
                println!(
                    "{}",
                    ConsoleFormatter::char_count(count, self.config.long_message_chars)
                );
            }
        }

        let outcome = self.controller.send(line).await;
        match &outcome {
            SendOutcome::Rejected => {
                println!(
                    "{}",
                    ConsoleFormatter::warning("A message is already being sent; please wait.")
                );
            }
            SendOutcome::Replied { persistence, .. } | SendOutcome::Failed { persistence, .. } => {
                report_persistence(persistence.as_ref());
            }
            SendOutcome::Ignored => {}
        }
        outcome
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&self, command: ChatCommand, editor: &mut Reedline) -> io::Result<bool> {
        match command {
            ChatCommand::Quit => {
                println!("Bye!");
                return Ok(true);
            }
            ChatCommand::Help => self.print_help(),
            ChatCommand::Session => {
                println!("Session: {}", self.controller.session_id());
            }
            ChatCommand::Clear => {
                if confirm(editor, "Clear the conversation? This cannot be undone. [y/N] ")? {
                    match self.clear().await {
                        Ok(_) => {
                            println!("{}", ConsoleFormatter::notice("Conversation cleared."));
                            self.print_turns();
                        }
                        Err(e) => println!("{}", ConsoleFormatter::warning(&e.to_string())),
                    }
                }
            }
            ChatCommand::Export => match self.export() {
                Ok(path) => println!(
                    "{}",
                    ConsoleFormatter::notice(&format!("Conversation exported to {}", path.display()))
                ),
                Err(e) => println!(
                    "{}",
                    ConsoleFormatter::warning(&format!("Export failed: {}", e))
                ),
            },
        }
        Ok(false)
    }

    /// Forget the conversation and start a new session
    pub async fn clear(&self) -> Result<SessionId, ClearError> {
        self.controller.clear_conversation().await
    }

    /// Write the transcript into the export directory, returning its path
    pub fn export(&self) -> io::Result<PathBuf> {
        let transcript = self.controller.export_transcript(chrono::Local::now());
        std::fs::create_dir_all(&self.config.export_dir)?;
        let path = self.config.export_dir.join(transcript.file_name());
        std::fs::write(&path, transcript.contents())?;
        Ok(path)
    }

    /// Write pending history before leaving
    pub async fn finish(&self) {
        report_persistence(self.controller.flush().await.as_ref());
    }

    fn print_welcome(&self) {
        let config = self.controller.config();
        println!();
        println!("{}", ConsoleFormatter::header(&config.labels.title));
        println!("Type /help for commands. Enter sends, Shift+Enter adds a line.");
        println!();
        self.print_turns();
    }

    fn print_turns(&self) {
        let labels = &self.controller.config().labels;
        for turn in self.controller.turns() {
            println!("{}", ConsoleFormatter::format_turn(&turn, labels));
        }
    }

    fn print_help(&self) {
        println!();
        println!("Commands:");
        for command in ChatCommand::ALL {
            println!("  {:<10} - {}", command.as_str(), command.description());
        }
        println!(
            "  {:<10} - Send a message that starts with / (//etc/hosts sends /etc/hosts)",
            command::ESCAPE
        );
        println!();
        println!("Keys:");
        println!("  Enter        - Send");
        println!("  Shift+Enter  - New line");
        println!("  Esc          - Close an open menu");
        println!("  Ctrl+K       - Back to the input line");
        println!();
    }
}

fn report_persistence(status: Option<&SaveStatus>) {
    if let Some(SaveStatus::Failed(e)) = status {
        println!(
            "{}",
            ConsoleFormatter::warning(&format!("History could not be saved: {}", e))
        );
    }
}

fn confirm(editor: &mut Reedline, question: &str) -> io::Result<bool> {
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(question.to_string()),
        DefaultPromptSegment::Empty,
    );
    Ok(match editor.read_line(&prompt)? {
        Signal::Success(answer) => is_confirmation(&answer),
        Signal::CtrlC | Signal::CtrlD => false,
    })
}

/// Only an explicit yes confirms
fn is_confirmation(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
