//! Console rendering of chat turns and notices

use colored::Colorize;
use chatline_domain::{ChatTurn, Segment, Sender, TranscriptLabels, markup};

/// Indentation of message bodies under their header line
const BODY_INDENT: &str = "  ";

/// Formats chat output for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Header line plus styled body for one turn
    pub fn format_turn(turn: &ChatTurn, labels: &TranscriptLabels) -> String {
        let name = labels.sender_name(turn.sender());
        let name = if turn.is_error() {
            name.red().bold()
        } else {
            match turn.sender() {
                Sender::User => name.cyan().bold(),
                Sender::Bot => name.green().bold(),
            }
        };

        let header = if turn.timestamp().is_empty() {
            format!("{}", name)
        } else {
            format!("{} {}", format!("[{}]", turn.timestamp()).dimmed(), name)
        };

        let body = if turn.is_error() {
            format!("{}{}", BODY_INDENT, turn.content().red())
        } else {
            Self::render_markup(turn.content())
        };

        format!("{}\n{}\n", header, body)
    }

    /// Render lightweight markup as indented, styled text
    pub fn render_markup(content: &str) -> String {
        let mut output = String::from(BODY_INDENT);
        for segment in markup::parse(content) {
            match segment {
                Segment::Text(text) => output.push_str(&text),
                Segment::Strong(text) => output.push_str(&text.bold().to_string()),
                Segment::Emphasis(text) => output.push_str(&text.italic().to_string()),
                Segment::Code(text) => output.push_str(&text.yellow().to_string()),
                Segment::LineBreak => {
                    output.push('\n');
                    output.push_str(BODY_INDENT);
                }
            }
        }
        output
    }

    /// Success notice (clear, export)
    pub fn notice(message: &str) -> String {
        format!("{} {}", "v".green(), message)
    }

    /// Non-fatal problem the user should know about
    pub fn warning(message: &str) -> String {
        format!("{} {}", "!".yellow(), message.yellow())
    }

    /// Character count of a message; highlighted once it exceeds `limit`
    pub fn char_count(count: usize, limit: usize) -> String {
        let text = format!("{} characters", count);
        if count > limit {
            format!("{} {}", text.red().bold(), format!("(over {})", limit).red())
        } else {
            text.dimmed().to_string()
        }
    }

    pub fn header(title: &str) -> String {
        let line = "=".repeat(50);
        format!("{}\n{}\n{}", line.dimmed(), title.bold(), line.dimmed())
    }
}
