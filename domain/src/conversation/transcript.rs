//! Plain-text transcript export

use super::markup;
use super::turn::{ChatTurn, Sender};
use chrono::{DateTime, TimeZone};

/// Width of the rule under the header line
const RULE_WIDTH: usize = 60;

/// Display names used when rendering a transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLabels {
    /// Conversation title, used in the header and file name
    pub title: String,
    /// Name shown for user turns
    pub user_name: String,
    /// Name shown for bot turns
    pub assistant_name: String,
}

impl TranscriptLabels {
    pub fn sender_name(&self, sender: Sender) -> &str {
        match sender {
            Sender::User => &self.user_name,
            Sender::Bot => &self.assistant_name,
        }
    }
}

impl Default for TranscriptLabels {
    fn default() -> Self {
        Self {
            title: "Chatline".to_string(),
            user_name: "You".to_string(),
            assistant_name: "Assistant".to_string(),
        }
    }
}

/// A rendered transcript ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    file_name: String,
    contents: String,
}

impl Transcript {
    /// Render the turns in order, skipping the welcome turn. Message bodies
    /// are written as plain text with markup delimiters removed.
    ///
    /// Layout:
    /// ```text
    /// Conversation <title> - <date time>
    /// ============================================================
    ///
    /// [09:15] You:
    /// Hello
    ///
    /// ```
    pub fn render<Tz>(labels: &TranscriptLabels, turns: &[ChatTurn], generated_at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut contents = format!(
            "Conversation {} - {}\n",
            labels.title,
            generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        contents.push_str(&"=".repeat(RULE_WIDTH));
        contents.push_str("\n\n");

        for turn in turns.iter().filter(|t| !t.is_welcome()) {
            contents.push_str(&format!(
                "[{}] {}:\n{}\n\n",
                turn.timestamp(),
                labels.sender_name(turn.sender()),
                markup::plain_text(turn.content())
            ));
        }

        let file_name = format!(
            "{}_Chat_{}.txt",
            labels.title.replace(['/', '\\'], "_"),
            generated_at.format("%Y-%m-%d")
        );

        Self {
            file_name,
            contents,
        }
    }

    /// Suggested file name, e.g. `Chatline_Chat_2025-08-09.txt`
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn into_contents(self) -> String {
        self.contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 9, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_two_turns_in_order() {
        let turns = vec![
            ChatTurn::user("Hello").with_timestamp("14:29"),
            ChatTurn::bot("Hi there").with_timestamp("14:30"),
        ];
        let transcript = Transcript::render(&TranscriptLabels::default(), &turns, fixed_time());

        let expected = format!(
            "Conversation Chatline - 2025-08-09 14:30:00\n{}\n\n\
             [14:29] You:\nHello\n\n\
             [14:30] Assistant:\nHi there\n\n",
            "=".repeat(60)
        );
        assert_eq!(transcript.contents(), expected);
    }

    #[test]
    fn test_welcome_turn_excluded() {
        let turns = vec![
            ChatTurn::welcome("Welcome!"),
            ChatTurn::user("Question").with_timestamp("10:00"),
        ];
        let transcript = Transcript::render(&TranscriptLabels::default(), &turns, fixed_time());
        assert!(!transcript.contents().contains("Welcome!"));
        assert_eq!(transcript.contents().matches("[10:00]").count(), 1);
    }

    #[test]
    fn test_markup_is_stripped() {
        let turns = vec![
            ChatTurn::bot("Use **R-1** zoning\nand `permit-7` *soon*").with_timestamp("11:00"),
            ChatTurn::user("2 * 3 = 6").with_timestamp("11:01"),
        ];
        let transcript = Transcript::render(&TranscriptLabels::default(), &turns, fixed_time());
        assert!(
            transcript
                .contents()
                .contains("[11:00] Assistant:\nUse R-1 zoning\nand permit-7 soon\n\n")
        );
        assert!(transcript.contents().contains("[11:01] You:\n2 * 3 = 6\n\n"));
    }

    #[test]
    fn test_file_name() {
        let labels = TranscriptLabels {
            title: "Planning/Agent".to_string(),
            ..TranscriptLabels::default()
        };
        let transcript = Transcript::render(&labels, &[], fixed_time());
        assert_eq!(transcript.file_name(), "Planning_Agent_Chat_2025-08-09.txt");
    }
}
