//! Keyboard shortcuts for the chat prompt.
//!
//! [`resolve`] is the single source of truth for what a key does;
//! [`keybindings`] installs the same table into reedline. Ctrl and Cmd
//! (reported as `SUPER`) are interchangeable.

use super::command::ChatCommand;
use reedline::{
    EditCommand, KeyCode, KeyModifiers, Keybindings, ReedlineEvent, default_emacs_keybindings,
};

/// What a key press means in the chat prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Submit,
    InsertNewline,
    /// Close an open completion or help menu
    DismissOverlay,
    /// Return the cursor to the input line
    FocusInput,
    ClearHistory,
    Export,
}

impl ChatAction {
    /// The reedline event that carries out this action.
    ///
    /// Actions that need the controller come back from `read_line` as host
    /// commands, spelled like the matching slash command.
    pub fn event(self) -> ReedlineEvent {
        match self {
            ChatAction::Submit => ReedlineEvent::Enter,
            ChatAction::InsertNewline => ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
            ChatAction::DismissOverlay => ReedlineEvent::Esc,
            ChatAction::FocusInput => ReedlineEvent::Repaint,
            ChatAction::ClearHistory => host_command(ChatCommand::Clear),
            ChatAction::Export => host_command(ChatCommand::Export),
        }
    }
}

fn host_command(command: ChatCommand) -> ReedlineEvent {
    ReedlineEvent::ExecuteHostCommand(command.as_str().to_string())
}

/// Modifier sets that count as the platform "command" key
const COMMAND_MODIFIERS: [KeyModifiers; 2] = [KeyModifiers::CONTROL, KeyModifiers::SUPER];

const COMMAND_KEYS: [(char, ChatAction); 3] = [
    ('k', ChatAction::FocusInput),
    ('l', ChatAction::ClearHistory),
    ('s', ChatAction::Export),
];

/// Map a key press to a chat action, if it has one
pub fn resolve(modifiers: KeyModifiers, code: KeyCode) -> Option<ChatAction> {
    match code {
        KeyCode::Enter if modifiers == KeyModifiers::NONE => Some(ChatAction::Submit),
        KeyCode::Enter if modifiers == KeyModifiers::SHIFT => Some(ChatAction::InsertNewline),
        KeyCode::Esc if modifiers == KeyModifiers::NONE => Some(ChatAction::DismissOverlay),
        KeyCode::Char(c) if COMMAND_MODIFIERS.contains(&modifiers) => COMMAND_KEYS
            .iter()
            .find(|(key, _)| c.eq_ignore_ascii_case(key))
            .map(|(_, action)| *action),
        _ => None,
    }
}

/// Emacs keybindings with the chat shortcuts layered on top
pub fn keybindings() -> Keybindings {
    let mut bindings = default_emacs_keybindings();

    for (modifiers, code) in [
        (KeyModifiers::NONE, KeyCode::Enter),
        (KeyModifiers::SHIFT, KeyCode::Enter),
        (KeyModifiers::NONE, KeyCode::Esc),
    ] {
        if let Some(action) = resolve(modifiers, code) {
            bindings.add_binding(modifiers, code, action.event());
        }
    }

    for modifiers in COMMAND_MODIFIERS {
        for (key, action) in COMMAND_KEYS {
            bindings.add_binding(modifiers, KeyCode::Char(key), action.event());
        }
    }

    bindings
}
