//! Send progress notification port
//!
//! Defines the callbacks a front end receives while a message is being sent:
//! input locking, the typing indicator, and appended turns.

use chatline_domain::ChatTurn;

/// Callback for state changes during a send.
///
/// Implementations live in the presentation layer. For every accepted send
/// the order is: `on_input_locked`, `on_turn_appended` (user turn),
/// `on_typing_started`, `on_typing_finished`, `on_turn_appended` (reply or
/// error turn), `on_input_unlocked`.
pub trait SendProgressNotifier: Send + Sync {
    /// Input and send affordance are disabled
    fn on_input_locked(&self);

    /// A turn was appended to the conversation
    fn on_turn_appended(&self, turn: &ChatTurn);

    /// The request is in flight
    fn on_typing_started(&self) {}

    /// The request finished, successfully or not
    fn on_typing_finished(&self) {}

    /// Input is enabled again and should regain focus
    fn on_input_unlocked(&self);
}

/// No-op notifier for when nothing is displayed
pub struct NoSendProgress;

impl SendProgressNotifier for NoSendProgress {
    fn on_input_locked(&self) {}
    fn on_turn_appended(&self, _turn: &ChatTurn) {}
    fn on_input_unlocked(&self) {}
}
