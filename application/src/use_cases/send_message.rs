//! Send lifecycle use case.
//!
//! [`SendLifecycleController`] drives one message through its lifecycle:
//!
//! ```text
//! Idle ──(non-blank input)──> Sending ──(reply)──> Idle
//!                                │
//!                                └──(transport failure)──> Idle (error turn)
//! ```
//!
//! While `Sending`, further calls to [`send`](SendLifecycleController::send)
//! return [`SendOutcome::Rejected`] instead of queuing, so at most one request
//! is ever in flight per controller, whatever the UI does.
//!
//! Shared state lives behind a mutex that is never held across the single
//! suspension point (the endpoint call).

use super::chat_history::{HistoryStore, SaveStatus};
use super::debounced_save::DebouncedSaver;
use crate::config::{ChatConfig, PersistencePolicy};
use crate::ports::chat_endpoint::{ChatEndpoint, TransportError};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::send_progress::{NoSendProgress, SendProgressNotifier};
use chatline_domain::{ChatTurn, OutgoingMessage, SessionId, Transcript};
use chrono::{DateTime, Local};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Maximum characters of a message shown in log lines
const LOG_PREVIEW_CHARS: usize = 80;

/// Where the controller is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    /// A message is in flight; input is locked
    Sending,
    /// The conversation is being reset
    Clearing,
}

/// Result of a [`SendLifecycleController::send`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank; nothing happened
    Ignored,
    /// Another send (or a clear) was in progress; nothing happened
    Rejected,
    /// The endpoint replied
    Replied {
        reply: ChatTurn,
        /// `None` when the write was handed to the debounced saver
        persistence: Option<SaveStatus>,
    },
    /// The endpoint call failed and an error turn was appended
    Failed {
        notice: ChatTurn,
        persistence: Option<SaveStatus>,
    },
}

/// Errors from [`SendLifecycleController::clear_conversation`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClearError {
    #[error("Cannot clear the conversation while a message is being sent")]
    Busy,
}

struct Conversation {
    session_id: SessionId,
    turns: Vec<ChatTurn>,
    state: SendState,
}

/// Returns the controller to `Idle` when dropped, including when the send
/// future is cancelled mid-flight.
///
/// While `unanswered` is set the user turn has no reply yet; dropping the
/// guard in that state closes the pair with an error turn.
struct BusyGuard<'a> {
    controller: &'a SendLifecycleController,
    input_locked: bool,
    typing: bool,
    unanswered: Option<SessionId>,
}

impl BusyGuard<'_> {
    fn typing_finished(&mut self) {
        if self.typing {
            self.typing = false;
            self.controller.progress.on_typing_finished();
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.typing_finished();
        if let Some(session_id) = self.unanswered.take() {
            warn!("Send for {} was cancelled before a reply arrived", session_id);
            let notice = ChatTurn::error(self.controller.config.error_message.as_str());
            let snapshot = {
                let mut conversation = self.controller.conversation();
                conversation.turns.push(notice.clone());
                conversation.turns.clone()
            };
            self.controller.progress.on_turn_appended(&notice);
            self.controller.persist(&session_id, snapshot);
        }
        self.controller.conversation().state = SendState::Idle;
        if self.input_locked {
            self.controller.progress.on_input_unlocked();
        }
    }
}

/// Orchestrates sending messages, recording turns, and persisting history
/// for one conversation at a time.
pub struct SendLifecycleController {
    endpoint: Arc<dyn ChatEndpoint>,
    history: HistoryStore,
    saver: Option<DebouncedSaver>,
    progress: Arc<dyn SendProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    config: ChatConfig,
    inner: Mutex<Conversation>,
}

impl SendLifecycleController {
    /// Create a controller for `session_id`, restoring its saved history.
    ///
    /// With [`PersistencePolicy::Debounced`] this spawns the saver task and
    /// must be called inside a tokio runtime.
    pub fn new(
        endpoint: Arc<dyn ChatEndpoint>,
        history: HistoryStore,
        config: ChatConfig,
        session_id: SessionId,
    ) -> Self {
        let mut turns = Self::initial_turns(&config);
        let restored = history.load(&session_id);
        if !restored.is_empty() {
            info!("Restored {} turns for {}", restored.len(), session_id);
        }
        turns.extend(restored);

        let saver = match config.persistence {
            PersistencePolicy::Immediate => None,
            PersistencePolicy::Debounced { quiet_period } => {
                Some(DebouncedSaver::spawn(history.clone(), quiet_period))
            }
        };

        Self {
            endpoint,
            history,
            saver,
            progress: Arc::new(NoSendProgress),
            conversation_logger: Arc::new(NoConversationLogger),
            config,
            inner: Mutex::new(Conversation {
                session_id,
                turns,
                state: SendState::Idle,
            }),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn SendProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    fn initial_turns(config: &ChatConfig) -> Vec<ChatTurn> {
        config
            .welcome_message
            .iter()
            .map(ChatTurn::welcome)
            .collect()
    }

    fn conversation(&self) -> MutexGuard<'_, Conversation> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ==================== Accessors ====================

    pub fn session_id(&self) -> SessionId {
        self.conversation().session_id.clone()
    }

    pub fn state(&self) -> SendState {
        self.conversation().state
    }

    /// Snapshot of the visible conversation, welcome turn included
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.conversation().turns.clone()
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    // ==================== Lifecycle ====================

    /// Send one message through the full lifecycle.
    ///
    /// Blank input is ignored and a call made while another send is in
    /// flight is rejected; neither touches the conversation. Transport
    /// failures are recovered into an error turn and never retried.
    pub async fn send(&self, input: &str) -> SendOutcome {
        let Some(message) = OutgoingMessage::try_new(input) else {
            debug!("Ignoring blank input");
            return SendOutcome::Ignored;
        };

        let (session_id, user_turn) = {
            let mut conversation = self.conversation();
            if conversation.state != SendState::Idle {
                warn!(
                    "Rejecting send while {:?} ({} chars)",
                    conversation.state,
                    message.char_count()
                );
                return SendOutcome::Rejected;
            }
            conversation.state = SendState::Sending;
            let turn = ChatTurn::user(message.content());
            conversation.turns.push(turn.clone());
            (conversation.session_id.clone(), turn)
        };

        let mut guard = BusyGuard {
            controller: self,
            input_locked: true,
            typing: true,
            unanswered: Some(session_id.clone()),
        };
        self.progress.on_input_locked();
        self.progress.on_turn_appended(&user_turn);
        self.progress.on_typing_started();

        info!(
            "Sending message ({} chars) for {}",
            message.char_count(),
            session_id
        );
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "content": message.content(),
            }),
        ));

        let result = self.request_reply(&message, &session_id).await;
        guard.typing_finished();

        let (reply_turn, succeeded) = match result {
            Ok(reply) => {
                let turn = ChatTurn::bot(reply);
                debug!("Reply: {}", turn.preview(LOG_PREVIEW_CHARS));
                self.conversation_logger.log(ConversationEvent::new(
                    "bot_reply",
                    serde_json::json!({
                        "session_id": session_id.as_str(),
                        "content": turn.content(),
                    }),
                ));
                (turn, true)
            }
            Err(e) => {
                warn!("Send failed for {}: {}", session_id, e);
                self.conversation_logger.log(ConversationEvent::new(
                    "send_failed",
                    serde_json::json!({
                        "session_id": session_id.as_str(),
                        "error": e.to_string(),
                    }),
                ));
                (ChatTurn::error(self.config.error_message.as_str()), false)
            }
        };

        let snapshot = {
            let mut conversation = self.conversation();
            conversation.turns.push(reply_turn.clone());
            conversation.turns.clone()
        };
        guard.unanswered = None;
        self.progress.on_turn_appended(&reply_turn);

        let persistence = self.persist(&session_id, snapshot);
        drop(guard);

        if succeeded {
            SendOutcome::Replied {
                reply: reply_turn,
                persistence,
            }
        } else {
            SendOutcome::Failed {
                notice: reply_turn,
                persistence,
            }
        }
    }

    async fn request_reply(
        &self,
        message: &OutgoingMessage,
        session_id: &SessionId,
    ) -> Result<String, TransportError> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.endpoint.send(message.content(), session_id)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    fn persist(&self, session_id: &SessionId, turns: Vec<ChatTurn>) -> Option<SaveStatus> {
        match &self.saver {
            Some(saver) => {
                saver.request(session_id.clone(), turns);
                None
            }
            None => Some(self.history.save(session_id, &turns)),
        }
    }

    /// Forget the conversation: remove its stored record and start over
    /// under a fresh session id, which is returned.
    pub async fn clear_conversation(&self) -> Result<SessionId, ClearError> {
        let old_id = {
            let mut conversation = self.conversation();
            if conversation.state != SendState::Idle {
                return Err(ClearError::Busy);
            }
            conversation.state = SendState::Clearing;
            conversation.session_id.clone()
        };
        let guard = BusyGuard {
            controller: self,
            input_locked: false,
            typing: false,
            unanswered: None,
        };

        if let Some(saver) = &self.saver {
            saver.discard(&old_id).await;
        }
        if let Err(e) = self.history.clear(&old_id) {
            warn!("Could not remove chat history for {}: {}", old_id, e);
        }

        let new_id = SessionId::generate();
        {
            let mut conversation = self.conversation();
            conversation.session_id = new_id.clone();
            conversation.turns = Self::initial_turns(&self.config);
        }
        drop(guard);

        info!("Cleared conversation {}; new session {}", old_id, new_id);
        self.conversation_logger.log(ConversationEvent::new(
            "conversation_cleared",
            serde_json::json!({
                "previous_session_id": old_id.as_str(),
                "session_id": new_id.as_str(),
            }),
        ));
        Ok(new_id)
    }

    /// Render the visible conversation (welcome turn excluded) as a
    /// plain-text transcript.
    pub fn export_transcript(&self, generated_at: DateTime<Local>) -> Transcript {
        let (session_id, turns) = {
            let conversation = self.conversation();
            (conversation.session_id.clone(), conversation.turns.clone())
        };
        let transcript = Transcript::render(&self.config.labels, &turns, generated_at);
        self.conversation_logger.log(ConversationEvent::new(
            "transcript_exported",
            serde_json::json!({
                "session_id": session_id.as_str(),
                "file_name": transcript.file_name(),
            }),
        ));
        transcript
    }

    /// Write any history still waiting in the debounced saver.
    pub async fn flush(&self) -> Option<SaveStatus> {
        match &self.saver {
            Some(saver) => saver.flush().await,
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::key_value_store::{KeyValueStore, StoreError};
    use async_trait::async_trait;
    use chatline_domain::{Sender, TranscriptLabels};
    use crate::config::chat_config::DEFAULT_ERROR_MESSAGE;
    use chrono::TimeZone;
    use std::collections::{HashMap, VecDeque};
    use std::time::Duration;
    use tokio::sync::Notify;

    // ==================== Test Mocks ====================

    struct MockEndpoint {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        calls: Mutex<Vec<(String, SessionId)>>,
    }

    impl MockEndpoint {
        fn new(responses: Vec<Result<String, TransportError>>) -> Self {
            Self {
                responses: Mutex::new(VecDeque::from(responses)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn replying(reply: &str) -> Self {
            Self::new(vec![Ok(reply.to_string())])
        }

        fn calls(&self) -> Vec<(String, SessionId)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatEndpoint for MockEndpoint {
        async fn send(
            &self,
            message: &str,
            session_id: &SessionId,
        ) -> Result<String, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((message.to_string(), session_id.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted response".into())))
        }
    }

    /// Endpoint that blocks until released, for observing the Sending state.
    #[derive(Default)]
    struct GatedEndpoint {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChatEndpoint for GatedEndpoint {
        async fn send(
            &self,
            _message: &str,
            _session_id: &SessionId,
        ) -> Result<String, TransportError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("finally".to_string())
        }
    }

    struct SlowEndpoint;

    #[async_trait]
    impl ChatEndpoint for SlowEndpoint {
        async fn send(
            &self,
            _message: &str,
            _session_id: &SessionId,
        ) -> Result<String, TransportError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    #[derive(Default)]
    struct MapStore {
        values: Mutex<HashMap<String, String>>,
        writes: Mutex<usize>,
        reject_writes: bool,
    }

    impl MapStore {
        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }

        fn contains(&self, key: &str) -> bool {
            self.values.lock().unwrap().contains_key(key)
        }
    }

    impl KeyValueStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if self.reject_writes {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    limit: 16,
                });
            }
            *self.writes.lock().unwrap() += 1;
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl RecordingProgress {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl SendProgressNotifier for RecordingProgress {
        fn on_input_locked(&self) {
            self.push("locked".to_string());
        }

        fn on_turn_appended(&self, turn: &ChatTurn) {
            self.push(format!("turn:{}:{}", turn.sender(), turn.content()));
        }

        fn on_typing_started(&self) {
            self.push("typing".to_string());
        }

        fn on_typing_finished(&self) {
            self.push("typed".to_string());
        }

        fn on_input_unlocked(&self) {
            self.push("unlocked".to_string());
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<&'static str>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.events.lock().unwrap().push(event.event_type);
        }
    }

    struct Harness {
        controller: SendLifecycleController,
        store: Arc<MapStore>,
        history: HistoryStore,
        progress: Arc<RecordingProgress>,
        logger: Arc<RecordingLogger>,
    }

    fn session() -> SessionId {
        SessionId::parse("session_42_abcdefghi").unwrap()
    }

    fn harness_with(
        endpoint: Arc<dyn ChatEndpoint>,
        store: MapStore,
        config: ChatConfig,
    ) -> Harness {
        let store = Arc::new(store);
        let history = HistoryStore::new(store.clone());
        let progress = Arc::new(RecordingProgress::default());
        let logger = Arc::new(RecordingLogger::default());
        let controller = SendLifecycleController::new(endpoint, history.clone(), config, session())
            .with_progress(progress.clone())
            .with_conversation_logger(logger.clone());
        Harness {
            controller,
            store,
            history,
            progress,
            logger,
        }
    }

    fn harness(endpoint: Arc<dyn ChatEndpoint>) -> Harness {
        harness_with(endpoint, MapStore::default(), ChatConfig::default())
    }

    fn contents(turns: &[ChatTurn]) -> Vec<(Sender, String)> {
        turns
            .iter()
            .map(|t| (t.sender(), t.content().to_string()))
            .collect()
    }

    // ==================== Send ====================

    #[tokio::test]
    async fn test_hello_scenario() {
        let endpoint = Arc::new(MockEndpoint::replying("Hi there"));
        let h = harness(endpoint.clone());

        let outcome = h.controller.send("Hello").await;

        let SendOutcome::Replied { reply, persistence } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(reply.sender(), Sender::Bot);
        assert_eq!(reply.content(), "Hi there");
        assert_eq!(persistence, Some(SaveStatus::Saved { turns: 2 }));

        let expected = vec![
            (Sender::User, "Hello".to_string()),
            (Sender::Bot, "Hi there".to_string()),
        ];
        assert_eq!(contents(&h.controller.turns()), expected);
        assert_eq!(contents(&h.history.load(&session())), expected);
        assert_eq!(endpoint.calls(), vec![("Hello".to_string(), session())]);
        assert_eq!(h.controller.state(), SendState::Idle);
    }

    #[tokio::test]
    async fn test_input_is_trimmed_before_sending() {
        let endpoint = Arc::new(MockEndpoint::replying("ok"));
        let h = harness(endpoint.clone());

        h.controller.send("  Hello \n").await;
        assert_eq!(endpoint.calls()[0].0, "Hello");
        assert_eq!(h.controller.turns()[0].content(), "Hello");
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let endpoint = Arc::new(MockEndpoint::replying("unused"));
        let h = harness(endpoint.clone());

        for input in ["", "   ", "\n\t "] {
            assert_eq!(h.controller.send(input).await, SendOutcome::Ignored);
        }

        assert!(endpoint.calls().is_empty());
        assert!(h.controller.turns().is_empty());
        assert!(h.progress.events().is_empty());
        assert_eq!(h.store.writes(), 0);
    }

    #[tokio::test]
    async fn test_progress_sequence_on_success() {
        let h = harness(Arc::new(MockEndpoint::replying("Hi there")));

        h.controller.send("Hello").await;

        assert_eq!(
            h.progress.events(),
            vec![
                "locked",
                "turn:user:Hello",
                "typing",
                "typed",
                "turn:bot:Hi there",
                "unlocked",
            ]
        );
    }

    #[tokio::test]
    async fn test_network_failure_appends_one_error_turn() {
        let endpoint = Arc::new(MockEndpoint::new(vec![Err(TransportError::Network(
            "connection refused".to_string(),
        ))]));
        let h = harness(endpoint);

        let outcome = h.controller.send("Hello").await;

        let SendOutcome::Failed { notice, persistence } = outcome else {
            panic!("expected a failure");
        };
        assert!(notice.is_error());
        assert_eq!(notice.content(), ChatConfig::default().error_message);
        assert_eq!(persistence, Some(SaveStatus::Saved { turns: 2 }));

        let turns = h.controller.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns.iter().filter(|t| t.is_error()).count(), 1);
        assert_eq!(h.history.load(&session()), turns);

        let events = h.progress.events();
        assert_eq!(events.first().map(String::as_str), Some("locked"));
        assert_eq!(events.last().map(String::as_str), Some("unlocked"));
        assert_eq!(events.iter().filter(|e| *e == "locked").count(), 1);
        assert_eq!(events.iter().filter(|e| *e == "unlocked").count(), 1);
        assert_eq!(h.controller.state(), SendState::Idle);
        assert_eq!(
            *h.logger.events.lock().unwrap(),
            vec!["user_message", "send_failed"]
        );
    }

    #[tokio::test]
    async fn test_status_error_is_handled_like_network_error() {
        let endpoint = Arc::new(MockEndpoint::new(vec![Err(TransportError::Status {
            status: 500,
            reason: "Internal Server Error".to_string(),
        })]));
        let h = harness(endpoint);

        let outcome = h.controller.send("Hello").await;
        assert!(matches!(outcome, SendOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_lock_unlock_once_per_send() {
        let endpoint = Arc::new(MockEndpoint::new(vec![
            Ok("one".to_string()),
            Err(TransportError::Network("down".to_string())),
            Ok("three".to_string()),
        ]));
        let h = harness(endpoint);

        for input in ["a", "b", "c"] {
            h.controller.send(input).await;
        }

        let events = h.progress.events();
        assert_eq!(events.iter().filter(|e| *e == "locked").count(), 3);
        assert_eq!(events.iter().filter(|e| *e == "unlocked").count(), 3);
        assert_eq!(h.controller.turns().len(), 6);
        assert_eq!(h.store.writes(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_send_is_rejected() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let h = harness(endpoint.clone());
        let controller = Arc::new(h.controller);

        let first = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.send("first").await })
        };
        endpoint.entered.notified().await;

        assert_eq!(controller.state(), SendState::Sending);
        assert_eq!(controller.send("second").await, SendOutcome::Rejected);
        assert_eq!(controller.clear_conversation().await, Err(ClearError::Busy));

        endpoint.release.notify_one();
        let outcome = first.await.unwrap();
        assert!(matches!(outcome, SendOutcome::Replied { .. }));

        let turns = controller.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content(), "first");
        assert_eq!(controller.state(), SendState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_takes_failure_path() {
        let config = ChatConfig::default().with_request_timeout(Duration::from_secs(5));
        let h = harness_with(Arc::new(SlowEndpoint), MapStore::default(), config);

        let outcome = h.controller.send("Hello").await;

        assert!(matches!(outcome, SendOutcome::Failed { .. }));
        assert_eq!(h.controller.state(), SendState::Idle);
        assert_eq!(
            h.progress.events().last().map(String::as_str),
            Some("unlocked")
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_interrupt_send() {
        let store = MapStore {
            reject_writes: true,
            ..MapStore::default()
        };
        let h = harness_with(
            Arc::new(MockEndpoint::replying("Hi there")),
            store,
            ChatConfig::default(),
        );

        let outcome = h.controller.send("Hello").await;

        let SendOutcome::Replied { persistence, .. } = outcome else {
            panic!("expected a reply");
        };
        assert!(matches!(persistence, Some(SaveStatus::Failed(_))));
        assert_eq!(h.controller.turns().len(), 2);
        assert_eq!(h.controller.state(), SendState::Idle);
        assert_eq!(
            h.progress.events().last().map(String::as_str),
            Some("unlocked")
        );
    }

    #[tokio::test]
    async fn test_cancelled_send_returns_to_idle() {
        let endpoint = Arc::new(GatedEndpoint::default());
        let h = harness(endpoint.clone());

        {
            let send = h.controller.send("never answered");
            tokio::pin!(send);
            tokio::select! {
                _ = &mut send => panic!("send should still be pending"),
                _ = endpoint.entered.notified() => {}
            }
            assert_eq!(h.controller.state(), SendState::Sending);
        }

        assert_eq!(h.controller.state(), SendState::Idle);
        let events = h.progress.events();
        assert_eq!(events.last().map(String::as_str), Some("unlocked"));
        assert!(events.contains(&"typed".to_string()));

        // The unanswered user turn is closed with the apology, in memory and on disk
        let expected = vec![
            (Sender::User, "never answered".to_string()),
            (Sender::Bot, DEFAULT_ERROR_MESSAGE.to_string()),
        ];
        let turns = h.controller.turns();
        assert_eq!(contents(&turns), expected);
        assert!(turns[1].is_error());
        assert_eq!(contents(&h.history.load(&session())), expected);
    }

    // ==================== Restore / Clear / Export ====================

    #[tokio::test]
    async fn test_restores_history_after_welcome() {
        let store = MapStore::default();
        let saved = vec![
            ChatTurn::user("earlier").with_timestamp("08:00"),
            ChatTurn::bot("reply").with_timestamp("08:01"),
        ];
        store.set(
            &HistoryStore::key_for(&session()),
            &crate::use_cases::chat_history::encode_record(&saved).unwrap(),
        )
        .unwrap();

        let config = ChatConfig::default().with_welcome_message("Welcome!");
        let h = harness_with(Arc::new(MockEndpoint::replying("x")), store, config);

        let turns = h.controller.turns();
        assert_eq!(turns.len(), 3);
        assert!(turns[0].is_welcome());
        assert_eq!(&turns[1..], saved.as_slice());
    }

    #[tokio::test]
    async fn test_welcome_turn_is_not_persisted() {
        let config = ChatConfig::default().with_welcome_message("Welcome!");
        let h = harness_with(
            Arc::new(MockEndpoint::replying("Hi there")),
            MapStore::default(),
            config,
        );

        h.controller.send("Hello").await;

        assert_eq!(h.controller.turns().len(), 3);
        let stored = h.history.load(&session());
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|t| !t.is_welcome()));
    }

    #[tokio::test]
    async fn test_clear_assigns_new_session_with_empty_history() {
        let config = ChatConfig::default().with_welcome_message("Welcome!");
        let h = harness_with(
            Arc::new(MockEndpoint::replying("Hi there")),
            MapStore::default(),
            config,
        );
        h.controller.send("Hello").await;
        let old_key = HistoryStore::key_for(&session());
        assert!(h.store.contains(&old_key));

        let new_id = h.controller.clear_conversation().await.unwrap();

        assert_ne!(new_id, session());
        assert_eq!(h.controller.session_id(), new_id);
        assert!(!h.store.contains(&old_key));
        assert!(h.history.load(&new_id).is_empty());

        let turns = h.controller.turns();
        assert_eq!(turns.len(), 1);
        assert!(turns[0].is_welcome());
        assert_eq!(h.controller.state(), SendState::Idle);
    }

    #[tokio::test]
    async fn test_export_two_turns() {
        let config = ChatConfig::default()
            .with_welcome_message("Welcome!")
            .with_labels(TranscriptLabels {
                title: "Planning".to_string(),
                user_name: "You".to_string(),
                assistant_name: "Agent".to_string(),
            });
        let h = harness_with(
            Arc::new(MockEndpoint::replying("Hi there")),
            MapStore::default(),
            config,
        );
        h.controller.send("Hello").await;

        let generated_at = Local.with_ymd_and_hms(2025, 8, 9, 14, 30, 0).unwrap();
        let transcript = h.controller.export_transcript(generated_at);
        let contents = transcript.contents();

        assert!(contents.starts_with("Conversation Planning - 2025-08-09 14:30:00\n"));
        assert!(!contents.contains("Welcome!"));
        let you = contents.find("] You:\nHello\n\n").unwrap();
        let agent = contents.find("] Agent:\nHi there\n\n").unwrap();
        assert!(you < agent);
        assert_eq!(transcript.file_name(), "Planning_Chat_2025-08-09.txt");
    }

    // ==================== Debounced persistence ====================

    #[tokio::test(start_paused = true)]
    async fn test_debounced_policy_coalesces_writes() {
        let quiet = Duration::from_millis(1000);
        let config = ChatConfig::default()
            .with_persistence(PersistencePolicy::Debounced { quiet_period: quiet });
        let endpoint = Arc::new(MockEndpoint::new(vec![
            Ok("one".to_string()),
            Ok("two".to_string()),
        ]));
        let h = harness_with(endpoint, MapStore::default(), config);

        let first = h.controller.send("a").await;
        assert!(matches!(
            first,
            SendOutcome::Replied {
                persistence: None,
                ..
            }
        ));
        h.controller.send("b").await;
        assert_eq!(h.store.writes(), 0);

        tokio::time::sleep(quiet * 2).await;
        assert_eq!(h.store.writes(), 1);
        assert_eq!(h.history.load(&session()).len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_discards_pending_debounced_write() {
        let quiet = Duration::from_millis(1000);
        let config = ChatConfig::default()
            .with_persistence(PersistencePolicy::Debounced { quiet_period: quiet });
        let h = harness_with(
            Arc::new(MockEndpoint::replying("one")),
            MapStore::default(),
            config,
        );

        h.controller.send("a").await;
        h.controller.clear_conversation().await.unwrap();
        tokio::time::sleep(quiet * 2).await;

        assert_eq!(h.store.writes(), 0);
        assert!(h.history.load(&session()).is_empty());
    }
}
