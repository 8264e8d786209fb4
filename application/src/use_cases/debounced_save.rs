//! Debounced history persistence.
//!
//! [`DebouncedSaver`] coalesces rapid save requests into a single
//! [`HistoryStore::save`] once no new request has arrived for the quiet
//! period. Only the latest snapshot is written (last write wins).
//!
//! The saver owns a background task; dropping it writes any pending snapshot
//! and stops the task.

use super::chat_history::{HistoryStore, SaveStatus};
use chatline_domain::{ChatTurn, SessionId};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

enum SaveCommand {
    Save(SessionId, Vec<ChatTurn>),
    Flush(oneshot::Sender<Option<SaveStatus>>),
    Discard(SessionId, oneshot::Sender<()>),
}

/// Coalescing front for a [`HistoryStore`]
pub struct DebouncedSaver {
    commands: mpsc::UnboundedSender<SaveCommand>,
    cancel: CancellationToken,
}

impl DebouncedSaver {
    /// Start the background task. Must be called inside a tokio runtime.
    pub fn spawn(history: HistoryStore, quiet_period: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        tokio::spawn(run(history, quiet_period, receiver, cancel.clone()));
        Self { commands, cancel }
    }

    /// Queue a snapshot; replaces any snapshot still waiting.
    pub fn request(&self, session_id: SessionId, turns: Vec<ChatTurn>) {
        let _ = self.commands.send(SaveCommand::Save(session_id, turns));
    }

    /// Write the pending snapshot now. Returns `None` if nothing was pending.
    pub async fn flush(&self) -> Option<SaveStatus> {
        let (reply, response) = oneshot::channel();
        self.commands.send(SaveCommand::Flush(reply)).ok()?;
        response.await.ok().flatten()
    }

    /// Drop a pending snapshot for `session_id` without writing it.
    ///
    /// Resolves once the background task has processed the request, so a
    /// subsequent store removal cannot be overtaken by a stale write.
    pub async fn discard(&self, session_id: &SessionId) {
        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(SaveCommand::Discard(session_id.clone(), reply))
            .is_ok()
        {
            let _ = response.await;
        }
    }
}

impl Drop for DebouncedSaver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    history: HistoryStore,
    quiet_period: Duration,
    mut commands: mpsc::UnboundedReceiver<SaveCommand>,
    cancel: CancellationToken,
) {
    let mut pending: Option<(SessionId, Vec<ChatTurn>)> = None;

    loop {
        let command = if pending.is_some() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => command,
                _ = tokio::time::sleep(quiet_period) => {
                    write(&history, pending.take());
                    continue;
                }
            }
        } else {
            tokio::select! {
                _ = cancel.cancelled() => break,
                command = commands.recv() => command,
            }
        };

        match command {
            Some(SaveCommand::Save(session_id, turns)) => {
                pending = Some((session_id, turns));
            }
            Some(SaveCommand::Flush(reply)) => {
                let _ = reply.send(write(&history, pending.take()));
            }
            Some(SaveCommand::Discard(session_id, reply)) => {
                if pending.as_ref().is_some_and(|(id, _)| *id == session_id) {
                    debug!("Discarding pending history write for {}", session_id);
                    pending = None;
                }
                let _ = reply.send(());
            }
            None => break,
        }
    }

    // Snapshots queued but not yet received still count as pending.
    while let Ok(command) = commands.try_recv() {
        if let SaveCommand::Save(session_id, turns) = command {
            pending = Some((session_id, turns));
        }
    }
    write(&history, pending.take());
}

fn write(history: &HistoryStore, pending: Option<(SessionId, Vec<ChatTurn>)>) -> Option<SaveStatus> {
    pending.map(|(session_id, turns)| history.save(&session_id, &turns))
}
