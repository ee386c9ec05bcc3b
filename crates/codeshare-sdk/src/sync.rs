//! # Session Sync
//!
//! Keeps a local copy of a session in step with the server.
//!
//! One tokio task per followed session drives three timers:
//!
//! - **poll** (default 1s): `get` the session; when the remote text differs
//!   from the local copy, emit [`SyncEvent::RemoteContent`].
//! - **heartbeat** (default 30s): keep the session from expiring.
//! - **debounce** (default 300ms): local edits are sent as one `update` once
//!   typing pauses.
//!
//! While an edit is waiting on the debounce timer, polled content is not
//! applied; otherwise the stale server copy would overwrite the edit before
//! it is sent.

use crate::Error;
use crate::client::ShareClient;
use codeshare_core::SessionId;
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

// =============================================================================
// CONNECTION STATUS
// =============================================================================

/// Connection state as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// One poll has failed; the next failure disconnects.
    ErrorWarning,
}

impl ConnectionStatus {
    /// Text shown next to the status indicator.
    ///
    /// A warning still reads as "Disconnected"; only the indicator colour
    /// tells it apart.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Connecting => "Connecting...",
            Self::Disconnected | Self::ErrorWarning => "Disconnected",
        }
    }

    /// Stable machine name (matches the browser page's CSS classes).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::ErrorWarning => "errorWarning",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why a poll failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFailure {
    /// The server answered with an error status.
    Rejected,
    /// The server could not be reached.
    Unreachable,
}

impl PollFailure {
    pub fn from_error(err: &Error) -> Self {
        if err.is_unreachable() {
            Self::Unreachable
        } else {
            Self::Rejected
        }
    }

    /// Message shown once the failure disconnects the client.
    pub fn message(self) -> &'static str {
        match self {
            Self::Rejected => "Failed to get updates",
            Self::Unreachable => "Failed to connect to server",
        }
    }
}

/// Connection state machine.
///
/// A single failed poll while connected only raises a warning; a second
/// consecutive failure disconnects and records an error message. Any
/// successful poll reconnects and clears the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTracker {
    status: ConnectionStatus,
    error: Option<String>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Disconnected,
            error: None,
        }
    }
}

impl ConnectionTracker {
    /// A tracker for a session that was just joined successfully.
    pub fn connected() -> Self {
        Self {
            status: ConnectionStatus::Connected,
            error: None,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// A create or join request is in flight.
    pub fn begin_connect(&mut self) {
        self.status = ConnectionStatus::Connecting;
        self.error = None;
    }

    /// The create or join request failed.
    pub fn connect_failed(&mut self, message: impl Into<String>) {
        self.status = ConnectionStatus::Disconnected;
        self.error = Some(message.into());
    }

    /// A poll succeeded. Returns the new status if it changed.
    pub fn on_poll_ok(&mut self) -> Option<ConnectionStatus> {
        self.error = None;
        self.transition(ConnectionStatus::Connected)
    }

    /// A poll failed. Returns the new status if it changed.
    pub fn on_poll_failed(&mut self, failure: PollFailure) -> Option<ConnectionStatus> {
        match self.status {
            ConnectionStatus::ErrorWarning => {
                self.error = Some(failure.message().to_string());
                self.transition(ConnectionStatus::Disconnected)
            }
            ConnectionStatus::Connected => self.transition(ConnectionStatus::ErrorWarning),
            ConnectionStatus::Connecting | ConnectionStatus::Disconnected => None,
        }
    }

    fn transition(&mut self, next: ConnectionStatus) -> Option<ConnectionStatus> {
        if self.status == next {
            None
        } else {
            self.status = next;
            Some(next)
        }
    }
}

// =============================================================================
// SYNC ENGINE
// =============================================================================

/// Shortest poll or heartbeat period; zero durations are raised to this.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Timer settings for [`SessionSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub debounce: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(30),
            debounce: Duration::from_millis(300),
        }
    }
}

/// Something the sync task observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Another client changed the content.
    RemoteContent(String),
    /// The connection status changed.
    StatusChanged(ConnectionStatus),
    /// A debounced update was rejected or could not be sent.
    UpdateFailed(String),
}

/// Handle to a running sync task.
///
/// Dropping the handle stops the task without flushing a pending edit;
/// [`SessionSync::shutdown`] flushes it first.
#[derive(Debug)]
pub struct SessionSync {
    session_id: SessionId,
    edits: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SessionSync {
    /// Fetch the current content of `id` and start following it.
    ///
    /// Returns the content alongside the handle so callers can render it
    /// before the first poll.
    pub async fn join(
        client: ShareClient,
        id: SessionId,
        options: SyncOptions,
    ) -> Result<(Self, String), Error> {
        let content = client.get(&id).await?;
        let sync = Self::spawn(client, id, content.clone(), options);
        Ok((sync, content))
    }

    /// Start following `id`, treating `content` as the current local copy.
    pub fn spawn(
        client: ShareClient,
        id: SessionId,
        content: String,
        options: SyncOptions,
    ) -> Self {
        let (edits_tx, edits_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = SyncWorker {
            client,
            id: id.clone(),
            content,
            pending: None,
            tracker: ConnectionTracker::connected(),
            events: events_tx,
        };
        let task = tokio::spawn(worker.run(options, edits_rx, shutdown_rx));

        Self {
            session_id: id,
            edits: edits_tx,
            events: events_rx,
            shutdown: Some(shutdown_tx),
            task,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Record a local edit. It is sent once edits pause for the debounce
    /// period. Returns `false` if the task has stopped.
    pub fn edit(&self, content: impl Into<String>) -> bool {
        self.edits.send(content.into()).is_ok()
    }

    /// Wait for the next event. `None` once the task has stopped.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        self.events.recv().await
    }

    /// Stop the task, sending any edit still waiting on the debounce timer.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(session = %self.session_id, "sync task ended abnormally: {}", e);
        }
    }
}

struct SyncWorker {
    client: ShareClient,
    id: SessionId,
    /// Local copy: last content seen from the server or typed locally.
    content: String,
    /// Edit waiting on the debounce timer.
    pending: Option<String>,
    tracker: ConnectionTracker,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncWorker {
    async fn run(
        mut self,
        options: SyncOptions,
        mut edits: mpsc::UnboundedReceiver<String>,
        mut shutdown: oneshot::Receiver<()>,
    ) {
        let poll_every = options.poll_interval.max(MIN_INTERVAL);
        let heartbeat_every = options.heartbeat_interval.max(MIN_INTERVAL);

        let start = Instant::now();
        let mut poll = tokio::time::interval_at(start + poll_every, poll_every);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heartbeat = tokio::time::interval_at(start + heartbeat_every, heartbeat_every);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let debounce = tokio::time::sleep(options.debounce);
        tokio::pin!(debounce);

        tracing::debug!(session = %self.id, "sync started");

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    // Dropped handle: stop without flushing.
                    if result.is_ok() {
                        // Edits sent before shutdown may still be queued.
                        while let Ok(edit) = edits.try_recv() {
                            self.content.clone_from(&edit);
                            self.pending = Some(edit);
                        }
                        self.flush().await;
                    }
                    break;
                }
                Some(edit) = edits.recv() => {
                    self.content.clone_from(&edit);
                    self.pending = Some(edit);
                    debounce.as_mut().reset(Instant::now() + options.debounce);
                }
                () = &mut debounce, if self.pending.is_some() => {
                    self.flush().await;
                }
                _ = poll.tick() => {
                    self.poll().await;
                }
                _ = heartbeat.tick() => {
                    if let Err(e) = self.client.heartbeat(&self.id).await {
                        tracing::warn!(session = %self.id, "heartbeat failed: {}", e);
                    }
                }
            }
        }

        tracing::debug!(session = %self.id, "sync stopped");
    }

    async fn poll(&mut self) {
        match self.client.get(&self.id).await {
            Ok(remote) => {
                if self.pending.is_none() && remote != self.content {
                    self.content.clone_from(&remote);
                    self.emit(SyncEvent::RemoteContent(remote));
                }
                if let Some(status) = self.tracker.on_poll_ok() {
                    self.emit(SyncEvent::StatusChanged(status));
                }
            }
            Err(e) => {
                tracing::warn!(session = %self.id, "failed to get updates, will retry: {}", e);
                if let Some(status) = self.tracker.on_poll_failed(PollFailure::from_error(&e)) {
                    self.emit(SyncEvent::StatusChanged(status));
                }
            }
        }
    }

    async fn flush(&mut self) {
        let Some(content) = self.pending.take() else {
            return;
        };
        if let Err(e) = self.client.update(&self.id, content).await {
            tracing::warn!(session = %self.id, "failed to update content: {}", e);
            self.emit(SyncEvent::UpdateFailed(e.to_string()));
        }
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.send(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_failure_only_warns() {
        let mut tracker = ConnectionTracker::connected();
        assert_eq!(
            tracker.on_poll_failed(PollFailure::Rejected),
            Some(ConnectionStatus::ErrorWarning)
        );
        assert_eq!(tracker.error(), None);
        assert_eq!(tracker.status().label(), "Disconnected");
    }

    #[test]
    fn second_failure_disconnects_with_message() {
        let mut tracker = ConnectionTracker::connected();
        tracker.on_poll_failed(PollFailure::Unreachable);
        assert_eq!(
            tracker.on_poll_failed(PollFailure::Unreachable),
            Some(ConnectionStatus::Disconnected)
        );
        assert_eq!(tracker.error(), Some("Failed to connect to server"));

        // Further failures change nothing.
        assert_eq!(tracker.on_poll_failed(PollFailure::Rejected), None);
        assert_eq!(tracker.error(), Some("Failed to connect to server"));
    }

    #[test]
    fn success_recovers_from_warning_and_disconnect() {
        let mut tracker = ConnectionTracker::connected();
        tracker.on_poll_failed(PollFailure::Rejected);
        assert_eq!(tracker.on_poll_ok(), Some(ConnectionStatus::Connected));

        tracker.on_poll_failed(PollFailure::Rejected);
        tracker.on_poll_failed(PollFailure::Rejected);
        assert_eq!(tracker.error(), Some("Failed to get updates"));
        assert_eq!(tracker.on_poll_ok(), Some(ConnectionStatus::Connected));
        assert_eq!(tracker.error(), None);
        assert_eq!(tracker.on_poll_ok(), None);
    }

    #[test]
    fn connecting_ignores_poll_failures() {
        let mut tracker = ConnectionTracker::default();
        tracker.begin_connect();
        assert_eq!(tracker.status(), ConnectionStatus::Connecting);
        assert_eq!(tracker.on_poll_failed(PollFailure::Rejected), None);

        tracker.connect_failed("Session not found");
        assert_eq!(tracker.status(), ConnectionStatus::Disconnected);
        assert_eq!(tracker.error(), Some("Session not found"));
    }

    #[test]
    fn labels_and_names() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "Connecting...");
        assert_eq!(ConnectionStatus::ErrorWarning.as_str(), "errorWarning");
        assert_eq!(ConnectionStatus::Connected.as_str(), "connected");
    }
}
