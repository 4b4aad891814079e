// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The async synchronizer driving [`SyncState`] against a [`ChatBackend`].

use std::sync::Arc;
use std::time::Duration;

use mamachat_core::error::MamachatError;
use mamachat_core::types::{ChatMessage, ChatThread};
use mamachat_core::ChatBackend;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{SendRequest, SourceShape, SyncState, ViewState};

/// Default delay between poll ticks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);

/// Settings for a [`ChatSync`].
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Id the local user sends as.
    pub current_user_id: String,
    pub poll_interval: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            current_user_id: "health_worker".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Messages to the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    /// Restart the interval from now.
    Reset,
    /// Poll immediately, then restart the interval.
    TickNow,
}

/// Summary of an initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub shape: SourceShape,
    pub threads: usize,
    pub messages: usize,
}

/// Keeps a local thread list and message cache in step with a backend.
///
/// Observers subscribe to the view and thread list through watch channels.
/// The state lock is never held across a backend call.
pub struct ChatSync {
    backend: Arc<dyn ChatBackend>,
    options: SyncOptions,
    state: Mutex<SyncState>,
    /// Serializes poll ticks.
    polling: Mutex<()>,
    view_tx: watch::Sender<ViewState>,
    threads_tx: watch::Sender<Vec<ChatThread>>,
    control_tx: mpsc::UnboundedSender<Control>,
    /// Held by the running poll loop.
    control_rx: Mutex<mpsc::UnboundedReceiver<Control>>,
}

impl ChatSync {
    pub fn new(backend: Arc<dyn ChatBackend>, options: SyncOptions) -> Self {
        let (view_tx, _) = watch::channel(ViewState::NoThreadSelected);
        let (threads_tx, _) = watch::channel(Vec::new());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            state: Mutex::new(SyncState::new(options.current_user_id.clone())),
            options,
            polling: Mutex::new(()),
            view_tx,
            threads_tx,
            control_tx,
            control_rx: Mutex::new(control_rx),
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Fetch threads and messages and install them.
    ///
    /// Failed fetches count as empty. When the current endpoints return
    /// nothing, the legacy list is tried and threads are synthesized from it.
    pub async fn initial_load(&self) -> LoadSummary {
        let (threads, messages) = tokio::join!(
            self.backend.fetch_threads(),
            self.backend.fetch_messages()
        );
        let threads = threads.unwrap_or_else(|e| {
            warn!(error = %e, "thread fetch failed, treating as empty");
            Vec::new()
        });
        let messages = messages.unwrap_or_else(|e| {
            warn!(error = %e, "message fetch failed, treating as empty");
            Vec::new()
        });

        let (shape, messages) = if threads.is_empty() && messages.is_empty() {
            match self.backend.fetch_legacy_messages().await {
                Ok(legacy) if !legacy.is_empty() => (SourceShape::Legacy, legacy),
                Ok(_) => (SourceShape::Current, Vec::new()),
                Err(e) => {
                    warn!(error = %e, "legacy message fetch failed, treating as empty");
                    (SourceShape::Current, Vec::new())
                }
            }
        } else {
            (SourceShape::Current, messages)
        };

        let mut state = self.state.lock().await;
        state.apply_initial(shape, threads, messages);
        let summary = LoadSummary {
            shape,
            threads: state.threads().len(),
            messages: state.cache().len(),
        };
        self.publish(&state);
        info!(
            shape = %summary.shape,
            threads = summary.threads,
            messages = summary.messages,
            "initial load complete"
        );
        summary
    }

    /// Fetch the message list once and apply it.
    ///
    /// Returns whether the cache changed. A failed fetch is logged and
    /// leaves all state untouched.
    pub async fn poll_tick(&self) -> Result<bool, MamachatError> {
        let _tick = self.polling.lock().await;
        let shape = self.state.lock().await.shape();
        let fetched = match shape {
            SourceShape::Current => self.backend.fetch_messages().await,
            SourceShape::Legacy => self.backend.fetch_legacy_messages().await,
        };
        let fresh = fetched.inspect_err(|e| warn!(error = %e, %shape, "poll fetch failed"))?;

        let mut state = self.state.lock().await;
        let outcome = state.apply_fetch(fresh);
        if outcome.cache_changed {
            debug!(
                view_changed = outcome.view_changed,
                pending = state.outbox().len(),
                "message cache changed"
            );
            self.publish(&state);
        }
        Ok(outcome.cache_changed)
    }

    /// Open a thread by either of its ids. No network call.
    pub async fn select_thread(&self, id: &str) -> Result<ViewState, MamachatError> {
        let mut state = self.state.lock().await;
        let view = state.select(id)?.clone();
        self.publish(&state);
        drop(state);
        debug!(thread = id, "thread selected");
        let _ = self.control_tx.send(Control::Reset);
        Ok(view)
    }

    pub async fn clear_selection(&self) {
        let mut state = self.state.lock().await;
        state.clear_selection();
        self.publish(&state);
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().await.set_draft(text);
    }

    pub async fn draft(&self) -> String {
        self.state.lock().await.draft().to_string()
    }

    /// Send the current draft to the open thread.
    pub async fn send_draft(&self) -> Result<ChatMessage, MamachatError> {
        let draft = self.draft().await;
        self.send_reply(&draft).await
    }

    /// Send `text` to the open thread.
    ///
    /// On success the confirmed message is shown immediately and a poll is
    /// triggered. On failure nothing local changes.
    pub async fn send_reply(&self, text: &str) -> Result<ChatMessage, MamachatError> {
        let plan = self.state.lock().await.prepare_send(text)?;

        let sent = match &plan.request {
            SendRequest::Current(message) => self.backend.send_message(message).await,
            SendRequest::Legacy(message) => self.backend.send_legacy(message).await,
        };
        let confirmed =
            sent.inspect_err(|e| warn!(thread = %plan.thread_id, error = %e, "send failed"))?;

        let mut state = self.state.lock().await;
        state.commit_send(&plan.thread_id, confirmed.clone());
        self.publish(&state);
        drop(state);

        info!(thread = %plan.thread_id, id = %confirmed.id, "reply sent");
        let _ = self.control_tx.send(Control::TickNow);
        Ok(confirmed)
    }

    /// Snapshot of the thread list, newest first.
    pub fn threads(&self) -> Vec<ChatThread> {
        self.threads_tx.borrow().clone()
    }

    /// Snapshot of the view.
    pub fn view(&self) -> ViewState {
        self.view_tx.borrow().clone()
    }

    /// Server cache merged with confirmed sends not yet fetched.
    pub async fn cache(&self) -> Vec<ChatMessage> {
        self.state.lock().await.cache()
    }

    pub async fn shape(&self) -> SourceShape {
        self.state.lock().await.shape()
    }

    pub fn subscribe_view(&self) -> watch::Receiver<ViewState> {
        self.view_tx.subscribe()
    }

    pub fn subscribe_threads(&self) -> watch::Receiver<Vec<ChatThread>> {
        self.threads_tx.subscribe()
    }

    /// Poll until `cancel` fires.
    ///
    /// Selecting a thread or a cache change restarts the interval. A
    /// successful send polls immediately. Only one loop may run at a time;
    /// the next may start once this future completes or is dropped.
    /// Cancellation also abandons a poll whose fetch is still in flight.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), MamachatError> {
        let mut control = self
            .control_rx
            .try_lock()
            .map_err(|_| MamachatError::Internal("poll loop is already running".into()))?;

        let period = self.options.poll_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = period.as_millis() as u64, "poll loop running");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => match self.poll_or_cancel(&cancel).await {
                    None => break,
                    Some(Ok(true)) => interval.reset(),
                    Some(_) => {}
                },
                command = control.recv() => match command {
                    Some(Control::Reset) => interval.reset(),
                    Some(Control::TickNow) => {
                        if self.poll_or_cancel(&cancel).await.is_none() {
                            break;
                        }
                        interval.reset();
                    }
                    None => break,
                },
            }
        }

        info!("poll loop stopped");
        Ok(())
    }

    /// One poll tick, or `None` if `cancel` fires first. Abandoning a tick
    /// is safe: the state lock is not held while fetching.
    async fn poll_or_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Option<Result<bool, MamachatError>> {
        tokio::select! {
            _ = cancel.cancelled() => None,
            polled = self.poll_tick() => Some(polled),
        }
    }

    fn publish(&self, state: &SyncState) {
        let view = state.view();
        self.view_tx.send_if_modified(|current| {
            if current.is_same(view) {
                false
            } else {
                *current = view.clone();
                true
            }
        });
        let threads = state.threads();
        self.threads_tx.send_if_modified(|current| {
            if current.as_slice() == threads {
                false
            } else {
                *current = threads.to_vec();
                true
            }
        });
    }
}
