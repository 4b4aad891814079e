// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat backend for deterministic testing.
//!
//! `MockBackend` implements `ChatBackend` over in-memory lists. Tests seed
//! threads and messages, inject failures, and inspect what was sent.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use mamachat_core::types::{
    ChatMessage, ChatThread, HealthStatus, LegacySend, OutgoingMessage, SenderType,
};
use mamachat_core::{ChatBackend, MamachatError};

#[derive(Default)]
struct MockState {
    threads: Vec<ChatThread>,
    messages: Vec<ChatMessage>,
    legacy_messages: Vec<ChatMessage>,
    fail_fetches: bool,
    /// `fetch_messages` never completes while set.
    stall_message_fetches: bool,
    rejection: Option<(u16, String)>,
    /// When false, sent messages are acknowledged but not yet listed.
    publish_sent: bool,
    sent: Vec<OutgoingMessage>,
    legacy_sent: Vec<LegacySend>,
    message_fetches: usize,
    legacy_fetches: usize,
    next_id: u64,
}

/// An in-memory chat backend.
///
/// Clones share state, so a test can keep one handle while the
/// synchronizer owns another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockBackend {
    /// Create an empty backend that lists sent messages immediately.
    pub fn new() -> Self {
        Self::seeded(Vec::new(), Vec::new(), Vec::new())
    }

    /// Create a backend serving the threaded API.
    pub fn with_threads(threads: Vec<ChatThread>, messages: Vec<ChatMessage>) -> Self {
        Self::seeded(threads, messages, Vec::new())
    }

    /// Create a backend that only serves the legacy flat API.
    pub fn legacy_only(messages: Vec<ChatMessage>) -> Self {
        Self::seeded(Vec::new(), Vec::new(), messages)
    }

    fn seeded(
        threads: Vec<ChatThread>,
        messages: Vec<ChatMessage>,
        legacy_messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                threads,
                messages,
                legacy_messages,
                publish_sent: true,
                next_id: 1000,
                ..MockState::default()
            })),
        }
    }

    /// Append a message to the threaded list, as if another client sent it.
    pub async fn push_message(&self, message: ChatMessage) {
        self.state.lock().await.messages.push(message);
    }

    /// Append a message to the legacy list.
    pub async fn push_legacy_message(&self, message: ChatMessage) {
        self.state.lock().await.legacy_messages.push(message);
    }

    /// Make every fetch fail with a backend error.
    pub async fn fail_fetches(&self, fail: bool) {
        self.state.lock().await.fail_fetches = fail;
    }

    /// Make `fetch_messages` hang, like a request with no timeout against a
    /// backend that never answers.
    pub async fn stall_message_fetches(&self, stall: bool) {
        self.state.lock().await.stall_message_fetches = stall;
    }

    /// Reject every send with `status` and `message` until cleared with `None`.
    pub async fn reject_sends(&self, rejection: Option<(u16, &str)>) {
        self.state.lock().await.rejection = rejection.map(|(s, m)| (s, m.to_string()));
    }

    /// Control whether acknowledged sends show up in later fetches.
    pub async fn publish_sent(&self, publish: bool) {
        self.state.lock().await.publish_sent = publish;
    }

    /// Every threaded send received, in order.
    pub async fn sent(&self) -> Vec<OutgoingMessage> {
        self.state.lock().await.sent.clone()
    }

    /// Every legacy send received, in order.
    pub async fn legacy_sent(&self) -> Vec<LegacySend> {
        self.state.lock().await.legacy_sent.clone()
    }

    /// Number of `fetch_messages` calls served.
    pub async fn message_fetches(&self) -> usize {
        self.state.lock().await.message_fetches
    }

    /// Number of `fetch_legacy_messages` calls served.
    pub async fn legacy_fetches(&self) -> usize {
        self.state.lock().await.legacy_fetches
    }

    fn check_fetch(state: &MockState) -> Result<(), MamachatError> {
        if state.fail_fetches {
            Err(MamachatError::backend("mock backend unavailable"))
        } else {
            Ok(())
        }
    }

    fn check_send(state: &MockState) -> Result<(), MamachatError> {
        match &state.rejection {
            Some((status, message)) => Err(MamachatError::Rejected {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn store(
        state: &mut MockState,
        thread_id: &str,
        sender_id: &str,
        receiver_id: &str,
        text: &str,
    ) -> ChatMessage {
        state.next_id += 1;
        ChatMessage {
            id: format!("srv-{}", state.next_id),
            thread_id: thread_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            text: text.to_string(),
            timestamp: Some(Utc::now()),
            read: false,
            sender_type: SenderType::HealthWorker,
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    async fn health_check(&self) -> Result<HealthStatus, MamachatError> {
        let state = self.state.lock().await;
        Ok(if state.fail_fetches {
            HealthStatus::Unhealthy("mock backend unavailable".into())
        } else {
            HealthStatus::Healthy
        })
    }

    async fn fetch_threads(&self) -> Result<Vec<ChatThread>, MamachatError> {
        let state = self.state.lock().await;
        Self::check_fetch(&state)?;
        Ok(state.threads.clone())
    }

    async fn fetch_messages(&self) -> Result<Vec<ChatMessage>, MamachatError> {
        let mut state = self.state.lock().await;
        state.message_fetches += 1;
        if state.stall_message_fetches {
            drop(state);
            return std::future::pending().await;
        }
        Self::check_fetch(&state)?;
        Ok(state.messages.clone())
    }

    async fn fetch_legacy_messages(&self) -> Result<Vec<ChatMessage>, MamachatError> {
        let mut state = self.state.lock().await;
        state.legacy_fetches += 1;
        Self::check_fetch(&state)?;
        Ok(state.legacy_messages.clone())
    }

    async fn send_message(&self, msg: &OutgoingMessage) -> Result<ChatMessage, MamachatError> {
        let mut state = self.state.lock().await;
        Self::check_send(&state)?;
        state.sent.push(msg.clone());
        let stored = Self::store(
            &mut state,
            &msg.thread_id,
            &msg.sender_id,
            &msg.receiver_id,
            &msg.message,
        );
        if state.publish_sent {
            state.messages.push(stored.clone());
        }
        Ok(stored)
    }

    async fn send_legacy(&self, msg: &LegacySend) -> Result<ChatMessage, MamachatError> {
        let mut state = self.state.lock().await;
        Self::check_send(&state)?;
        state.legacy_sent.push(msg.clone());
        let stored = Self::store(
            &mut state,
            msg.chat_id(),
            msg.sender_id(),
            msg.receiver_id(),
            msg.text(),
        );
        if state.publish_sent {
            state.legacy_messages.push(stored.clone());
        }
        Ok(stored)
    }
}
