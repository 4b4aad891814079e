// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical chat records shared by the backend client and the synchronizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by backend health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Backend is fully operational.
    Healthy,
    /// Backend answers but something is off.
    Degraded(String),
    /// Backend is not reachable or not answering correctly.
    Unhealthy(String),
}

/// Which side of the conversation authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SenderType {
    Patient,
    HealthWorker,
}

/// A conversation between one patient-side identity and one health worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    /// Identifier of the thread record itself.
    pub id: String,
    /// Identifier messages use to reference this thread. Equal to `id`
    /// when the backend only exposes one spelling.
    pub thread_id: String,
    pub user_id: String,
    pub user_name: String,
    pub health_worker_id: String,
    pub last_message: String,
    pub last_message_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub unread_count: u64,
}

impl ChatThread {
    /// Returns true if `id` is either spelling of this thread's identifier.
    pub fn matches_id(&self, id: &str) -> bool {
        self.id == id || self.thread_id == id
    }
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub thread_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub read: bool,
    pub sender_type: SenderType,
}

impl ChatMessage {
    /// Whether this message is displayed under `thread`.
    pub fn belongs_to(&self, thread: &ChatThread) -> bool {
        thread.matches_id(&self.thread_id)
    }
}

/// Body of `POST /api/admin/chat_messages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub thread_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub message: String,
    pub patient_id: String,
}

/// A send against the legacy flat message API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacySend {
    /// Reply to the latest message of an existing chat.
    Reply {
        original_message_id: String,
        chat_id: String,
        receiver_id: String,
        reply: String,
        health_worker_id: String,
    },
    /// First message of a chat that has no messages yet.
    Start {
        chat_id: String,
        sender_id: String,
        receiver_id: String,
        message: String,
        timestamp: DateTime<Utc>,
    },
}

impl LegacySend {
    pub fn chat_id(&self) -> &str {
        match self {
            LegacySend::Reply { chat_id, .. } | LegacySend::Start { chat_id, .. } => chat_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            LegacySend::Reply { reply, .. } => reply,
            LegacySend::Start { message, .. } => message,
        }
    }

    pub fn sender_id(&self) -> &str {
        match self {
            LegacySend::Reply {
                health_worker_id, ..
            } => health_worker_id,
            LegacySend::Start { sender_id, .. } => sender_id,
        }
    }

    pub fn receiver_id(&self) -> &str {
        match self {
            LegacySend::Reply { receiver_id, .. } | LegacySend::Start { receiver_id, .. } => {
                receiver_id
            }
        }
    }
}

/// Total unread messages across a thread list.
pub fn total_unread(threads: &[ChatThread]) -> u64 {
    threads.iter().map(|t| t.unread_count).sum()
}
