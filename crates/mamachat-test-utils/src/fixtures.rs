// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for canonical records used across test suites.

use chrono::{DateTime, TimeZone, Utc};
use mamachat_core::types::{ChatMessage, ChatThread, SenderType};

/// The local user id every fixture assumes.
pub const HEALTH_WORKER: &str = "health_worker";

/// 2024-03-01 at `hour:minute` UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0)
        .single()
        .unwrap_or_default()
}

/// A thread whose record id and message-facing id are both `id`.
pub fn thread(id: &str, user_id: &str, last_message: &str, last_time: DateTime<Utc>) -> ChatThread {
    ChatThread {
        id: id.to_string(),
        thread_id: id.to_string(),
        user_id: user_id.to_string(),
        user_name: user_id.to_string(),
        health_worker_id: HEALTH_WORKER.to_string(),
        last_message: last_message.to_string(),
        last_message_time: Some(last_time),
        created_at: Some(last_time),
        unread_count: 0,
    }
}

/// A message from the patient `from` to the health worker.
pub fn from_patient(id: &str, thread_id: &str, from: &str, text: &str, ts: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        sender_id: from.to_string(),
        receiver_id: HEALTH_WORKER.to_string(),
        text: text.to_string(),
        timestamp: Some(ts),
        read: false,
        sender_type: SenderType::Patient,
    }
}

/// A message from the health worker to the patient `to`.
pub fn to_patient(id: &str, thread_id: &str, to: &str, text: &str, ts: DateTime<Utc>) -> ChatMessage {
    ChatMessage {
        id: id.to_string(),
        thread_id: thread_id.to_string(),
        sender_id: HEALTH_WORKER.to_string(),
        receiver_id: to.to_string(),
        text: text.to_string(),
        timestamp: Some(ts),
        read: true,
        sender_type: SenderType::HealthWorker,
    }
}
