// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Normalization of backend JSON into canonical chat records.
//!
//! The chat backend has grown several spellings for the same concept
//! (`thread_id`/`chat_id`, `message`/`text`, `created_at`/`timestamp`/
//! `last_updated`, ...) and answers list requests either with a bare array
//! or with `{"data": [...]}`. Everything is funnelled through [`Normalizer`]
//! so the rest of the workspace only ever sees [`ChatThread`] and
//! [`ChatMessage`].
//!
//! Missing fields never fail a record: strings default to empty, counters to
//! zero, flags to `false` and timestamps to `None`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::MamachatError;
use crate::types::{ChatMessage, ChatThread, LegacySend, OutgoingMessage, SenderType};

/// Prefix of message ids minted locally when the backend omits one.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Prefix of ids derived from the content of list records that carry none.
pub const DERIVED_ID_PREFIX: &str = "derived-";

/// Text surfaced when a rejected send carries no usable error body.
pub const DEFAULT_SEND_ERROR: &str = "Failed to send message";

/// Epoch values above this are taken as milliseconds.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

type Record = Map<String, Value>;

/// The two list envelopes the backend uses.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    List(Vec<Value>),
    Wrapped { data: Vec<Value> },
}

/// Values used to fill gaps in a send response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFallback {
    pub thread_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub text: String,
}

impl From<&OutgoingMessage> for SentFallback {
    fn from(msg: &OutgoingMessage) -> Self {
        Self {
            thread_id: msg.thread_id.clone(),
            sender_id: msg.sender_id.clone(),
            receiver_id: msg.receiver_id.clone(),
            text: msg.message.clone(),
        }
    }
}

impl From<&LegacySend> for SentFallback {
    fn from(msg: &LegacySend) -> Self {
        Self {
            thread_id: msg.chat_id().to_string(),
            sender_id: msg.sender_id().to_string(),
            receiver_id: msg.receiver_id().to_string(),
            text: msg.text().to_string(),
        }
    }
}

/// Converts raw backend bodies into canonical records.
///
/// Holds the id of the local user so that messages without an explicit
/// `sender_type` can still be attributed.
#[derive(Debug, Clone)]
pub struct Normalizer {
    current_user_id: String,
}

impl Normalizer {
    pub fn new(current_user_id: impl Into<String>) -> Self {
        Self {
            current_user_id: current_user_id.into(),
        }
    }

    pub fn current_user_id(&self) -> &str {
        &self.current_user_id
    }

    /// Decodes a thread list body.
    pub fn threads(&self, body: &str) -> Result<Vec<ChatThread>, MamachatError> {
        Ok(records(body)?.iter().map(|r| self.thread(r)).collect())
    }

    /// Decodes a message list body.
    ///
    /// Records without an id get one derived from their content, so
    /// refetching the same record yields the same id.
    pub fn messages(&self, body: &str) -> Result<Vec<ChatMessage>, MamachatError> {
        Ok(records(body)?
            .iter()
            .map(|r| {
                let mut msg = self.message(r);
                if msg.id.is_empty() {
                    msg.id = derived_id(&msg);
                    debug!(id = %msg.id, thread = %msg.thread_id, "message without id");
                }
                msg
            })
            .collect())
    }

    /// Maps a single thread record.
    pub fn thread(&self, r: &Record) -> ChatThread {
        let id = string_field(r, &["id", "thread_id", "chat_id"]).unwrap_or_default();
        let thread_id = string_field(r, &["thread_id", "chat_id"]).unwrap_or_else(|| id.clone());
        let user_id =
            string_field(r, &["user_id", "patient_identifier", "patient_id"]).unwrap_or_default();
        let user_name = string_field(r, &["user_name", "patient_name", "name"])
            .unwrap_or_else(|| user_id.clone());

        ChatThread {
            id,
            thread_id,
            user_id,
            user_name,
            health_worker_id: string_field(r, &["health_worker_id"]).unwrap_or_default(),
            last_message: string_field(r, &["last_message"]).unwrap_or_default(),
            last_message_time: timestamp_field(
                r,
                &["last_message_time", "last_message_at", "updated_at"],
            ),
            created_at: timestamp_field(r, &["created_at"]),
            unread_count: count_field(r, &["unread_count"]).unwrap_or(0),
        }
    }

    /// Maps a single message record.
    pub fn message(&self, r: &Record) -> ChatMessage {
        let sender_id = string_field(r, &["sender_id"]).unwrap_or_default();
        let sender_type = self.sender_type(r, &sender_id);

        ChatMessage {
            id: string_field(r, &["id", "message_id"]).unwrap_or_default(),
            thread_id: string_field(r, &["thread_id", "chat_id"]).unwrap_or_default(),
            sender_id,
            receiver_id: string_field(r, &["receiver_id"]).unwrap_or_default(),
            text: string_field(r, &["message", "text", "reply"]).unwrap_or_default(),
            timestamp: timestamp_field(r, &["created_at", "timestamp", "last_updated"]),
            read: bool_field(r, &["is_read", "read"]).unwrap_or(false),
            sender_type,
        }
    }

    /// Maps the body of a successful send, filling gaps from what was sent.
    ///
    /// A body that is not a JSON object (or a `{"data": {...}}` wrapper)
    /// yields a message built entirely from `fallback`.
    pub fn sent_message(&self, body: &str, fallback: &SentFallback) -> ChatMessage {
        let record = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(mut map)) => match map.remove("data") {
                Some(Value::Object(inner)) => inner,
                Some(other) => {
                    map.insert("data".to_string(), other);
                    map
                }
                None => map,
            },
            _ => Record::new(),
        };

        let mut msg = self.message(&record);
        if msg.id.is_empty() {
            msg.id = format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4());
        }
        if msg.thread_id.is_empty() {
            msg.thread_id = fallback.thread_id.clone();
        }
        if msg.sender_id.is_empty() {
            msg.sender_id = fallback.sender_id.clone();
            msg.sender_type = self.sender_type(&record, &msg.sender_id);
        }
        if msg.receiver_id.is_empty() {
            msg.receiver_id = fallback.receiver_id.clone();
        }
        if msg.text.is_empty() {
            msg.text = fallback.text.clone();
        }
        if msg.timestamp.is_none() {
            msg.timestamp = Some(Utc::now());
        }
        msg
    }

    fn sender_type(&self, r: &Record, sender_id: &str) -> SenderType {
        r.get("sender_type")
            .and_then(Value::as_str)
            .and_then(parse_sender_type)
            .unwrap_or(if sender_id == self.current_user_id {
                SenderType::HealthWorker
            } else {
                SenderType::Patient
            })
    }
}

fn derived_id(msg: &ChatMessage) -> String {
    let timestamp = msg.timestamp.map(|t| t.to_rfc3339()).unwrap_or_default();
    let key = [
        msg.thread_id.as_str(),
        msg.sender_id.as_str(),
        timestamp.as_str(),
        msg.text.as_str(),
    ]
    .join("\u{1f}");
    format!(
        "{DERIVED_ID_PREFIX}{}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    )
}

/// Returns true for ids minted by [`Normalizer::sent_message`].
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Extracts the user-facing text of a rejected send.
///
/// Uses the body's `error` field, then `message`, then [`DEFAULT_SEND_ERROR`].
pub fn rejection_text(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.as_object().and_then(|r| string_field(r, &["error", "message"])))
        .unwrap_or_else(|| DEFAULT_SEND_ERROR.to_string())
}

/// Parses any timestamp spelling the backend is known to produce.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(from_epoch),
        Value::Object(obj) => {
            let secs = obj
                .get("_seconds")
                .or_else(|| obj.get("seconds"))
                .and_then(Value::as_i64)?;
            let nanos = obj
                .get("_nanoseconds")
                .or_else(|| obj.get("nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    s.parse::<i64>().ok().and_then(from_epoch)
}

fn from_epoch(n: i64) -> Option<DateTime<Utc>> {
    if n.abs() > EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(n)
    } else {
        DateTime::from_timestamp(n, 0)
    }
}

fn parse_sender_type(s: &str) -> Option<SenderType> {
    match s.trim().to_ascii_lowercase().as_str() {
        "patient" => Some(SenderType::Patient),
        "health_worker" | "admin" => Some(SenderType::HealthWorker),
        _ => None,
    }
}

fn records(body: &str) -> Result<Vec<Record>, MamachatError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| MamachatError::Decode {
        message: format!("expected a JSON array or {{\"data\": [...]}}: {e}"),
        source: Some(Box::new(e)),
    })?;
    let (Envelope::List(items) | Envelope::Wrapped { data: items }) = envelope;

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(map) => Some(map),
            other => {
                debug!(value = %other, "skipping non-object record");
                None
            }
        })
        .collect())
}

fn string_field(r: &Record, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match r.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn bool_field(r: &Record, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match r.get(*key) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        Some(Value::String(s)) => match s.trim() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn count_field(r: &Record, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| match r.get(*key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn timestamp_field(r: &Record, keys: &[&str]) -> Option<DateTime<Utc>> {
    keys.iter()
        .find_map(|key| r.get(*key).and_then(parse_timestamp))
}
