// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait for the remote chat service.

use async_trait::async_trait;

use crate::error::MamachatError;
use crate::types::{ChatMessage, ChatThread, HealthStatus, LegacySend, OutgoingMessage};

/// Remote source of chat threads and messages.
///
/// Implementations return records that already went through
/// [`Normalizer`](crate::normalize::Normalizer); callers never see raw
/// backend field spellings.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    /// Returns a human-readable name for logs.
    fn name(&self) -> &str;

    /// Probes the backend.
    async fn health_check(&self) -> Result<HealthStatus, MamachatError>;

    /// Lists threads from the threaded API.
    async fn fetch_threads(&self) -> Result<Vec<ChatThread>, MamachatError>;

    /// Lists every message from the threaded API.
    async fn fetch_messages(&self) -> Result<Vec<ChatMessage>, MamachatError>;

    /// Lists every message from the legacy flat API.
    async fn fetch_legacy_messages(&self) -> Result<Vec<ChatMessage>, MamachatError>;

    /// Creates a message through the threaded API and returns the stored record.
    async fn send_message(&self, msg: &OutgoingMessage) -> Result<ChatMessage, MamachatError>;

    /// Creates a message through the legacy API and returns the stored record.
    async fn send_legacy(&self, msg: &LegacySend) -> Result<ChatMessage, MamachatError>;
}
