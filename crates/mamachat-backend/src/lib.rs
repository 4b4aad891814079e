// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST chat backend for the Mamachat client.
//!
//! Implements [`ChatBackend`] over the clinic backend's threaded chat API
//! (`/chat_threads`, `/chat_messages`, `/api/admin/chat_messages`) and its
//! legacy flat API (`/chat_message` and the reply/chat POST routes).

pub mod client;

use async_trait::async_trait;
use mamachat_core::types::{ChatMessage, ChatThread, HealthStatus, LegacySend, OutgoingMessage};
use mamachat_core::{ChatBackend, MamachatError};
use tracing::debug;

pub use client::HttpBackend;

#[async_trait]
impl ChatBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> Result<HealthStatus, MamachatError> {
        match self.probe().await {
            Ok((status, body)) if status.is_success() => {
                match self.normalizer().threads(&body) {
                    Ok(_) => Ok(HealthStatus::Healthy),
                    Err(e) => Ok(HealthStatus::Degraded(format!(
                        "thread list is not a recognizable envelope: {e}"
                    ))),
                }
            }
            Ok((status, _)) => Ok(HealthStatus::Unhealthy(format!(
                "thread list returned {status}"
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "chat backend unreachable: {e}"
            ))),
        }
    }

    async fn fetch_threads(&self) -> Result<Vec<ChatThread>, MamachatError> {
        let threads = self.threads().await?;
        debug!(count = threads.len(), "fetched threads");
        Ok(threads)
    }

    async fn fetch_messages(&self) -> Result<Vec<ChatMessage>, MamachatError> {
        let messages = self.messages().await?;
        debug!(count = messages.len(), "fetched messages");
        Ok(messages)
    }

    async fn fetch_legacy_messages(&self) -> Result<Vec<ChatMessage>, MamachatError> {
        let messages = self.legacy_messages().await?;
        debug!(count = messages.len(), "fetched legacy messages");
        Ok(messages)
    }

    async fn send_message(&self, msg: &OutgoingMessage) -> Result<ChatMessage, MamachatError> {
        self.send(msg).await
    }

    async fn send_legacy(&self, msg: &LegacySend) -> Result<ChatMessage, MamachatError> {
        self.post_legacy(msg).await
    }
}
