// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the clinic chat REST API.
//!
//! Provides [`HttpBackend`] which handles URL construction, bearer
//! authentication, status handling, and hands every body to the
//! [`Normalizer`].

use std::time::Duration;

use mamachat_config::model::{BackendConfig, MamachatConfig};
use mamachat_core::normalize::{SentFallback, rejection_text};
use mamachat_core::types::{ChatMessage, ChatThread, LegacySend, OutgoingMessage};
use mamachat_core::{MamachatError, Normalizer};
use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

/// HTTP client for the chat backend.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    paths: BackendConfig,
    timeout: Option<Duration>,
    normalizer: Normalizer,
}

impl HttpBackend {
    /// Creates a client for `config`, attributing messages relative to `current_user_id`.
    pub fn new(config: &BackendConfig, current_user_id: &str) -> Result<Self, MamachatError> {
        Url::parse(&config.base_url).map_err(|e| {
            MamachatError::Config(format!("invalid backend.base_url `{}`: {e}", config.base_url))
        })?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                MamachatError::Config(format!("invalid API token header value: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let timeout = config.request_timeout();
        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| MamachatError::Backend {
            message: format!("failed to build HTTP client: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            paths: config.clone(),
            timeout,
            normalizer: Normalizer::new(current_user_id),
        })
    }

    /// Creates a client from the full configuration.
    pub fn from_config(config: &MamachatConfig) -> Result<Self, MamachatError> {
        Self::new(&config.backend, &config.client.current_user_id)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub(crate) async fn threads(&self) -> Result<Vec<ChatThread>, MamachatError> {
        let body = self.get(&self.paths.threads_path).await?;
        self.normalizer.threads(&body)
    }

    pub(crate) async fn messages(&self) -> Result<Vec<ChatMessage>, MamachatError> {
        let body = self.get(&self.paths.messages_path).await?;
        self.normalizer.messages(&body)
    }

    pub(crate) async fn legacy_messages(&self) -> Result<Vec<ChatMessage>, MamachatError> {
        let body = self.get(&self.paths.legacy_messages_path).await?;
        self.normalizer.messages(&body)
    }

    pub(crate) async fn send(&self, msg: &OutgoingMessage) -> Result<ChatMessage, MamachatError> {
        let url = self.url(&self.paths.send_path)?;
        let body = self.post(url, msg).await?;
        Ok(self.normalizer.sent_message(&body, &SentFallback::from(msg)))
    }

    pub(crate) async fn post_legacy(&self, msg: &LegacySend) -> Result<ChatMessage, MamachatError> {
        let body = match msg {
            LegacySend::Reply {
                original_message_id,
                reply,
                health_worker_id,
                ..
            } => {
                let url = self.url_with_segment(&self.paths.legacy_reply_path, original_message_id)?;
                self.post(
                    url,
                    &json!({ "reply": reply, "health_worker_id": health_worker_id }),
                )
                .await?
            }
            LegacySend::Start {
                chat_id,
                sender_id,
                receiver_id,
                message,
                timestamp,
            } => {
                let url = self.url_with_segment(&self.paths.legacy_chat_path, chat_id)?;
                self.post(
                    url,
                    &json!({
                        "sender_id": sender_id,
                        "receiver_id": receiver_id,
                        "message": message,
                        "is_read": false,
                        "timestamp": timestamp.to_rfc3339(),
                    }),
                )
                .await?
            }
        };
        Ok(self.normalizer.sent_message(&body, &SentFallback::from(msg)))
    }

    /// Returns the raw status and body of the thread list, for health probes.
    pub(crate) async fn probe(&self) -> Result<(reqwest::StatusCode, String), MamachatError> {
        let url = self.url(&self.paths.threads_path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    fn url(&self, path: &str) -> Result<Url, MamachatError> {
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).map_err(|e| MamachatError::Config(format!("invalid URL `{raw}`: {e}")))
    }

    /// `path` with `segment` appended as one percent-encoded path segment.
    fn url_with_segment(&self, path: &str, segment: &str) -> Result<Url, MamachatError> {
        let mut url = self.url(path)?;
        let shown = url.to_string();
        url.path_segments_mut()
            .map_err(|()| MamachatError::Config(format!("`{shown}` cannot take path segments")))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn get(&self, path: &str) -> Result<String, MamachatError> {
        let url = self.url(path)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(%url, %status, "GET response received");

        let body = response.text().await.map_err(|e| MamachatError::Backend {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(MamachatError::backend(format!(
                "GET {url} returned {status}: {body}"
            )));
        }
        Ok(body)
    }

    /// POSTs `payload`; a non-2xx answer becomes [`MamachatError::Rejected`].
    async fn post(&self, url: Url, payload: &impl Serialize) -> Result<String, MamachatError> {
        let response = self
            .client
            .post(url.clone())
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        debug!(%url, %status, "POST response received");
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = rejection_text(&body);
            warn!(%url, %status, %message, "backend rejected message");
            return Err(MamachatError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }

    fn transport_error(&self, e: reqwest::Error) -> MamachatError {
        if let Some(duration) = self.timeout.filter(|_| e.is_timeout()) {
            return MamachatError::Timeout { duration };
        }
        MamachatError::Backend {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}
