// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mamachat client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Mamachat configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MamachatConfig {
    /// Local identity and logging.
    #[serde(default)]
    pub client: ClientConfig,

    /// Chat backend location and endpoint paths.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Polling behaviour.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl MamachatConfig {
    /// Renders the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Client identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Id this client sends as. Messages addressed to it count as unread.
    #[serde(default = "default_current_user_id")]
    pub current_user_id: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            current_user_id: default_current_user_id(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_current_user_id() -> String {
    "health_worker".to_string()
}

/// Chat backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL every path below is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the backend's authenticated routes. `None` sends no header.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds. `0` disables the timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Thread list of the threaded API.
    #[serde(default = "default_threads_path")]
    pub threads_path: String,

    /// Message list of the threaded API.
    #[serde(default = "default_messages_path")]
    pub messages_path: String,

    /// Flat message list of the legacy API.
    #[serde(default = "default_legacy_messages_path")]
    pub legacy_messages_path: String,

    /// Message creation endpoint of the threaded API.
    #[serde(default = "default_send_path")]
    pub send_path: String,

    /// Legacy reply endpoint; the original message id is appended.
    #[serde(default = "default_legacy_reply_path")]
    pub legacy_reply_path: String,

    /// Legacy first-message endpoint; the chat id is appended.
    #[serde(default = "default_legacy_chat_path")]
    pub legacy_chat_path: String,
}

impl BackendConfig {
    /// The configured timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// All endpoint paths with their key names, for validation.
    pub fn paths(&self) -> [(&'static str, &str); 6] {
        [
            ("threads_path", &self.threads_path),
            ("messages_path", &self.messages_path),
            ("legacy_messages_path", &self.legacy_messages_path),
            ("send_path", &self.send_path),
            ("legacy_reply_path", &self.legacy_reply_path),
            ("legacy_chat_path", &self.legacy_chat_path),
        ]
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            threads_path: default_threads_path(),
            messages_path: default_messages_path(),
            legacy_messages_path: default_legacy_messages_path(),
            send_path: default_send_path(),
            legacy_reply_path: default_legacy_reply_path(),
            legacy_chat_path: default_legacy_chat_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_threads_path() -> String {
    "/chat_threads".to_string()
}

fn default_messages_path() -> String {
    "/chat_messages".to_string()
}

fn default_legacy_messages_path() -> String {
    "/chat_message".to_string()
}

fn default_send_path() -> String {
    "/api/admin/chat_messages".to_string()
}

fn default_legacy_reply_path() -> String {
    "/api/chat_message/reply".to_string()
}

fn default_legacy_chat_path() -> String {
    "/api/chat_message/chat".to_string()
}

/// Polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Interval between message list refreshes, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    3000
}
