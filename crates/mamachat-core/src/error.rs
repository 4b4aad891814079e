// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mamachat client.

use thiserror::Error;

/// The primary error type used across the backend trait, the synchronizer and the CLI.
#[derive(Debug, Error)]
pub enum MamachatError {
    /// Configuration errors (invalid TOML, bad base URL, invalid header values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport or HTTP-level failure talking to the chat backend.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a body that is not a recognizable envelope.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend refused a send. `message` is the backend-provided text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// A caller-side precondition failed (no open thread, blank reply).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A thread or message id is not known locally.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MamachatError {
    /// Shorthand for a backend error without an underlying source.
    pub fn backend(message: impl Into<String>) -> Self {
        MamachatError::Backend {
            message: message.into(),
            source: None,
        }
    }
}
