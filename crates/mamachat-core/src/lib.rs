// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mamachat clinic chat client.
//!
//! This crate provides the canonical chat records, the error type, the
//! [`ChatBackend`] trait the synchronizer talks to, and the single
//! normalization boundary that turns backend JSON into those records.

pub mod error;
pub mod normalize;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MamachatError;
pub use normalize::Normalizer;
pub use traits::ChatBackend;
pub use types::{
    ChatMessage, ChatThread, HealthStatus, LegacySend, OutgoingMessage, SenderType, total_unread,
};
