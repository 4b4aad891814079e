// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat synchronizer for the Mamachat clinic chat client.
//!
//! [`ChatSync`] polls a [`ChatBackend`](mamachat_core::ChatBackend), keeps
//! the thread list and message cache eventually consistent with it, derives
//! the open thread's messages, and sends replies with an optimistic local
//! update backed by an outbox.

pub mod legacy;
pub mod outbox;
pub mod state;
pub mod sync;

pub use legacy::{sort_threads, synthesize_threads};
pub use outbox::Outbox;
pub use state::{SourceShape, SyncState, ViewState, derive_subset};
pub use sync::{ChatSync, DEFAULT_POLL_INTERVAL, LoadSummary, SyncOptions};
