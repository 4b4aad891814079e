// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mamachat integration tests.
//!
//! Provides an in-memory backend and record fixtures for fast,
//! deterministic tests without a running chat server.
//!
//! # Components
//!
//! - [`MockBackend`] - scriptable [`ChatBackend`](mamachat_core::ChatBackend)
//! - [`fixtures`] - builders for threads and messages

pub mod fixtures;
pub mod mock_backend;

pub use mock_backend::MockBackend;
