// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the synchronizer and the chat backend.

pub mod backend;

pub use backend::ChatBackend;
