// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sends the backend has acknowledged but no fetch has returned yet.

use std::collections::HashSet;

use mamachat_core::normalize::is_local_id;
use mamachat_core::types::ChatMessage;
use tracing::debug;

/// Confirmed sends kept apart from the server cache until a fetch lists them.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    entries: Vec<ChatMessage>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed send. Ignored if an entry with the same id exists.
    pub fn push(&mut self, message: ChatMessage) {
        if self.entries.iter().any(|m| m.id == message.id) {
            return;
        }
        self.entries.push(message);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Drop every entry the server cache now accounts for.
    ///
    /// Server ids retire by id. Local ids retire when the server holds a
    /// message with the same thread, sender and text.
    pub fn reconcile(&mut self, server: &[ChatMessage]) {
        let ids: HashSet<&str> = server.iter().map(|m| m.id.as_str()).collect();
        let before = self.entries.len();
        self.entries.retain(|entry| {
            if ids.contains(entry.id.as_str()) {
                return false;
            }
            if is_local_id(&entry.id) {
                return !server.iter().any(|m| {
                    m.thread_id == entry.thread_id
                        && m.sender_id == entry.sender_id
                        && m.text == entry.text
                });
            }
            true
        });
        let retired = before - self.entries.len();
        if retired > 0 {
            debug!(retired, pending = self.entries.len(), "outbox reconciled");
        }
    }

    /// The server cache followed by entries it does not already contain.
    pub fn merged(&self, server: &[ChatMessage]) -> Vec<ChatMessage> {
        let ids: HashSet<&str> = server.iter().map(|m| m.id.as_str()).collect();
        server
            .iter()
            .chain(self.entries.iter().filter(|m| !ids.contains(m.id.as_str())))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamachat_test_utils::fixtures::{at, from_patient, to_patient};

    #[test]
    fn merged_appends_pending_entries() {
        let server = vec![from_patient("1", "t1", "p-1", "hi", at(9, 0))];
        let mut outbox = Outbox::new();
        outbox.push(to_patient("srv-2", "t1", "p-1", "hello", at(9, 1)));

        let merged = outbox.merged(&server);
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "srv-2"]);
    }

    #[test]
    fn never_shows_a_message_twice() {
        let sent = to_patient("srv-2", "t1", "p-1", "hello", at(9, 1));
        let server = vec![from_patient("1", "t1", "p-1", "hi", at(9, 0)), sent.clone()];
        let mut outbox = Outbox::new();
        outbox.push(sent.clone());
        outbox.push(sent);
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.merged(&server).len(), 2);
    }

    #[test]
    fn reconcile_retires_by_id() {
        let mut outbox = Outbox::new();
        outbox.push(to_patient("srv-2", "t1", "p-1", "hello", at(9, 1)));
        outbox.push(to_patient("srv-3", "t1", "p-1", "again", at(9, 2)));

        outbox.reconcile(&[to_patient("srv-2", "t1", "p-1", "hello", at(9, 1))]);
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox.entries()[0].id, "srv-3");
    }

    #[test]
    fn reconcile_retires_local_ids_by_content() {
        let mut outbox = Outbox::new();
        outbox.push(to_patient("local-abc", "t1", "p-1", "hello", at(9, 1)));
        outbox.push(to_patient("local-def", "t1", "p-1", "unrelated", at(9, 2)));

        outbox.reconcile(&[to_patient("88", "t1", "p-1", "hello", at(9, 1))]);
        let ids: Vec<_> = outbox.entries().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["local-def"]);
    }

    #[test]
    fn server_ids_do_not_retire_by_content() {
        let mut outbox = Outbox::new();
        outbox.push(to_patient("srv-2", "t1", "p-1", "ok", at(9, 1)));
        outbox.reconcile(&[to_patient("17", "t1", "p-1", "ok", at(8, 0))]);
        assert_eq!(outbox.len(), 1);
    }
}
