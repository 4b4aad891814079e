// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread synthesis for backends that only expose a flat message list.

use std::collections::BTreeMap;

use mamachat_core::types::{ChatMessage, ChatThread};

/// Build one thread per distinct message `thread_id`.
///
/// Groups are visited in key order, then the result is sorted newest first
/// by [`sort_threads`].
pub fn synthesize_threads(messages: &[ChatMessage], current_user_id: &str) -> Vec<ChatThread> {
    let mut groups: BTreeMap<&str, Vec<&ChatMessage>> = BTreeMap::new();
    for message in messages {
        groups.entry(message.thread_id.as_str()).or_default().push(message);
    }

    let mut threads: Vec<ChatThread> = groups
        .into_iter()
        .filter_map(|(key, mut group)| {
            group.sort_by_key(|m| m.timestamp);
            let first = *group.first()?;
            let last = *group.last()?;
            let sent_by_me = last.sender_id == current_user_id;
            let other_party = if sent_by_me {
                &last.receiver_id
            } else {
                &last.sender_id
            };
            let unread_count = group
                .iter()
                .filter(|m| !m.read && m.receiver_id == current_user_id)
                .count() as u64;

            Some(ChatThread {
                id: key.to_string(),
                thread_id: key.to_string(),
                user_id: other_party.clone(),
                user_name: other_party.clone(),
                health_worker_id: if sent_by_me {
                    current_user_id.to_string()
                } else {
                    last.sender_id.clone()
                },
                last_message: last.text.clone(),
                last_message_time: last.timestamp,
                created_at: first.timestamp,
                unread_count,
            })
        })
        .collect();

    sort_threads(&mut threads);
    threads
}

/// Newest conversation first. Threads without a last-message time go last.
pub fn sort_threads(threads: &mut [ChatThread]) {
    threads.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
}
