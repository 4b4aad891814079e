// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Synchronizer state: thread list, server cache, outbox and view.
//!
//! Everything here is synchronous and performs no I/O. [`ChatSync`]
//! plans network calls from this state, releases its lock, and commits
//! the results back through the `apply_*`/`commit_*` methods.
//!
//! [`ChatSync`]: crate::ChatSync

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use mamachat_core::error::MamachatError;
use mamachat_core::types::{ChatMessage, ChatThread, LegacySend, OutgoingMessage};

use crate::legacy::{sort_threads, synthesize_threads};
use crate::outbox::Outbox;

/// Which backend API the message list comes from. Fixed at initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// `/chat_threads` plus `/chat_messages`.
    Current,
    /// The flat `/chat_message` list; threads are synthesized locally.
    Legacy,
}

impl fmt::Display for SourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceShape::Current => write!(f, "current"),
            SourceShape::Legacy => write!(f, "legacy"),
        }
    }
}

/// What the message pane shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    NoThreadSelected,
    /// A thread is selected but the initial load has not finished.
    Loading { thread: ChatThread },
    /// A thread is open with its messages, oldest first.
    Idle {
        thread: ChatThread,
        messages: Arc<[ChatMessage]>,
    },
}

impl ViewState {
    pub fn thread(&self) -> Option<&ChatThread> {
        match self {
            ViewState::NoThreadSelected => None,
            ViewState::Loading { thread } | ViewState::Idle { thread, .. } => Some(thread),
        }
    }

    /// Displayed messages. Empty unless idle.
    pub fn messages(&self) -> &[ChatMessage] {
        match self {
            ViewState::Idle { messages, .. } => &**messages,
            _ => &[],
        }
    }

    /// Equal threads and the very same message allocation.
    pub fn is_same(&self, other: &ViewState) -> bool {
        match (self, other) {
            (ViewState::NoThreadSelected, ViewState::NoThreadSelected) => true,
            (ViewState::Loading { thread: a }, ViewState::Loading { thread: b }) => a == b,
            (
                ViewState::Idle {
                    thread: a,
                    messages: ma,
                },
                ViewState::Idle {
                    thread: b,
                    messages: mb,
                },
            ) => a == b && Arc::ptr_eq(ma, mb),
            _ => false,
        }
    }
}

/// Messages displayed under `thread`: every cached message referencing
/// either of its ids, stably sorted by timestamp ascending.
pub fn derive_subset(cache: &[ChatMessage], thread: &ChatThread) -> Vec<ChatMessage> {
    let mut subset: Vec<ChatMessage> = cache
        .iter()
        .filter(|m| m.belongs_to(thread))
        .cloned()
        .collect();
    subset.sort_by_key(|m| m.timestamp);
    subset
}

/// True when the two lists do not hold the same set of ids.
pub fn ids_differ(a: &[ChatMessage], b: &[ChatMessage]) -> bool {
    let a: HashSet<&str> = a.iter().map(|m| m.id.as_str()).collect();
    let b: HashSet<&str> = b.iter().map(|m| m.id.as_str()).collect();
    a != b
}

fn same_id_sequence(a: &[ChatMessage], b: &[ChatMessage]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

/// Result of applying a fetched message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The server cache was replaced.
    pub cache_changed: bool,
    /// The open thread's subset was republished.
    pub view_changed: bool,
}

/// The request a send should issue, planned under the state lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendRequest {
    Current(OutgoingMessage),
    Legacy(LegacySend),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPlan {
    /// `thread_id` of the thread the reply goes to.
    pub thread_id: String,
    pub request: SendRequest,
}

/// All synchronizer state behind one lock.
#[derive(Debug)]
pub struct SyncState {
    current_user_id: String,
    shape: SourceShape,
    loaded: bool,
    /// The thread list is derived from the cache, not fetched.
    synthesized: bool,
    threads: Vec<ChatThread>,
    server: Vec<ChatMessage>,
    outbox: Outbox,
    view: ViewState,
    draft: String,
}

impl SyncState {
    pub fn new(current_user_id: impl Into<String>) -> Self {
        Self {
            current_user_id: current_user_id.into(),
            shape: SourceShape::Current,
            loaded: false,
            synthesized: false,
            threads: Vec::new(),
            server: Vec::new(),
            outbox: Outbox::new(),
            view: ViewState::NoThreadSelected,
            draft: String::new(),
        }
    }

    pub fn shape(&self) -> SourceShape {
        self.shape
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether threads are rebuilt from the message cache on every change.
    pub fn threads_synthesized(&self) -> bool {
        self.synthesized
    }

    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Server cache merged with pending outbox entries.
    pub fn cache(&self) -> Vec<ChatMessage> {
        self.outbox.merged(&self.server)
    }

    /// Install the result of the initial load.
    ///
    /// Threads are synthesized from the messages when the backend gave
    /// none. A thread selected before the load finished becomes idle.
    pub fn apply_initial(
        &mut self,
        shape: SourceShape,
        threads: Vec<ChatThread>,
        messages: Vec<ChatMessage>,
    ) {
        self.shape = shape;
        self.server = messages;
        self.outbox.reconcile(&self.server);
        self.synthesized = threads.is_empty() || shape == SourceShape::Legacy;
        self.threads = if self.synthesized {
            synthesize_threads(&self.server, &self.current_user_id)
        } else {
            threads
        };
        sort_threads(&mut self.threads);
        self.loaded = true;

        if let ViewState::Loading { thread } = &self.view {
            let thread = self.resolve(thread).unwrap_or_else(|| thread.clone());
            let subset = derive_subset(&self.cache(), &thread);
            self.view = ViewState::Idle {
                thread,
                messages: subset.into(),
            };
        }
    }

    /// Replace the server cache with a fresh fetch if its id set differs.
    ///
    /// The open subset is republished only when its id sequence changes.
    pub fn apply_fetch(&mut self, fresh: Vec<ChatMessage>) -> FetchOutcome {
        if !ids_differ(&fresh, &self.server) {
            return FetchOutcome {
                cache_changed: false,
                view_changed: false,
            };
        }

        self.server = fresh;
        self.outbox.reconcile(&self.server);
        let cache = self.cache();
        if self.synthesized {
            self.threads = synthesize_threads(&cache, &self.current_user_id);
        }

        let view_changed = self.refresh_subset(&cache);
        FetchOutcome {
            cache_changed: true,
            view_changed,
        }
    }

    /// Open the thread whose id or thread id is `id`. No network.
    pub fn select(&mut self, id: &str) -> Result<&ViewState, MamachatError> {
        let thread = self
            .threads
            .iter()
            .find(|t| t.matches_id(id))
            .cloned()
            .ok_or_else(|| MamachatError::NotFound {
                kind: "thread",
                id: id.to_string(),
            })?;

        self.view = if self.loaded {
            let subset = derive_subset(&self.cache(), &thread);
            ViewState::Idle {
                thread,
                messages: subset.into(),
            }
        } else {
            ViewState::Loading { thread }
        };
        Ok(&self.view)
    }

    pub fn clear_selection(&mut self) {
        self.view = ViewState::NoThreadSelected;
    }

    /// Build the request for replying `text` in the open thread.
    pub fn prepare_send(&self, text: &str) -> Result<SendPlan, MamachatError> {
        let thread = self
            .view
            .thread()
            .ok_or_else(|| MamachatError::InvalidInput("no thread is open".into()))?;
        if text.trim().is_empty() {
            return Err(MamachatError::InvalidInput("message text is empty".into()));
        }

        let request = match self.shape {
            SourceShape::Current => SendRequest::Current(OutgoingMessage {
                thread_id: thread.thread_id.clone(),
                sender_id: self.current_user_id.clone(),
                receiver_id: thread.user_id.clone(),
                message: text.to_string(),
                patient_id: thread.user_id.clone(),
            }),
            SourceShape::Legacy => {
                let subset = derive_subset(&self.cache(), thread);
                SendRequest::Legacy(match subset.last() {
                    Some(latest) => LegacySend::Reply {
                        original_message_id: latest.id.clone(),
                        chat_id: thread.thread_id.clone(),
                        receiver_id: thread.user_id.clone(),
                        reply: text.to_string(),
                        health_worker_id: self.current_user_id.clone(),
                    },
                    None => LegacySend::Start {
                        chat_id: thread.thread_id.clone(),
                        sender_id: self.current_user_id.clone(),
                        receiver_id: thread.user_id.clone(),
                        message: text.to_string(),
                        timestamp: Utc::now(),
                    },
                })
            }
        };

        Ok(SendPlan {
            thread_id: thread.thread_id.clone(),
            request,
        })
    }

    /// Record a send the backend confirmed.
    ///
    /// The message joins the outbox and, if its thread is open, the
    /// displayed subset. The thread's last-message fields follow it and the
    /// draft is cleared.
    pub fn commit_send(&mut self, thread_id: &str, mut confirmed: ChatMessage) {
        let Some(index) = self.threads.iter().position(|t| t.matches_id(thread_id)) else {
            // The thread vanished from the list; keep the message anyway.
            self.outbox.push(confirmed);
            self.draft.clear();
            return;
        };

        if !confirmed.belongs_to(&self.threads[index]) {
            confirmed.thread_id = self.threads[index].thread_id.clone();
        }
        if confirmed.timestamp.is_none() {
            confirmed.timestamp = Some(Utc::now());
        }

        let thread = &mut self.threads[index];
        thread.last_message = confirmed.text.clone();
        thread.last_message_time = confirmed.timestamp;
        let updated = thread.clone();
        sort_threads(&mut self.threads);

        if !self.server.iter().any(|m| m.id == confirmed.id) {
            self.outbox.push(confirmed);
        }
        self.draft.clear();

        let open = self.view.thread().is_some_and(|t| t.matches_id(thread_id));
        if open {
            self.view = match self.view {
                ViewState::Idle { .. } => ViewState::Idle {
                    messages: derive_subset(&self.cache(), &updated).into(),
                    thread: updated,
                },
                _ => ViewState::Loading { thread: updated },
            };
        }
    }

    /// Current version of `thread` in the thread list.
    fn resolve(&self, thread: &ChatThread) -> Option<ChatThread> {
        self.threads
            .iter()
            .find(|t| t.matches_id(&thread.id) || t.matches_id(&thread.thread_id))
            .cloned()
    }

    /// Re-resolve the open thread and recompute its subset. Returns
    /// whether the subset was replaced; an unchanged id sequence keeps the
    /// same allocation.
    fn refresh_subset(&mut self, cache: &[ChatMessage]) -> bool {
        let ViewState::Idle { thread, messages } = &self.view else {
            return false;
        };
        let current = self.resolve(thread).unwrap_or_else(|| thread.clone());
        let subset = derive_subset(cache, &current);
        if same_id_sequence(&subset, messages) {
            if current != *thread {
                let messages = Arc::clone(messages);
                self.view = ViewState::Idle {
                    thread: current,
                    messages,
                };
            }
            return false;
        }
        self.view = ViewState::Idle {
            thread: current,
            messages: subset.into(),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamachat_test_utils::fixtures::{HEALTH_WORKER, at, from_patient, thread, to_patient};
    use proptest::prelude::*;

    fn loaded() -> SyncState {
        let mut state = SyncState::new(HEALTH_WORKER);
        state.apply_initial(
            SourceShape::Current,
            vec![
                thread("a", "p-1", "hi", at(10, 0)),
                thread("b", "p-2", "hello", at(10, 5)),
            ],
            vec![
                from_patient("1", "a", "p-1", "hi", at(10, 0)),
                from_patient("2", "b", "p-2", "hello", at(10, 5)),
            ],
        );
        state
    }

    fn confirmed(id: &str, thread_id: &str, text: &str) -> ChatMessage {
        to_patient(id, thread_id, "p-1", text, at(11, 0))
    }

    #[test]
    fn threads_render_newest_first() {
        let state = loaded();
        let ids: Vec<_> = state.threads().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn subset_matches_either_thread_spelling() {
        let t = ChatThread {
            thread_id: "thread-9".into(),
            ..thread("rec-9", "p-1", "", at(9, 0))
        };
        let cache = vec![
            from_patient("1", "thread-9", "p-1", "a", at(9, 2)),
            from_patient("2", "rec-9", "p-1", "b", at(9, 1)),
            from_patient("3", "other", "p-1", "c", at(9, 0)),
        ];
        let ids: Vec<_> = derive_subset(&cache, &t).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[test]
    fn undated_messages_sort_first_and_stay_stable() {
        let t = thread("a", "p-1", "", at(9, 0));
        let mut x = from_patient("x", "a", "p-1", "", at(0, 0));
        x.timestamp = None;
        let mut y = from_patient("y", "a", "p-1", "", at(0, 0));
        y.timestamp = None;
        let cache = vec![from_patient("1", "a", "p-1", "", at(9, 0)), x, y];
        let ids: Vec<_> = derive_subset(&cache, &t).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["x", "y", "1"]);
    }

    #[test]
    fn select_unknown_thread_is_not_found() {
        let mut state = loaded();
        let err = state.select("zzz").unwrap_err();
        assert!(matches!(err, MamachatError::NotFound { kind: "thread", .. }));
        assert_eq!(state.view(), &ViewState::NoThreadSelected);
    }

    #[test]
    fn select_before_load_waits_in_loading() {
        let mut state = SyncState::new(HEALTH_WORKER);
        state.apply_initial(SourceShape::Current, vec![thread("a", "p-1", "hi", at(10, 0))], vec![]);
        // Simulate a selection racing a reload.
        state.loaded = false;
        assert!(matches!(state.select("a").unwrap(), ViewState::Loading { .. }));
        assert!(state.view().messages().is_empty());

        state.apply_initial(
            SourceShape::Current,
            vec![thread("a", "p-1", "hi", at(10, 0))],
            vec![from_patient("1", "a", "p-1", "hi", at(10, 0))],
        );
        assert!(matches!(state.view(), ViewState::Idle { .. }));
        assert_eq!(state.view().messages().len(), 1);
    }

    #[test]
    fn unchanged_fetch_keeps_the_same_allocation() {
        let mut state = loaded();
        state.select("a").unwrap();
        let before = state.view().clone();

        let outcome = state.apply_fetch(state.server.clone());
        assert_eq!(
            outcome,
            FetchOutcome {
                cache_changed: false,
                view_changed: false
            }
        );
        assert!(state.view().is_same(&before));
    }

    #[test]
    fn change_elsewhere_keeps_open_subset_allocation() {
        let mut state = loaded();
        state.select("a").unwrap();
        let before = state.view().clone();

        let mut fresh = state.server.clone();
        fresh.push(from_patient("3", "b", "p-2", "are you there", at(10, 6)));
        let outcome = state.apply_fetch(fresh);
        assert!(outcome.cache_changed);
        assert!(!outcome.view_changed);
        assert!(state.view().is_same(&before));
    }

    #[test]
    fn new_message_in_open_thread_republishes() {
        let mut state = loaded();
        state.select("a").unwrap();
        let mut fresh = state.server.clone();
        fresh.push(from_patient("3", "a", "p-1", "still dizzy", at(10, 30)));

        assert!(state.apply_fetch(fresh).view_changed);
        let ids: Vec<_> = state.view().messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[test]
    fn polling_never_changes_the_state_kind() {
        let mut state = loaded();
        let mut fresh = state.server.clone();
        fresh.push(from_patient("3", "a", "p-1", "?", at(10, 30)));
        state.apply_fetch(fresh);
        assert_eq!(state.view(), &ViewState::NoThreadSelected);
    }

    #[test]
    fn prepare_send_requires_open_thread_and_text() {
        let mut state = loaded();
        assert!(matches!(
            state.prepare_send("hello"),
            Err(MamachatError::InvalidInput(_))
        ));
        state.select("a").unwrap();
        assert!(matches!(
            state.prepare_send("   \n"),
            Err(MamachatError::InvalidInput(_))
        ));
    }

    #[test]
    fn prepare_send_addresses_the_patient() {
        let mut state = loaded();
        state.select("a").unwrap();
        let plan = state.prepare_send("Drink water").unwrap();
        assert_eq!(plan.thread_id, "a");
        assert_eq!(
            plan.request,
            SendRequest::Current(OutgoingMessage {
                thread_id: "a".into(),
                sender_id: HEALTH_WORKER.into(),
                receiver_id: "p-1".into(),
                message: "Drink water".into(),
                patient_id: "p-1".into(),
            })
        );
    }

    #[test]
    fn legacy_send_replies_to_latest_or_starts() {
        let mut state = SyncState::new(HEALTH_WORKER);
        state.apply_initial(
            SourceShape::Legacy,
            vec![],
            vec![
                from_patient("1", "7", "p-1", "first", at(8, 0)),
                from_patient("2", "7", "p-1", "second", at(8, 5)),
            ],
        );
        state.select("7").unwrap();
        match state.prepare_send("ok").unwrap().request {
            SendRequest::Legacy(LegacySend::Reply {
                original_message_id,
                chat_id,
                receiver_id,
                ..
            }) => {
                assert_eq!(original_message_id, "2");
                assert_eq!(chat_id, "7");
                assert_eq!(receiver_id, "p-1");
            }
            other => panic!("expected reply, got {other:?}"),
        }

        // A thread with no messages starts the chat instead.
        state.threads.push(thread("9", "p-4", "", at(7, 0)));
        state.select("9").unwrap();
        assert!(matches!(
            state.prepare_send("Welcome").unwrap().request,
            SendRequest::Legacy(LegacySend::Start { .. })
        ));
    }

    #[test]
    fn commit_send_updates_outbox_subset_threads_and_draft() {
        let mut state = loaded();
        state.select("a").unwrap();
        state.set_draft("Drink water");
        state.commit_send("a", confirmed("srv-9", "a", "Drink water"));

        assert_eq!(state.outbox().len(), 1);
        assert!(state.cache().iter().any(|m| m.id == "srv-9"));
        let last = state.view().messages().last().unwrap();
        assert_eq!(last.sender_id, HEALTH_WORKER);
        assert_eq!(last.text, "Drink water");
        assert_eq!(state.threads()[0].id, "a");
        assert_eq!(state.threads()[0].last_message, "Drink water");
        assert_eq!(state.view().thread().unwrap().last_message, "Drink water");
        assert!(state.draft().is_empty());
    }

    #[test]
    fn stale_fetch_after_send_keeps_optimistic_message() {
        let mut state = loaded();
        state.select("a").unwrap();
        let stale = state.server.clone();
        state.commit_send("a", confirmed("srv-9", "a", "hello"));

        // A fetch that started before the send, with an unrelated change.
        let mut fresh = stale;
        fresh.push(from_patient("3", "b", "p-2", "?", at(10, 6)));
        state.apply_fetch(fresh);
        assert!(state.view().messages().iter().any(|m| m.id == "srv-9"));

        // The next fetch includes it; it is shown once.
        let mut fresh = state.server.clone();
        fresh.push(confirmed("srv-9", "a", "hello"));
        state.apply_fetch(fresh);
        assert!(state.outbox().is_empty());
        let count = state.cache().iter().filter(|m| m.id == "srv-9").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn local_id_retired_when_server_echoes_content() {
        let mut state = loaded();
        state.select("a").unwrap();
        state.commit_send("a", confirmed("local-1234", "a", "hello"));

        let mut fresh = state.server.clone();
        fresh.push(confirmed("55", "a", "hello"));
        state.apply_fetch(fresh);
        let ids: Vec<_> = state.view().messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "55"]);
    }

    #[test]
    fn legacy_poll_resynthesizes_threads() {
        let mut state = SyncState::new(HEALTH_WORKER);
        state.apply_initial(
            SourceShape::Legacy,
            vec![],
            vec![from_patient("1", "7", "p-1", "hi", at(8, 0))],
        );
        let mut fresh = state.server.clone();
        fresh.push(from_patient("2", "8", "p-2", "new chat", at(9, 0)));
        state.apply_fetch(fresh);

        let ids: Vec<_> = state.threads().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["8", "7"]);
    }

    #[test]
    fn threads_built_from_messages_follow_new_chats() {
        let mut state = SyncState::new(HEALTH_WORKER);
        state.apply_initial(
            SourceShape::Current,
            vec![],
            vec![from_patient("1", "a", "p-1", "hi", at(8, 0))],
        );
        assert!(state.threads_synthesized());

        let mut fresh = state.server.clone();
        fresh.push(from_patient("2", "b", "p-2", "new chat", at(9, 0)));
        assert!(state.apply_fetch(fresh).cache_changed);

        let ids: Vec<_> = state.threads().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        let view = state.select("b").unwrap();
        assert_eq!(view.messages().len(), 1);
    }

    #[test]
    fn fetched_threads_are_not_rebuilt() {
        let mut state = loaded();
        assert!(!state.threads_synthesized());
        let mut fresh = state.server.clone();
        fresh.push(from_patient("3", "c", "p-3", "new chat", at(10, 9)));
        state.apply_fetch(fresh);
        assert_eq!(state.threads().len(), 2);
    }

    #[test]
    fn open_view_follows_the_rebuilt_thread() {
        let mut state = SyncState::new(HEALTH_WORKER);
        state.apply_initial(
            SourceShape::Legacy,
            vec![],
            vec![from_patient("1", "7", "p-1", "hi", at(8, 0))],
        );
        state.select("7").unwrap();
        assert_eq!(state.view().thread().unwrap().unread_count, 1);

        let mut fresh = state.server.clone();
        fresh.push(from_patient("2", "7", "p-1", "still dizzy", at(8, 30)));
        state.apply_fetch(fresh);

        let open = state.view().thread().unwrap();
        assert_eq!(open.last_message, "still dizzy");
        assert_eq!(open.last_message_time, Some(at(8, 30)));
        assert_eq!(open.unread_count, 2);
        assert_eq!(open, &state.threads()[0]);
    }

    #[test]
    fn reselecting_yields_the_same_subset() {
        let mut state = loaded();
        let first = state.select("a").unwrap().clone();
        state.select("b").unwrap();
        let again = state.select("a").unwrap().clone();
        assert_eq!(first, again);
    }

    fn arb_message() -> impl Strategy<Value = ChatMessage> {
        (
            0u32..1000,
            prop::sample::select(vec!["a", "rec-a", "b", "c"]),
            prop::option::of(0u32..24),
            0u32..60,
        )
            .prop_map(|(n, thread_id, hour, minute)| {
                let mut m = from_patient(&n.to_string(), thread_id, "p-1", "x", at(0, 0));
                m.timestamp = hour.map(|h| at(h, minute));
                m
            })
    }

    proptest! {
        #[test]
        fn subset_is_exactly_the_matching_messages(cache in prop::collection::vec(arb_message(), 0..40)) {
            let t = ChatThread { thread_id: "a".into(), ..thread("rec-a", "p-1", "", at(0, 0)) };
            let subset = derive_subset(&cache, &t);
            let expected = cache
                .iter()
                .filter(|m| m.thread_id == "a" || m.thread_id == "rec-a")
                .count();
            prop_assert_eq!(subset.len(), expected);
            prop_assert!(subset.iter().all(|m| m.thread_id == "a" || m.thread_id == "rec-a"));
        }

        #[test]
        fn subset_is_sorted_ascending(cache in prop::collection::vec(arb_message(), 0..40)) {
            let t = thread("b", "p-1", "", at(0, 0));
            let subset = derive_subset(&cache, &t);
            prop_assert!(subset.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
    }
}
