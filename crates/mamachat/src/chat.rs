// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mamachat threads`, `show`, `send` and `watch`.

use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use mamachat_core::MamachatError;
use mamachat_core::types::ChatMessage;
use mamachat_sync::ChatSync;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::render::{Style, message_line, thread_line, unread_summary};

fn output(e: std::io::Error) -> MamachatError {
    MamachatError::Internal(format!("cannot write output: {e}"))
}

/// Print every thread, newest first.
pub async fn list_threads(
    sync: &ChatSync,
    json: bool,
    style: Style,
    out: &mut impl Write,
) -> Result<(), MamachatError> {
    sync.initial_load().await;
    let threads = sync.threads();

    if json {
        let body = serde_json::to_string_pretty(&threads)
            .map_err(|e| MamachatError::Internal(format!("cannot encode threads: {e}")))?;
        writeln!(out, "{body}").map_err(output)?;
        return Ok(());
    }

    for thread in &threads {
        writeln!(out, "{}", thread_line(thread, style)).map_err(output)?;
    }
    writeln!(out, "{}", unread_summary(&threads)).map_err(output)?;
    Ok(())
}

/// Print one thread's messages, oldest first.
pub async fn show_thread(
    sync: &ChatSync,
    id: &str,
    style: Style,
    out: &mut impl Write,
) -> Result<(), MamachatError> {
    sync.initial_load().await;
    let view = sync.select_thread(id).await?;
    let user = &sync.options().current_user_id;

    if let Some(thread) = view.thread() {
        writeln!(out, "{}", thread_line(thread, style)).map_err(output)?;
    }
    if view.messages().is_empty() {
        writeln!(out, "(no messages)").map_err(output)?;
    }
    for message in view.messages() {
        writeln!(out, "{}", message_line(message, user, style)).map_err(output)?;
    }
    Ok(())
}

/// Reply `text` in thread `id`.
pub async fn send_reply(
    sync: &ChatSync,
    id: &str,
    text: &str,
    out: &mut impl Write,
) -> Result<ChatMessage, MamachatError> {
    sync.initial_load().await;
    sync.select_thread(id).await?;
    let sent = sync.send_reply(text).await?;
    writeln!(out, "sent {} to {id}", sent.id).map_err(output)?;
    Ok(sent)
}

/// Ids of messages already printed by `watch`.
#[derive(Debug, Default)]
pub struct MessageTail {
    printed: HashSet<String>,
}

impl MessageTail {
    /// Messages in `messages` not returned by an earlier call, in order.
    pub fn fresh<'a>(&mut self, messages: &'a [ChatMessage]) -> Vec<&'a ChatMessage> {
        messages
            .iter()
            .filter(|m| self.printed.insert(m.id.clone()))
            .collect()
    }
}

/// Follow a thread, or the thread list, until `cancel` fires.
///
/// When following a thread, each non-blank stdin line is sent as a reply.
pub async fn watch(
    sync: Arc<ChatSync>,
    thread: Option<&str>,
    style: Style,
    cancel: CancellationToken,
) -> Result<(), MamachatError> {
    sync.initial_load().await;

    let runner = {
        let sync = Arc::clone(&sync);
        let cancel = cancel.clone();
        tokio::spawn(async move { sync.run(cancel).await })
    };

    let followed = match thread {
        Some(id) => follow_thread(&sync, id, style, &cancel).await,
        None => follow_threads(&sync, style, &cancel).await,
    };

    cancel.cancel();
    let stopped = runner
        .await
        .map_err(|e| MamachatError::Internal(format!("poll loop task failed: {e}")))?;
    followed.and(stopped)
}

async fn follow_thread(
    sync: &ChatSync,
    id: &str,
    style: Style,
    cancel: &CancellationToken,
) -> Result<(), MamachatError> {
    let user = sync.options().current_user_id.clone();
    let mut rx = sync.subscribe_view();
    let view = sync.select_thread(id).await?;
    rx.borrow_and_update();

    let mut tail = MessageTail::default();
    if let Some(thread) = view.thread() {
        println!("{}", thread_line(thread, style));
    }
    for message in tail.fresh(view.messages()) {
        println!("{}", message_line(message, &user, style));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = rx.borrow_and_update().clone();
                for message in tail.fresh(view.messages()) {
                    println!("{}", message_line(message, &user, style));
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(text)) => {
                    if !text.trim().is_empty() {
                        sync.set_draft(text).await;
                        if let Err(e) = sync.send_draft().await {
                            eprintln!("Error sending reply: {e}");
                        }
                    }
                }
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin read failed, replies disabled");
                    stdin_open = false;
                }
            },
        }
    }
    Ok(())
}

async fn follow_threads(
    sync: &ChatSync,
    style: Style,
    cancel: &CancellationToken,
) -> Result<(), MamachatError> {
    let mut rx = sync.subscribe_threads();
    loop {
        let threads = rx.borrow_and_update().clone();
        println!("{}", unread_summary(&threads));
        for thread in &threads {
            println!("  {}", thread_line(thread, style));
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamachat_core::ChatBackend;
    use mamachat_sync::SyncOptions;
    use mamachat_test_utils::MockBackend;
    use mamachat_test_utils::fixtures::{at, from_patient, thread};

    fn clinic() -> MockBackend {
        MockBackend::with_threads(
            vec![
                thread("a", "p-1", "hi", at(10, 0)),
                thread("b", "p-2", "hello", at(10, 5)),
            ],
            vec![
                from_patient("1", "a", "p-1", "hi", at(10, 0)),
                from_patient("2", "b", "p-2", "hello", at(10, 5)),
            ],
        )
    }

    fn sync_over(backend: &MockBackend) -> ChatSync {
        let backend: Arc<dyn ChatBackend> = Arc::new(backend.clone());
        ChatSync::new(backend, SyncOptions::default())
    }

    fn text(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn threads_listed_newest_first() {
        let sync = sync_over(&clinic());
        let mut out = Vec::new();
        list_threads(&sync, false, Style::PLAIN, &mut out).await.unwrap();
        let out = text(out);
        let lines: Vec<_> = out.lines().collect();
        assert!(lines[0].starts_with("b "));
        assert!(lines[1].starts_with("a "));
        assert_eq!(lines[2], "2 threads, 0 unread");
    }

    #[tokio::test]
    async fn threads_as_json() {
        let sync = sync_over(&clinic());
        let mut out = Vec::new();
        list_threads(&sync, true, Style::PLAIN, &mut out).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0]["id"], "b");
        assert_eq!(parsed[1]["last_message"], "hi");
    }

    #[tokio::test]
    async fn show_prints_thread_messages() {
        let sync = sync_over(&clinic());
        let mut out = Vec::new();
        show_thread(&sync, "a", Style::PLAIN, &mut out).await.unwrap();
        let out = text(out);
        assert!(out.lines().nth(1).unwrap().ends_with("p-1: hi"));
        assert!(!out.contains("hello"));
    }

    #[tokio::test]
    async fn show_unknown_thread_fails() {
        let sync = sync_over(&clinic());
        let err = show_thread(&sync, "zz", Style::PLAIN, &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "thread not found: zz");
    }

    #[tokio::test]
    async fn send_reports_the_new_id() {
        let backend = clinic();
        let sync = sync_over(&backend);
        let mut out = Vec::new();
        let sent = send_reply(&sync, "a", "Drink water", &mut out).await.unwrap();
        assert_eq!(text(out), format!("sent {} to a\n", sent.id));
        assert_eq!(backend.sent().await[0].message, "Drink water");
    }

    #[tokio::test]
    async fn rejected_send_carries_backend_text() {
        let backend = clinic();
        backend.reject_sends(Some((422, "Receiver is required"))).await;
        let sync = sync_over(&backend);
        let err = send_reply(&sync, "a", "hello", &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Receiver is required");
    }

    #[test]
    fn tail_returns_each_message_once() {
        let mut tail = MessageTail::default();
        let first = vec![from_patient("1", "a", "p-1", "hi", at(10, 0))];
        assert_eq!(tail.fresh(&first).len(), 1);

        let mut second = first.clone();
        second.push(from_patient("2", "a", "p-1", "again", at(10, 1)));
        let fresh: Vec<_> = tail.fresh(&second).into_iter().map(|m| m.id.as_str()).collect();
        assert_eq!(fresh, ["2"]);
        assert!(tail.fresh(&second).is_empty());
    }

    #[tokio::test]
    async fn watch_stops_on_cancel() {
        let sync = Arc::new(sync_over(&clinic()));
        let cancel = CancellationToken::new();
        cancel.cancel();
        watch(sync, None, Style::PLAIN, cancel).await.unwrap();
    }
}
