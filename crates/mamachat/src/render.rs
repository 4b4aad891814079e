// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line formatting for threads and messages.

use chrono::{DateTime, Utc};
use colored::Colorize;
use mamachat_core::types::{ChatMessage, ChatThread, total_unread};

/// Output styling shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

impl Style {
    /// Colors only when not disabled and stdout is a terminal.
    pub fn detect(plain: bool) -> Self {
        use std::io::IsTerminal;
        Self {
            color: !plain && std::io::stdout().is_terminal(),
        }
    }

    pub const PLAIN: Style = Style { color: false };
}

pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "----------------".to_string(),
    }
}

pub fn thread_line(thread: &ChatThread, style: Style) -> String {
    let unread = if thread.unread_count > 0 {
        format!("({} unread)", thread.unread_count)
    } else {
        String::new()
    };
    let unread = if style.color {
        unread.yellow().bold().to_string()
    } else {
        unread
    };
    let name = if style.color {
        thread.user_name.bold().to_string()
    } else {
        thread.user_name.clone()
    };
    format!(
        "{:<12} {} {:<20} {} {}",
        thread.id,
        format_time(thread.last_message_time),
        name,
        thread.last_message,
        unread
    )
    .trim_end()
    .to_string()
}

pub fn message_line(message: &ChatMessage, current_user_id: &str, style: Style) -> String {
    let time = message
        .timestamp
        .map(|ts| ts.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());
    let mine = message.sender_id == current_user_id;
    let who = if mine { "you" } else { message.sender_id.as_str() };
    let who = match (style.color, mine) {
        (true, true) => who.cyan().to_string(),
        (true, false) => who.green().to_string(),
        (false, _) => who.to_string(),
    };
    format!("[{time}] {who}: {}", message.text)
}

pub fn unread_summary(threads: &[ChatThread]) -> String {
    let unread = total_unread(threads);
    let word = if threads.len() == 1 { "thread" } else { "threads" };
    format!("{} {word}, {unread} unread", threads.len())
}
