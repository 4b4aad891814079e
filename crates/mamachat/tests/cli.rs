// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the `mamachat` binary against a mocked backend.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(name: &str, base_url: &str) -> PathBuf {
    let file = std::env::temp_dir().join(format!(
        "mamachat-cli-{}-{name}.toml",
        std::process::id()
    ));
    std::fs::write(
        &file,
        format!("[backend]\nbase_url = \"{base_url}\"\nrequest_timeout_secs = 5\n"),
    )
    .unwrap();
    file
}

async fn mamachat(config: PathBuf, args: &[&str]) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_mamachat"))
            .arg("--plain")
            .arg("--config")
            .arg(&config)
            .args(&args)
            .env("RUST_LOG", "error")
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

async fn clinic() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat_threads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"id": "t1", "user_id": "p-1", "user_name": "Amina",
             "last_message": "I feel dizzy", "last_message_time": "2024-03-01T10:00:00Z",
             "unread_count": 1},
            {"id": "t2", "user_id": "p-2", "user_name": "Grace",
             "last_message": "Thank you", "last_message_time": "2024-03-01T10:05:00Z"}
        ]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chat_messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "thread_id": "t1", "sender_id": "p-1", "receiver_id": "health_worker",
             "message": "I feel dizzy", "timestamp": "2024-03-01T10:00:00Z", "is_read": false}
        ])))
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn threads_lists_newest_first() {
    let server = clinic().await;
    let out = mamachat(write_config("threads", &server.uri()), &["threads"]).await;
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<_> = stdout.lines().collect();
    assert!(lines[0].starts_with("t2"));
    assert!(lines[1].starts_with("t1"));
    assert!(lines[1].ends_with("(1 unread)"));
    assert_eq!(lines[2], "2 threads, 1 unread");
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_send_exits_non_zero() {
    let server = clinic().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/chat_messages"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Thread is closed"})))
        .mount(&server)
        .await;

    let out = mamachat(
        write_config("reject", &server.uri()),
        &["send", "t1", "Please", "rest"],
    )
    .await;
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Error sending reply: Thread is closed"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn send_prints_the_confirmed_id() {
    let server = clinic().await;
    Mock::given(method("POST"))
        .and(path("/api/admin/chat_messages"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": {"id": 42}})))
        .expect(1)
        .mount(&server)
        .await;

    let out = mamachat(
        write_config("send", &server.uri()),
        &["send", "t1", "Please", "rest"],
    )
    .await;
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "sent 42 to t1\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn config_prints_effective_settings() {
    let out = mamachat(write_config("config", "http://clinic.example:8080"), &["config"]).await;
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("base_url = \"http://clinic.example:8080\""));
    assert!(stdout.contains("poll_interval_ms = 3000"));
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_config_is_reported() {
    let out = mamachat(write_config("invalid", "ftp://clinic"), &["threads"]).await;
    assert!(!out.status.success());
}
