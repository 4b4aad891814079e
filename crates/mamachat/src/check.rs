// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mamachat check`: configuration and backend reachability.

use std::time::{Duration, Instant};

use mamachat_config::MamachatConfig;
use mamachat_core::ChatBackend;
use mamachat_core::types::HealthStatus;

use crate::render::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

/// Run every check, print the report, and return the number of failures.
pub async fn run_check(config: &MamachatConfig, backend: &dyn ChatBackend, style: Style) -> usize {
    let results = vec![
        check_config(config),
        check_threads_api(backend).await,
        check_legacy_api(backend).await,
    ];

    println!();
    println!("  mamachat check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", report_line(result, style));
    }
    println!();

    let failures = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    let warnings = results
        .iter()
        .filter(|r| r.status == CheckStatus::Warn)
        .count();
    match failures + warnings {
        0 => println!("  All checks passed."),
        1 => println!("  1 issue found."),
        n => println!("  {n} issues found."),
    }
    println!();
    failures
}

pub fn report_line(result: &CheckResult, style: Style) -> String {
    let ms = result.duration.as_millis();
    if style.color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green().to_string(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow().to_string(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red().to_string(), result.message.red()),
        };
        format!("    {symbol} {:<20} {message} ({ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<20} {} ({ms}ms)", result.name, result.message)
    }
}

fn check_config(config: &MamachatConfig) -> CheckResult {
    CheckResult {
        name: "Configuration".to_string(),
        status: CheckStatus::Pass,
        message: format!(
            "valid (backend {}, user {})",
            config.backend.base_url, config.client.current_user_id
        ),
        duration: Duration::ZERO,
    }
}

async fn check_threads_api(backend: &dyn ChatBackend) -> CheckResult {
    let start = Instant::now();
    let (status, message) = match backend.health_check().await {
        Ok(HealthStatus::Healthy) => (CheckStatus::Pass, "reachable".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (CheckStatus::Warn, reason),
        Ok(HealthStatus::Unhealthy(reason)) => (CheckStatus::Fail, reason),
        Err(e) => (CheckStatus::Fail, e.to_string()),
    };
    CheckResult {
        name: "Thread API".to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

/// The legacy list is optional, so failures only warn.
async fn check_legacy_api(backend: &dyn ChatBackend) -> CheckResult {
    let start = Instant::now();
    let (status, message) = match backend.fetch_legacy_messages().await {
        Ok(messages) => (
            CheckStatus::Pass,
            format!("{} message(s)", messages.len()),
        ),
        Err(e) => (CheckStatus::Warn, format!("unavailable: {e}")),
    };
    CheckResult {
        name: "Legacy message API".to_string(),
        status,
        message,
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mamachat_test_utils::MockBackend;

    #[tokio::test]
    async fn healthy_backend_passes() {
        let backend = MockBackend::new();
        assert_eq!(check_threads_api(&backend).await.status, CheckStatus::Pass);
        let legacy = check_legacy_api(&backend).await;
        assert_eq!(legacy.status, CheckStatus::Pass);
        assert_eq!(legacy.message, "0 message(s)");
        assert_eq!(
            run_check(&MamachatConfig::default(), &backend, Style::PLAIN).await,
            0
        );
    }

    #[tokio::test]
    async fn unreachable_backend_fails_threads_and_warns_legacy() {
        let backend = MockBackend::new();
        backend.fail_fetches(true).await;
        assert_eq!(check_threads_api(&backend).await.status, CheckStatus::Fail);
        assert_eq!(check_legacy_api(&backend).await.status, CheckStatus::Warn);
        assert_eq!(
            run_check(&MamachatConfig::default(), &backend, Style::PLAIN).await,
            1
        );
    }

    #[test]
    fn plain_report_lines() {
        let result = CheckResult {
            name: "Thread API".to_string(),
            status: CheckStatus::Warn,
            message: "odd body".to_string(),
            duration: Duration::from_millis(7),
        };
        assert_eq!(
            report_line(&result, Style::PLAIN),
            format!("    [WARN] {:<20} odd body (7ms)", "Thread API")
        );
    }
}
