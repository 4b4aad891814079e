// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, endpoint path shapes, and interval lower bounds.

use crate::diagnostic::ConfigError;
use crate::model::MamachatConfig;

/// Shortest poll interval accepted, in milliseconds.
pub const MIN_POLL_INTERVAL_MS: u64 = 250;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MamachatConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::validation("backend.base_url must not be empty"));
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "backend.base_url `{base_url}` must start with http:// or https://"
        )));
    }

    for (key, path) in config.backend.paths() {
        if !path.starts_with('/') {
            errors.push(ConfigError::validation(format!(
                "backend.{key} `{path}` must start with `/`"
            )));
        }
    }

    if config
        .backend
        .api_token
        .as_deref()
        .is_some_and(|token| token.trim().is_empty())
    {
        errors.push(ConfigError::validation(
            "backend.api_token must not be empty when set",
        ));
    }

    if config.sync.poll_interval_ms < MIN_POLL_INTERVAL_MS {
        errors.push(ConfigError::validation(format!(
            "sync.poll_interval_ms must be at least {MIN_POLL_INTERVAL_MS}, got {}",
            config.sync.poll_interval_ms
        )));
    }

    let level = config.client.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "client.log_level `{}` is not one of {}",
            config.client.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.client.current_user_id.trim().is_empty() {
        errors.push(ConfigError::validation(
            "client.current_user_id must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
