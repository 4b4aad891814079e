// SPDX-FileCopyrightText: 2026 Mamachat Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mamachat.toml` > `~/.config/mamachat/mamachat.toml` >
//! `/etc/mamachat/mamachat.toml` with environment variable overrides via `MAMACHAT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MamachatConfig;

/// Local config file name, also used under the XDG and system directories.
pub const CONFIG_FILE_NAME: &str = "mamachat.toml";

/// System-wide config location.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/mamachat/mamachat.toml";

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mamachat").join(CONFIG_FILE_NAME))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mamachat/mamachat.toml` (system-wide)
/// 3. `~/.config/mamachat/mamachat.toml` (user XDG config)
/// 4. `./mamachat.toml` (local directory)
/// 5. `MAMACHAT_*` environment variables
pub fn load_config() -> Result<MamachatConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<MamachatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MamachatConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MamachatConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MamachatConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MamachatConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `MAMACHAT_SYNC_POLL_INTERVAL_MS` must map to
/// `sync.poll_interval_ms`, not `sync.poll.interval.ms`.
fn env_provider() -> Env {
    Env::prefixed("MAMACHAT_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("client_", "client.", 1)
            .replacen("backend_", "backend.", 1)
            .replacen("sync_", "sync.", 1);
        mapped.into()
    })
}
