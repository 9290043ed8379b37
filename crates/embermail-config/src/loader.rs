// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./embermail.toml` > `~/.config/embermail/embermail.toml`
//! > `/etc/embermail/embermail.toml` with environment variable overrides via the
//! `EMBERMAIL_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::EmbermailConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/embermail/embermail.toml` (system-wide)
/// 3. `~/.config/embermail/embermail.toml` (user XDG config)
/// 4. `./embermail.toml` (local directory)
/// 5. `EMBERMAIL_*` environment variables
pub fn load_config() -> Result<EmbermailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EmbermailConfig::default()))
        .merge(Toml::file("/etc/embermail/embermail.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("embermail/embermail.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("embermail.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<EmbermailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EmbermailConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EmbermailConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EmbermailConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `EMBERMAIL_STORAGE_DATABASE_PATH` must
/// map to `storage.database_path`, not `storage.database.path`.
fn env_provider() -> Env {
    Env::prefixed("EMBERMAIL_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: EMBERMAIL_TIMING_START_HOUR -> "timing_start_hour"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("daemon_", "daemon.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("warmup_", "warmup.", 1)
            .replacen("timing_", "timing.", 1)
            .replacen("dispatch_", "dispatch.", 1)
            .replacen("holidays_", "holidays.", 1);
        mapped.into()
    })
}
