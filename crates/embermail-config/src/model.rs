// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Embermail warmup scheduler.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Embermail configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbermailConfig {
    /// Daemon identity, logging and cron schedule settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Warmup ramp curve settings.
    #[serde(default)]
    pub warmup: WarmupConfig,

    /// Daily sending window and slot jitter settings.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Dispatch engine settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Holiday calendar settings.
    #[serde(default)]
    pub holidays: HolidaysConfig,
}

/// Daemon identity and cron schedule configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Cron pattern for the daily warmup-day advance job.
    #[serde(default = "default_advance_cron")]
    pub advance_cron: String,

    /// Cron pattern for the daily planning job.
    #[serde(default = "default_plan_cron")]
    pub plan_cron: String,

    /// Cron pattern for the dispatch drain job.
    #[serde(default = "default_dispatch_cron")]
    pub dispatch_cron: String,

    /// Cron pattern for the entry retention sweep.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,

    /// Cron pattern for the holiday cache refresh.
    #[serde(default = "default_holidays_cron")]
    pub holidays_cron: String,

    /// Days to retain terminal send entries before the sweep deletes them.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            advance_cron: default_advance_cron(),
            plan_cron: default_plan_cron(),
            dispatch_cron: default_dispatch_cron(),
            cleanup_cron: default_cleanup_cron(),
            holidays_cron: default_holidays_cron(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// Advance runs shortly after midnight so the counter reset and the new day's
// limit are in place before planning at 00:30.
fn default_advance_cron() -> String {
    "0 5 0 * * *".to_string()
}

fn default_plan_cron() -> String {
    "0 30 0 * * *".to_string()
}

// Offset from the full five minutes so dispatch never races the daily jobs.
fn default_dispatch_cron() -> String {
    "0 2/5 * * * *".to_string()
}

fn default_cleanup_cron() -> String {
    "0 0 2 * * *".to_string()
}

fn default_holidays_cron() -> String {
    "0 0 3 * * *".to_string()
}

fn default_retention_days() -> u32 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("embermail").join("embermail.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("embermail.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Warmup ramp curve configuration.
///
/// The curve maps a warmup day to that day's allowed send count via a
/// week-indexed table: day 1-7 uses `weekly_limits[0]`, day 8-14 uses
/// `weekly_limits[1]`, and so on. Days past the table reuse the last entry.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WarmupConfig {
    /// Total length of the warmup ramp in days.
    #[serde(default = "default_warmup_days")]
    pub days: u32,

    /// Per-week warmup daily limits, must be non-decreasing.
    #[serde(default = "default_weekly_limits")]
    pub weekly_limits: Vec<u32>,

    /// Days spent in the silent phase before campaign traffic is allowed.
    #[serde(default = "default_silent_days")]
    pub silent_days: u32,

    /// Overall daily email limit granted once warmup completes.
    #[serde(default = "default_completed_daily_limit")]
    pub completed_daily_limit: u32,
}

impl Default for WarmupConfig {
    fn default() -> Self {
        Self {
            days: default_warmup_days(),
            weekly_limits: default_weekly_limits(),
            silent_days: default_silent_days(),
            completed_daily_limit: default_completed_daily_limit(),
        }
    }
}

fn default_warmup_days() -> u32 {
    30
}

fn default_weekly_limits() -> Vec<u32> {
    vec![15, 25, 35, 50, 75]
}

fn default_silent_days() -> u32 {
    7
}

fn default_completed_daily_limit() -> u32 {
    100
}

/// Daily sending window and slot jitter configuration for warmup traffic.
///
/// Campaigns carry their own schedule; this section only governs warmup
/// entries and the planner's slot spacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Weekdays on which warmup sends are allowed (MON..SUN abbreviations).
    #[serde(default = "default_allowed_days")]
    pub allowed_days: Vec<String>,

    /// Window opening hour (0-23).
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    /// Window opening minute (0-59).
    #[serde(default)]
    pub start_minute: u32,

    /// Window closing hour, exclusive (0-23).
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    /// Window closing minute (0-59).
    #[serde(default)]
    pub end_minute: u32,

    /// Minimum spacing between planned slots, in minutes.
    #[serde(default = "default_min_delay_minutes")]
    pub min_delay_minutes: u32,

    /// Maximum spacing between planned slots, in minutes.
    #[serde(default = "default_max_delay_minutes")]
    pub max_delay_minutes: u32,

    /// Random offset added to the first slot after window open, in minutes.
    #[serde(default = "default_start_jitter_minutes")]
    pub start_jitter_minutes: u32,

    /// How far past its slot time an entry stays dispatchable, in minutes.
    /// A cron tick at 07:28 still sends an entry slotted for 07:23.
    #[serde(default = "default_tolerance_minutes")]
    pub tolerance_minutes: u32,

    /// Skip warmup sends on holidays in the configured countries.
    #[serde(default)]
    pub respect_holidays: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            allowed_days: default_allowed_days(),
            start_hour: default_start_hour(),
            start_minute: 0,
            end_hour: default_end_hour(),
            end_minute: 0,
            min_delay_minutes: default_min_delay_minutes(),
            max_delay_minutes: default_max_delay_minutes(),
            start_jitter_minutes: default_start_jitter_minutes(),
            tolerance_minutes: default_tolerance_minutes(),
            respect_holidays: false,
        }
    }
}

fn default_allowed_days() -> Vec<String> {
    ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

fn default_start_hour() -> u32 {
    6
}

fn default_end_hour() -> u32 {
    22
}

fn default_min_delay_minutes() -> u32 {
    10
}

fn default_max_delay_minutes() -> u32 {
    30
}

fn default_start_jitter_minutes() -> u32 {
    30
}

fn default_tolerance_minutes() -> u32 {
    10
}

/// Dispatch engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchConfig {
    /// Iteration bound for a batch drain; one iteration sends at most one email.
    #[serde(default = "default_max_batch")]
    pub max_batch: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_batch: default_max_batch(),
        }
    }
}

fn default_max_batch() -> u32 {
    25
}

/// Holiday calendar configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HolidaysConfig {
    /// Enable holiday fetching and the holiday gate.
    #[serde(default)]
    pub enabled: bool,

    /// ISO 3166-1 alpha-2 country codes to cache holidays for.
    #[serde(default = "default_holiday_countries")]
    pub countries: Vec<String>,

    /// Base URL of the Nager.Date compatible holiday API.
    #[serde(default = "default_holiday_api_base_url")]
    pub api_base_url: String,
}

impl Default for HolidaysConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            countries: default_holiday_countries(),
            api_base_url: default_holiday_api_base_url(),
        }
    }
}

fn default_holiday_countries() -> Vec<String> {
    ["PL", "DE", "FR", "GB", "US"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn default_holiday_api_base_url() -> String {
    "https://date.nager.at/api/v3".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ramp_curve_is_non_decreasing() {
        let config = WarmupConfig::default();
        for pair in config.weekly_limits.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn default_window_is_six_to_twenty_two() {
        let timing = TimingConfig::default();
        assert_eq!(timing.start_hour, 6);
        assert_eq!(timing.end_hour, 22);
        assert_eq!(timing.allowed_days.len(), 7);
    }

    #[test]
    fn unknown_section_key_is_rejected() {
        let toml_str = r#"
[warmup]
days = 30
dialy_limit = 15
"#;
        let result = toml::from_str::<EmbermailConfig>(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn partial_sections_fill_with_defaults() {
        let toml_str = r#"
[timing]
start_hour = 9
end_hour = 17
"#;
        let config: EmbermailConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.timing.start_hour, 9);
        assert_eq!(config.timing.end_hour, 17);
        assert_eq!(config.timing.min_delay_minutes, 10);
        assert_eq!(config.warmup.days, 30);
    }
}
