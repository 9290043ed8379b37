// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: window ordering, ramp curve monotonicity, weekday names,
//! and country code shapes.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::EmbermailConfig;

const WEEKDAY_ABBREVIATIONS: &[&str] = &["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &EmbermailConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate database_path is not empty
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate window bounds
    if config.timing.start_hour > 23 || config.timing.end_hour > 23 {
        errors.push(ConfigError::Validation {
            message: format!(
                "timing window hours must be 0-23, got start {} end {}",
                config.timing.start_hour, config.timing.end_hour
            ),
        });
    }
    if config.timing.start_minute > 59 || config.timing.end_minute > 59 {
        errors.push(ConfigError::Validation {
            message: format!(
                "timing window minutes must be 0-59, got start {} end {}",
                config.timing.start_minute, config.timing.end_minute
            ),
        });
    }

    // The window end is exclusive; an end at or before the start would leave
    // the planner with nothing to plan into.
    let start = (config.timing.start_hour, config.timing.start_minute);
    let end = (config.timing.end_hour, config.timing.end_minute);
    if start >= end {
        errors.push(ConfigError::Validation {
            message: format!(
                "timing window must open before it closes, got {:02}:{:02}-{:02}:{:02}",
                start.0, start.1, end.0, end.1
            ),
        });
    }

    // Validate allowed weekdays
    let mut seen_days = HashSet::new();
    for day in &config.timing.allowed_days {
        if !WEEKDAY_ABBREVIATIONS.contains(&day.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "timing.allowed_days contains `{day}`, expected one of {}",
                    WEEKDAY_ABBREVIATIONS.join(", ")
                ),
            });
        } else if !seen_days.insert(day.as_str()) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate weekday `{day}` in timing.allowed_days"),
            });
        }
    }
    if config.timing.allowed_days.is_empty() {
        errors.push(ConfigError::Validation {
            message: "timing.allowed_days must not be empty".to_string(),
        });
    }

    // Validate slot spacing
    if config.timing.min_delay_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "timing.min_delay_minutes must be at least 1".to_string(),
        });
    }
    if config.timing.min_delay_minutes > config.timing.max_delay_minutes {
        errors.push(ConfigError::Validation {
            message: format!(
                "timing.min_delay_minutes ({}) must not exceed timing.max_delay_minutes ({})",
                config.timing.min_delay_minutes, config.timing.max_delay_minutes
            ),
        });
    }

    // Validate ramp curve
    if config.warmup.days == 0 {
        errors.push(ConfigError::Validation {
            message: "warmup.days must be at least 1".to_string(),
        });
    }
    if config.warmup.weekly_limits.is_empty() {
        errors.push(ConfigError::Validation {
            message: "warmup.weekly_limits must not be empty".to_string(),
        });
    }
    for (i, pair) in config.warmup.weekly_limits.windows(2).enumerate() {
        if pair[0] > pair[1] {
            errors.push(ConfigError::Validation {
                message: format!(
                    "warmup.weekly_limits must be non-decreasing, week {} ({}) > week {} ({})",
                    i + 1,
                    pair[0],
                    i + 2,
                    pair[1]
                ),
            });
        }
    }
    if let Some(&last) = config.warmup.weekly_limits.last()
        && config.warmup.completed_daily_limit < last
    {
        errors.push(ConfigError::Validation {
            message: format!(
                "warmup.completed_daily_limit ({}) must be at least the final weekly limit ({last})",
                config.warmup.completed_daily_limit
            ),
        });
    }

    // Validate dispatch bound
    if config.dispatch.max_batch == 0 {
        errors.push(ConfigError::Validation {
            message: "dispatch.max_batch must be at least 1".to_string(),
        });
    }

    // Validate country codes (ISO 3166-1 alpha-2)
    for code in &config.holidays.countries {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            errors.push(ConfigError::Validation {
                message: format!(
                    "holidays.countries contains `{code}`, expected a two-letter uppercase code"
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
