// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warmup ramp curve: warmup day -> daily send limit.

use embermail_config::model::WarmupConfig;

/// Week-indexed ramp curve.
///
/// Day 1-7 uses the first weekly limit, day 8-14 the second, and so on;
/// days past the table reuse the last entry. Config validation guarantees a
/// non-empty, non-decreasing table.
#[derive(Debug, Clone)]
pub struct RampCurve {
    days: u32,
    weekly_limits: Vec<u32>,
    completed_daily_limit: u32,
}

impl RampCurve {
    pub fn new(days: u32, weekly_limits: Vec<u32>, completed_daily_limit: u32) -> Self {
        Self {
            days,
            weekly_limits,
            completed_daily_limit,
        }
    }

    pub fn from_config(config: &WarmupConfig) -> Self {
        Self::new(
            config.days,
            config.weekly_limits.clone(),
            config.completed_daily_limit,
        )
    }

    /// Daily limit for a 1-based warmup day.
    pub fn limit(&self, day: u32) -> u32 {
        let week = (day.max(1) - 1) / 7;
        let index = (week as usize).min(self.weekly_limits.len().saturating_sub(1));
        self.weekly_limits.get(index).copied().unwrap_or(0)
    }

    /// Last day of the ramp; a mailbox advancing beyond it graduates.
    pub fn final_day(&self) -> u32 {
        self.days
    }

    /// Overall daily limit granted after graduation.
    pub fn terminal_limit(&self) -> u32 {
        self.completed_daily_limit
    }
}
