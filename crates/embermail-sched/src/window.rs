// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send window gating.
//!
//! `is_within_window` is a pure function over a schedule and an instant;
//! `WindowGate` layers the holiday check on top via `HolidaySource`.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use embermail_config::model::TimingConfig;
use embermail_core::{EmbermailError, HolidaySource};
use embermail_storage::models::Campaign;

/// A sending schedule: allowed weekdays plus a daily time window.
///
/// The window end is exclusive. An end at or before the start yields a
/// schedule that is never open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSchedule {
    /// Allowed weekday abbreviations (MON..SUN).
    pub allowed_days: Vec<String>,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    /// Skip days that are public holidays in `countries`.
    pub respect_holidays: bool,
    pub countries: Vec<String>,
}

impl WindowSchedule {
    /// Global warmup schedule from the `[timing]` config section.
    pub fn from_timing(timing: &TimingConfig, countries: &[String]) -> Self {
        Self {
            allowed_days: timing.allowed_days.clone(),
            start_hour: timing.start_hour,
            start_minute: timing.start_minute,
            end_hour: timing.end_hour,
            end_minute: timing.end_minute,
            respect_holidays: timing.respect_holidays,
            countries: countries.to_vec(),
        }
    }

    /// Per-campaign schedule carried on the campaign row.
    pub fn from_campaign(campaign: &Campaign) -> Self {
        Self {
            allowed_days: campaign.allowed_days.clone(),
            start_hour: campaign.start_hour,
            start_minute: campaign.start_minute,
            end_hour: campaign.end_hour,
            end_minute: campaign.end_minute,
            respect_holidays: campaign.respect_holidays,
            countries: campaign.target_countries.clone(),
        }
    }

    /// Inclusive window opening time, or `None` for out-of-range config.
    pub fn start_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.start_hour, self.start_minute, 0)
    }

    /// Exclusive window closing time, or `None` for out-of-range config.
    pub fn end_time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.end_hour, self.end_minute, 0)
    }
}

fn weekday_abbreviation(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

/// Pure window check: weekday allowed and time-of-day within [start, end).
///
/// No side effects and no holiday awareness; `WindowGate::is_open` adds the
/// holiday layer.
pub fn is_within_window(schedule: &WindowSchedule, now: NaiveDateTime) -> bool {
    let day = weekday_abbreviation(now.date().weekday());
    if !schedule.allowed_days.iter().any(|d| d == day) {
        return false;
    }

    let (Some(start), Some(end)) = (schedule.start_time(), schedule.end_time()) else {
        return false;
    };
    if end <= start {
        return false;
    }

    let time = now.time();
    time >= start && time < end
}

/// Window gate with holiday awareness.
pub struct WindowGate<'a> {
    holidays: &'a (dyn HolidaySource + Send + Sync),
}

impl<'a> WindowGate<'a> {
    pub fn new(holidays: &'a (dyn HolidaySource + Send + Sync)) -> Self {
        Self { holidays }
    }

    /// Whether the schedule is open at `now`, consulting the holiday source
    /// only when the schedule asks for it.
    pub async fn is_open(
        &self,
        schedule: &WindowSchedule,
        now: NaiveDateTime,
    ) -> Result<bool, EmbermailError> {
        if !is_within_window(schedule, now) {
            return Ok(false);
        }
        if schedule.respect_holidays
            && self
                .holidays
                .is_holiday(now.date(), &schedule.countries)
                .await?
        {
            return Ok(false);
        }
        Ok(true)
    }
}
