// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warmup scheduling core for Embermail.
//!
//! Components:
//! - [`window`]: pure send-window check plus the holiday-aware gate
//! - [`ramp`]: week-indexed warmup ramp curve
//! - [`tracker`]: daily day/limit progression and enroll/deactivate
//! - [`planner`]: materializes daily warmup entries with jittered slots
//! - [`dispatch`]: claim-send-commit engine over the entry queue
//! - [`monitor`]: read-only spam-folder reputation probe
//! - [`holidays`]: Nager.Date fetcher and the SQLite-backed holiday cache

pub mod dispatch;
pub mod holidays;
pub mod monitor;
pub mod planner;
pub mod ramp;
pub mod tracker;
pub mod window;

pub use dispatch::{DispatchEngine, DispatchOutcome, DrainReport};
pub use holidays::{HolidayCache, HolidayFetcher, NoHolidays};
pub use monitor::{ReputationMonitor, SpamReport};
pub use planner::{DailyPlanner, PlanReport};
pub use ramp::RampCurve;
pub use tracker::{AdvanceReport, QuotaTracker};
pub use window::{is_within_window, WindowGate, WindowSchedule};
