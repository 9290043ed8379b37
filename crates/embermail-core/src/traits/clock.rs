// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of "now" for the scheduler.
///
/// All quota and window computations take time through this trait so they
/// stay deterministic under test. Times are naive local datetimes; the
/// deployment timezone is an operational concern outside the core.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Production clock backed by the local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
