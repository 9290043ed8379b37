// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic clock for scheduler tests.

use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime};
use embermail_core::Clock;

/// A `Clock` pinned to a settable instant.
///
/// `set()` and `advance()` move time explicitly; nothing moves on its own.
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    /// Create a clock frozen at the given instant.
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump the clock to a new instant.
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }

    /// Move the clock forward (or backward) by a duration.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 16)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn clock_is_frozen_until_moved() {
        let clock = FixedClock::at(base());
        assert_eq!(clock.now(), base());
        assert_eq!(clock.now(), base());

        clock.advance(Duration::hours(3));
        assert_eq!(clock.now(), base() + Duration::hours(3));

        let next_day = base() + Duration::days(1);
        clock.set(next_day);
        assert_eq!(clock.today(), next_day.date());
    }
}
