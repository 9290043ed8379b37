// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::EmbermailError;

/// Public-holiday classification for the window gate.
///
/// The holiday set is external configuration; the scheduler only asks
/// whether a given date is a holiday in any of the target countries.
#[async_trait]
pub trait HolidaySource {
    async fn is_holiday(
        &self,
        date: NaiveDate,
        country_codes: &[String],
    ) -> Result<bool, EmbermailError>;
}
