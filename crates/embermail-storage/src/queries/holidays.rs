// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Holiday cache operations.

use chrono::{Datelike, NaiveDate};
use embermail_core::EmbermailError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{fmt_date, parse_date, Holiday};

/// Upsert a batch of holidays in one transaction. Duplicate (date, country)
/// pairs are ignored. Returns the number of newly inserted rows.
pub async fn upsert_holidays(db: &Database, holidays: &[Holiday]) -> Result<u32, EmbermailError> {
    let holidays = holidays.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut inserted = 0u32;
            {
                let mut stmt = tx.prepare(
                    "INSERT OR IGNORE INTO holidays (date, country_code, name, year)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for holiday in &holidays {
                    inserted += stmt.execute(params![
                        fmt_date(holiday.date),
                        holiday.country_code,
                        holiday.name,
                        holiday.year,
                    ])? as u32;
                }
            }
            tx.commit()?;
            Ok(inserted)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Check whether `date` is a cached holiday in any of the given countries.
pub async fn is_holiday(
    db: &Database,
    date: NaiveDate,
    countries: &[String],
) -> Result<bool, EmbermailError> {
    if countries.is_empty() {
        return Ok(false);
    }
    let date = fmt_date(date);
    let countries = countries.to_vec();
    db.connection()
        .call(move |conn| {
            let placeholders = (2..countries.len() + 2)
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT COUNT(*) FROM holidays
                 WHERE date = ?1 AND country_code IN ({placeholders})"
            ))?;
            let mut values: Vec<&dyn rusqlite::ToSql> = vec![&date];
            for country in &countries {
                values.push(country);
            }
            let count: i64 = stmt.query_row(values.as_slice(), |row| row.get(0))?;
            Ok(count > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List the years already cached for a country.
pub async fn cached_years(db: &Database, country: &str) -> Result<Vec<i32>, EmbermailError> {
    let country = country.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT year FROM holidays WHERE country_code = ?1 ORDER BY year",
            )?;
            let years = stmt
                .query_map(params![country], |row| row.get(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(years)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all cached holidays for a country and year, earliest first.
pub async fn list_holidays(
    db: &Database,
    country: &str,
    year: i32,
) -> Result<Vec<Holiday>, EmbermailError> {
    let country = country.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT date, country_code, name, year FROM holidays
                 WHERE country_code = ?1 AND year = ?2 ORDER BY date",
            )?;
            let holidays = stmt
                .query_map(params![country, year], |row| {
                    let date: String = row.get(0)?;
                    Ok(Holiday {
                        date: parse_date(0, &date)?,
                        country_code: row.get(1)?,
                        name: row.get(2)?,
                        year: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(holidays)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Build a `Holiday` from a date and name, deriving the year column.
pub fn holiday(date: NaiveDate, country_code: &str, name: &str) -> Holiday {
    Holiday {
        date,
        country_code: country_code.to_string(),
        name: name.to_string(),
        year: date.year(),
    }
}
