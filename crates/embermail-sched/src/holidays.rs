// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Holiday cache service.
//!
//! `HolidayCache` answers `HolidaySource` queries from the local SQLite
//! cache; `HolidayFetcher` fills the cache from a Nager.Date compatible API
//! (`GET {base_url}/PublicHolidays/{year}/{country}`).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use embermail_core::{EmbermailError, HolidaySource};
use embermail_storage::models::Holiday;
use embermail_storage::queries::holidays;
use embermail_storage::Database;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// `HolidaySource` backed by the storage cache.
///
/// A date missing from the cache is simply not a holiday; the fetcher is
/// responsible for keeping the cache primed.
pub struct HolidayCache {
    db: Arc<Database>,
}

impl HolidayCache {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HolidaySource for HolidayCache {
    async fn is_holiday(
        &self,
        date: NaiveDate,
        country_codes: &[String],
    ) -> Result<bool, EmbermailError> {
        holidays::is_holiday(&self.db, date, country_codes).await
    }
}

/// A holiday gate that never matches; used when holidays are disabled.
pub struct NoHolidays;

#[async_trait]
impl HolidaySource for NoHolidays {
    async fn is_holiday(
        &self,
        _date: NaiveDate,
        _country_codes: &[String],
    ) -> Result<bool, EmbermailError> {
        Ok(false)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NagerHoliday {
    date: NaiveDate,
    name: String,
    country_code: String,
}

/// HTTP client for a Nager.Date compatible public holiday API.
pub struct HolidayFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HolidayFetcher {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch all public holidays for one country and year.
    pub async fn fetch_year(
        &self,
        country: &str,
        year: i32,
    ) -> Result<Vec<Holiday>, EmbermailError> {
        let url = format!("{}/PublicHolidays/{year}/{country}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EmbermailError::Transport {
                message: format!("holiday API request failed: {url}"),
                source: Some(Box::new(e)),
            })?
            .error_for_status()
            .map_err(|e| EmbermailError::Transport {
                message: format!("holiday API returned an error status: {url}"),
                source: Some(Box::new(e)),
            })?;

        let rows: Vec<NagerHoliday> =
            response.json().await.map_err(|e| EmbermailError::Transport {
                message: "holiday API returned malformed JSON".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(rows
            .into_iter()
            .map(|h| Holiday {
                date: h.date,
                country_code: h.country_code,
                name: h.name,
                year: h.date.year(),
            })
            .collect())
    }
}

/// Prime the cache for the current and next year across all configured
/// countries, skipping (country, year) pairs already cached.
///
/// Fetch failures are logged per country and do not abort the refresh.
/// Returns the number of newly cached holidays.
pub async fn refresh(
    db: &Database,
    fetcher: &HolidayFetcher,
    countries: &[String],
    today: NaiveDate,
) -> Result<u32, EmbermailError> {
    let years = [today.year(), today.year() + 1];
    let mut inserted = 0u32;

    for country in countries {
        let cached = holidays::cached_years(db, country).await?;
        for year in years {
            if cached.contains(&year) {
                debug!(country = %country, year, "holiday year already cached");
                continue;
            }
            match fetcher.fetch_year(country, year).await {
                Ok(batch) => {
                    inserted += holidays::upsert_holidays(db, &batch).await?;
                }
                Err(e) => {
                    warn!(country = %country, year, error = %e, "holiday fetch failed");
                }
            }
        }
    }

    info!(inserted, "holiday cache refreshed");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_db() -> (Arc<Database>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Arc::new(Database::open(db_path.to_str().unwrap(), true).await.unwrap());
        (db, dir)
    }

    fn nager_body() -> serde_json::Value {
        serde_json::json!([
            {
                "date": "2026-01-01",
                "localName": "Nowy Rok",
                "name": "New Year's Day",
                "countryCode": "PL"
            },
            {
                "date": "2026-05-01",
                "localName": "Święto Pracy",
                "name": "Labour Day",
                "countryCode": "PL"
            }
        ])
    }

    #[tokio::test]
    async fn fetch_year_parses_nager_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/PublicHolidays/2026/PL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(nager_body()))
            .mount(&server)
            .await;

        let fetcher = HolidayFetcher::new(&server.uri());
        let batch = fetcher.fetch_year("PL", 2026).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].name, "New Year's Day");
        assert_eq!(batch[0].country_code, "PL");
        assert_eq!(batch[0].year, 2026);
        assert_eq!(
            batch[1].date,
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
        );
    }

    #[tokio::test]
    async fn fetch_year_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/PublicHolidays/2026/XX"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HolidayFetcher::new(&server.uri());
        let err = fetcher.fetch_year("XX", 2026).await.unwrap_err();
        assert!(matches!(err, EmbermailError::Transport { .. }));
    }

    #[tokio::test]
    async fn refresh_skips_cached_years_and_tolerates_failures() {
        let (db, _dir) = setup_db().await;
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/PublicHolidays/2026/PL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(nager_body()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/PublicHolidays/2027/PL"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;
        // DE is down: refresh must keep going.
        Mock::given(method("GET"))
            .and(path("/PublicHolidays/2026/DE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/PublicHolidays/2027/DE"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = HolidayFetcher::new(&server.uri());
        let countries = vec!["PL".to_string(), "DE".to_string()];
        let today = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();

        let inserted = refresh(&db, &fetcher, &countries, today).await.unwrap();
        assert_eq!(inserted, 2);

        // PL 2026 is cached now; a second refresh does not refetch it.
        let cache = HolidayCache::new(db.clone());
        assert!(cache
            .is_holiday(
                NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                &["PL".to_string()]
            )
            .await
            .unwrap());

        refresh(&db, &fetcher, &countries, today).await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn no_holidays_source_always_says_no() {
        let source = NoHolidays;
        assert!(!source
            .is_holiday(
                NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
                &["PL".to_string()]
            )
            .await
            .unwrap());
    }
}
