// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Campaign CRUD operations.

use embermail_core::{CampaignId, EmbermailError};
use rusqlite::params;

use crate::database::Database;
use crate::models::{
    campaign_from_row, fmt_datetime, join_csv, Campaign, NewCampaign, CAMPAIGN_COLUMNS,
};

/// Insert a new campaign. Returns the auto-generated ID.
pub async fn insert_campaign(
    db: &Database,
    campaign: &NewCampaign,
) -> Result<CampaignId, EmbermailError> {
    let campaign = campaign.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO campaigns (name, status, scheduled_at, allowed_days,
                    start_hour, start_minute, end_hour, end_minute,
                    delay_between_secs, max_emails_per_hour, respect_holidays,
                    target_countries)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    campaign.name,
                    campaign.status,
                    campaign.scheduled_at.map(fmt_datetime),
                    join_csv(&campaign.allowed_days),
                    campaign.start_hour,
                    campaign.start_minute,
                    campaign.end_hour,
                    campaign.end_minute,
                    campaign.delay_between_secs,
                    campaign.max_emails_per_hour,
                    campaign.respect_holidays,
                    join_csv(&campaign.target_countries),
                ],
            )?;
            Ok(CampaignId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a campaign by ID.
pub async fn get_campaign(
    db: &Database,
    id: CampaignId,
) -> Result<Option<Campaign>, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id.0], campaign_from_row);
            match result {
                Ok(campaign) => Ok(Some(campaign)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all campaigns, newest first.
pub async fn list_campaigns(db: &Database) -> Result<Vec<Campaign>, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CAMPAIGN_COLUMNS} FROM campaigns ORDER BY id DESC"
            ))?;
            let campaigns = stmt
                .query_map([], campaign_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(campaigns)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let (db, _dir) = setup_db().await;

        let scheduled = NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let new = NewCampaign {
            name: "Spring launch".to_string(),
            status: "scheduled".to_string(),
            scheduled_at: Some(scheduled),
            allowed_days: vec!["MON".into(), "TUE".into(), "WED".into()],
            start_hour: 9,
            start_minute: 30,
            end_hour: 17,
            end_minute: 0,
            delay_between_secs: 120,
            max_emails_per_hour: 40,
            respect_holidays: true,
            target_countries: vec!["PL".into(), "DE".into()],
        };

        let id = insert_campaign(&db, &new).await.unwrap();
        let campaign = get_campaign(&db, id).await.unwrap().unwrap();

        assert_eq!(campaign.name, "Spring launch");
        assert_eq!(campaign.scheduled_at, Some(scheduled));
        assert_eq!(campaign.allowed_days, vec!["MON", "TUE", "WED"]);
        assert_eq!(campaign.start_hour, 9);
        assert_eq!(campaign.start_minute, 30);
        assert_eq!(campaign.delay_between_secs, 120);
        assert_eq!(campaign.max_emails_per_hour, 40);
        assert!(campaign.respect_holidays);
        assert_eq!(campaign.target_countries, vec!["PL", "DE"]);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_campaign_returns_none() {
        let (db, _dir) = setup_db().await;
        let missing = get_campaign(&db, CampaignId(42)).await.unwrap();
        assert!(missing.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let (db, _dir) = setup_db().await;

        for name in ["first", "second"] {
            let new = NewCampaign {
                name: name.to_string(),
                status: "draft".to_string(),
                scheduled_at: None,
                allowed_days: vec!["MON".into()],
                start_hour: 6,
                start_minute: 0,
                end_hour: 22,
                end_minute: 0,
                delay_between_secs: 60,
                max_emails_per_hour: 100,
                respect_holidays: false,
                target_countries: Vec::new(),
            };
            insert_campaign(&db, &new).await.unwrap();
        }

        let campaigns = list_campaigns(&db).await.unwrap();
        assert_eq!(campaigns.len(), 2);
        assert_eq!(campaigns[0].name, "second");

        db.close().await.unwrap();
    }
}
