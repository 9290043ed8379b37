// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities and their row mappings.
//!
//! Timestamps are stored as ISO-8601 TEXT (`%Y-%m-%dT%H:%M:%S`) so SQL string
//! comparisons order chronologically. Enum columns store the lowercase strum
//! serializations from `embermail-core`.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use embermail_core::types::{ImapCredentials, SmtpCredentials};
use embermail_core::{CampaignId, EntryId, EntryKind, EntryStatus, MailboxId, WarmupPhase, WarmupStatus};

/// Storage format for datetime columns.
pub const DATETIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";
/// Storage format for date columns.
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Format a datetime for storage.
pub fn fmt_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

/// Format a date for storage.
pub fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

pub(crate) fn parse_datetime(idx: usize, s: &str) -> Result<NaiveDateTime, rusqlite::Error> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).map_err(|e| conversion_err(idx, e))
}

pub(crate) fn parse_date(idx: usize, s: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|e| conversion_err(idx, e))
}

fn parse_enum<T>(idx: usize, s: &str) -> Result<T, rusqlite::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    s.parse::<T>().map_err(|e| conversion_err(idx, e))
}

/// A sender mailbox with its warmup state.
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub id: MailboxId,
    pub email: String,
    pub display_name: String,
    pub smtp: SmtpCredentials,
    pub imap: ImapCredentials,
    pub is_active: bool,
    pub warmup_status: WarmupStatus,
    /// 1-based day within the warmup ramp; 0 when inactive.
    pub warmup_day: u32,
    pub warmup_phase: WarmupPhase,
    pub warmup_daily_limit: u32,
    /// Overall daily limit granted once warmup completes.
    pub daily_email_limit: u32,
    pub warmup_today_sent: u32,
    pub warmup_started_on: Option<NaiveDate>,
    /// Idempotence guard for the daily advance job.
    pub warmup_last_advanced_on: Option<NaiveDate>,
    pub last_sent_at: Option<NaiveDateTime>,
}

/// Insert payload for a new mailbox.
#[derive(Debug, Clone)]
pub struct NewMailbox {
    pub email: String,
    pub display_name: String,
    pub smtp: SmtpCredentials,
    pub imap: ImapCredentials,
}

pub(crate) const MAILBOX_COLUMNS: &str = "id, email, display_name, \
     smtp_host, smtp_port, smtp_username, smtp_password, \
     imap_host, imap_port, imap_username, imap_password, \
     is_active, warmup_status, warmup_day, warmup_phase, \
     warmup_daily_limit, daily_email_limit, warmup_today_sent, \
     warmup_started_on, warmup_last_advanced_on, last_sent_at";

pub(crate) fn mailbox_from_row(row: &rusqlite::Row<'_>) -> Result<Mailbox, rusqlite::Error> {
    let status: String = row.get(12)?;
    let phase: String = row.get(14)?;
    let started: Option<String> = row.get(18)?;
    let advanced: Option<String> = row.get(19)?;
    let last_sent: Option<String> = row.get(20)?;

    Ok(Mailbox {
        id: MailboxId(row.get(0)?),
        email: row.get(1)?,
        display_name: row.get(2)?,
        smtp: SmtpCredentials {
            host: row.get(3)?,
            port: row.get(4)?,
            username: row.get(5)?,
            password: row.get(6)?,
        },
        imap: ImapCredentials {
            host: row.get(7)?,
            port: row.get(8)?,
            username: row.get(9)?,
            password: row.get(10)?,
        },
        is_active: row.get(11)?,
        warmup_status: parse_enum(12, &status)?,
        warmup_day: row.get(13)?,
        warmup_phase: parse_enum(14, &phase)?,
        warmup_daily_limit: row.get(15)?,
        daily_email_limit: row.get(16)?,
        warmup_today_sent: row.get(17)?,
        warmup_started_on: started.as_deref().map(|s| parse_date(18, s)).transpose()?,
        warmup_last_advanced_on: advanced.as_deref().map(|s| parse_date(19, s)).transpose()?,
        last_sent_at: last_sent
            .as_deref()
            .map(|s| parse_datetime(20, s))
            .transpose()?,
    })
}

/// One planned outbound email in the send queue.
///
/// Entries are never deleted by dispatch; terminal rows form the audit trail
/// until the retention sweep removes them.
#[derive(Debug, Clone)]
pub struct SendEntry {
    pub id: EntryId,
    pub mailbox_id: MailboxId,
    pub campaign_id: Option<CampaignId>,
    pub kind: EntryKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub scheduled_at: NaiveDateTime,
    pub status: EntryStatus,
    pub error: Option<String>,
    pub message_id: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    /// Warmup day the entry was planned for, warmup kind only.
    pub warmup_day: Option<u32>,
}

/// Insert payload for a new send entry.
#[derive(Debug, Clone)]
pub struct NewSendEntry {
    pub mailbox_id: MailboxId,
    pub campaign_id: Option<CampaignId>,
    pub kind: EntryKind,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub scheduled_at: NaiveDateTime,
    pub warmup_day: Option<u32>,
}

pub(crate) const ENTRY_COLUMNS: &str = "id, mailbox_id, campaign_id, kind, recipient, \
     subject, body, scheduled_at, status, error, message_id, sent_at, warmup_day";

pub(crate) fn entry_from_row(row: &rusqlite::Row<'_>) -> Result<SendEntry, rusqlite::Error> {
    let kind: String = row.get(3)?;
    let scheduled: String = row.get(7)?;
    let status: String = row.get(8)?;
    let sent: Option<String> = row.get(11)?;

    Ok(SendEntry {
        id: EntryId(row.get(0)?),
        mailbox_id: MailboxId(row.get(1)?),
        campaign_id: row.get::<_, Option<i64>>(2)?.map(CampaignId),
        kind: parse_enum(3, &kind)?,
        recipient: row.get(4)?,
        subject: row.get(5)?,
        body: row.get(6)?,
        scheduled_at: parse_datetime(7, &scheduled)?,
        status: parse_enum(8, &status)?,
        error: row.get(9)?,
        message_id: row.get(10)?,
        sent_at: sent.as_deref().map(|s| parse_datetime(11, s)).transpose()?,
        warmup_day: row.get(12)?,
    })
}

/// A campaign with its own sending schedule and rate limits.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub status: String,
    pub scheduled_at: Option<NaiveDateTime>,
    /// Allowed weekday abbreviations (MON..SUN).
    pub allowed_days: Vec<String>,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    /// Minimum gap between two sends from the same mailbox.
    pub delay_between_secs: u32,
    pub max_emails_per_hour: u32,
    pub respect_holidays: bool,
    pub target_countries: Vec<String>,
}

/// Insert payload for a new campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub name: String,
    pub status: String,
    pub scheduled_at: Option<NaiveDateTime>,
    pub allowed_days: Vec<String>,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
    pub delay_between_secs: u32,
    pub max_emails_per_hour: u32,
    pub respect_holidays: bool,
    pub target_countries: Vec<String>,
}

pub(crate) const CAMPAIGN_COLUMNS: &str = "id, name, status, scheduled_at, allowed_days, \
     start_hour, start_minute, end_hour, end_minute, delay_between_secs, \
     max_emails_per_hour, respect_holidays, target_countries";

pub(crate) fn campaign_from_row(row: &rusqlite::Row<'_>) -> Result<Campaign, rusqlite::Error> {
    let scheduled: Option<String> = row.get(3)?;
    let allowed_days: String = row.get(4)?;
    let countries: String = row.get(12)?;

    Ok(Campaign {
        id: CampaignId(row.get(0)?),
        name: row.get(1)?,
        status: row.get(2)?,
        scheduled_at: scheduled
            .as_deref()
            .map(|s| parse_datetime(3, s))
            .transpose()?,
        allowed_days: split_csv(&allowed_days),
        start_hour: row.get(5)?,
        start_minute: row.get(6)?,
        end_hour: row.get(7)?,
        end_minute: row.get(8)?,
        delay_between_secs: row.get(9)?,
        max_emails_per_hour: row.get(10)?,
        respect_holidays: row.get(11)?,
        target_countries: split_csv(&countries),
    })
}

pub(crate) fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn join_csv(parts: &[String]) -> String {
    parts.join(",")
}

/// A cached public holiday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub country_code: String,
    pub name: String,
    pub year: i32,
}
