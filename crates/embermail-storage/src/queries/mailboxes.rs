// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mailbox CRUD and warmup state transitions.
//!
//! State-changing statements guard on the current row state in the WHERE
//! clause and report whether a row was hit, so callers can distinguish a
//! successful transition from a lost race or an invalid starting state.

use chrono::{NaiveDate, NaiveDateTime};
use embermail_core::{EmbermailError, MailboxId, WarmupStatus};
use rusqlite::params;

use crate::database::Database;
use crate::models::{
    fmt_date, fmt_datetime, mailbox_from_row, Mailbox, NewMailbox, MAILBOX_COLUMNS,
};

/// Insert a new mailbox. Returns the auto-generated ID.
///
/// New mailboxes start inactive with zeroed warmup state.
pub async fn insert_mailbox(db: &Database, mailbox: &NewMailbox) -> Result<MailboxId, EmbermailError> {
    let mailbox = mailbox.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO mailboxes (email, display_name,
                    smtp_host, smtp_port, smtp_username, smtp_password,
                    imap_host, imap_port, imap_username, imap_password)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    mailbox.email,
                    mailbox.display_name,
                    mailbox.smtp.host,
                    mailbox.smtp.port,
                    mailbox.smtp.username,
                    mailbox.smtp.password,
                    mailbox.imap.host,
                    mailbox.imap.port,
                    mailbox.imap.username,
                    mailbox.imap.password,
                ],
            )?;
            Ok(MailboxId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a mailbox by ID.
pub async fn get_mailbox(db: &Database, id: MailboxId) -> Result<Option<Mailbox>, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MAILBOX_COLUMNS} FROM mailboxes WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id.0], mailbox_from_row);
            match result {
                Ok(mailbox) => Ok(Some(mailbox)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a mailbox by email address.
pub async fn get_mailbox_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<Mailbox>, EmbermailError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MAILBOX_COLUMNS} FROM mailboxes WHERE email = ?1"
            ))?;
            let result = stmt.query_row(params![email], mailbox_from_row);
            match result {
                Ok(mailbox) => Ok(Some(mailbox)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all active mailboxes, ordered by ID.
pub async fn list_active(db: &Database) -> Result<Vec<Mailbox>, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MAILBOX_COLUMNS} FROM mailboxes WHERE is_active = 1 ORDER BY id ASC"
            ))?;
            let mailboxes = stmt
                .query_map([], mailbox_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(mailboxes)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List active mailboxes in the given warmup status, ordered by ID.
pub async fn list_by_status(
    db: &Database,
    status: WarmupStatus,
) -> Result<Vec<Mailbox>, EmbermailError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MAILBOX_COLUMNS} FROM mailboxes
                 WHERE is_active = 1 AND warmup_status = ?1 ORDER BY id ASC"
            ))?;
            let mailboxes = stmt
                .query_map(params![status], mailbox_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(mailboxes)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Enroll an inactive mailbox into warmup.
///
/// Sets day 1, the silent phase, and the day-1 daily limit. Returns `false`
/// when the mailbox was not in the `inactive` state.
pub async fn set_enrolled(
    db: &Database,
    id: MailboxId,
    today: NaiveDate,
    day_one_limit: u32,
) -> Result<bool, EmbermailError> {
    let today = fmt_date(today);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE mailboxes SET warmup_status = 'warming', warmup_day = 1,
                    warmup_phase = 'silent', warmup_daily_limit = ?1,
                    warmup_today_sent = 0, warmup_started_on = ?2,
                    warmup_last_advanced_on = ?2,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                 WHERE id = ?3 AND warmup_status = 'inactive'",
                params![day_one_limit, today, id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deactivate a warming or completed mailbox back to `inactive`.
///
/// Returns `false` when the mailbox was already inactive. Pending entries
/// are cancelled separately via `entries::cancel_pending_for_mailbox`.
pub async fn set_deactivated(db: &Database, id: MailboxId) -> Result<bool, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE mailboxes SET warmup_status = 'inactive', warmup_day = 0,
                    warmup_phase = 'silent', warmup_daily_limit = 0,
                    warmup_today_sent = 0,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                 WHERE id = ?1 AND warmup_status IN ('warming', 'completed')",
                params![id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a daily warmup advance: new day index, phase, recomputed limit,
/// counter reset, and the guard date stamp.
///
/// The WHERE clause re-checks the guard so two advance jobs racing on the
/// same calendar day apply the roll exactly once. Returns `false` when the
/// guard rejected the update.
pub async fn apply_advance(
    db: &Database,
    id: MailboxId,
    day: u32,
    phase: &str,
    daily_limit: u32,
    today: NaiveDate,
) -> Result<bool, EmbermailError> {
    let phase = phase.to_string();
    let today = fmt_date(today);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE mailboxes SET warmup_day = ?1, warmup_phase = ?2,
                    warmup_daily_limit = ?3, warmup_today_sent = 0,
                    warmup_last_advanced_on = ?4,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                 WHERE id = ?5 AND warmup_status = 'warming'
                   AND (warmup_last_advanced_on IS NULL OR warmup_last_advanced_on < ?4)",
                params![day, phase, daily_limit, today, id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Graduate a warming mailbox to `completed` with its post-warmup limit.
pub async fn set_completed(
    db: &Database,
    id: MailboxId,
    daily_email_limit: u32,
    today: NaiveDate,
) -> Result<bool, EmbermailError> {
    let today = fmt_date(today);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE mailboxes SET warmup_status = 'completed', warmup_phase = 'active',
                    daily_email_limit = ?1, warmup_today_sent = 0,
                    warmup_last_advanced_on = ?2,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                 WHERE id = ?3 AND warmup_status = 'warming'",
                params![daily_email_limit, today, id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp the last send time, optionally incrementing the warmup counter.
///
/// Dispatch calls this inside the success commit; failed sends never reach it.
pub async fn record_send_success(
    db: &Database,
    id: MailboxId,
    sent_at: NaiveDateTime,
    increment_warmup_counter: bool,
) -> Result<(), EmbermailError> {
    let sent_at = fmt_datetime(sent_at);
    db.connection()
        .call(move |conn| {
            if increment_warmup_counter {
                conn.execute(
                    "UPDATE mailboxes SET warmup_today_sent = warmup_today_sent + 1,
                        last_sent_at = ?1,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                     WHERE id = ?2",
                    params![sent_at, id.0],
                )?;
            } else {
                conn.execute(
                    "UPDATE mailboxes SET last_sent_at = ?1,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                     WHERE id = ?2",
                    params![sent_at, id.0],
                )?;
            }
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Clamp an over-limit counter back down to the daily limit.
///
/// Self-healing for rows left inconsistent by a crash between the entry
/// commit and the counter update. Returns `true` when a clamp was applied.
pub async fn clamp_today_sent(db: &Database, id: MailboxId) -> Result<bool, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE mailboxes SET warmup_today_sent = warmup_daily_limit,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                 WHERE id = ?1 AND warmup_today_sent > warmup_daily_limit",
                params![id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
