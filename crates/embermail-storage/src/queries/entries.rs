// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send entry queue operations.
//!
//! Dispatch claims entries with a compare-and-set status update
//! (`pending` -> `sending`); a successful send commits the entry update and
//! the mailbox counters in one transaction.

use chrono::{NaiveDateTime, Timelike};
use embermail_core::{EmbermailError, EntryId, MailboxId};
use rusqlite::params;

use crate::database::Database;
use crate::models::{entry_from_row, fmt_datetime, NewSendEntry, SendEntry, ENTRY_COLUMNS};

/// Insert a batch of new entries in one transaction. Returns the count.
pub async fn insert_entries(db: &Database, entries: &[NewSendEntry]) -> Result<u32, EmbermailError> {
    let entries = entries.to_vec();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO send_entries (mailbox_id, campaign_id, kind, recipient,
                        subject, body, scheduled_at, warmup_day)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                )?;
                for entry in &entries {
                    stmt.execute(params![
                        entry.mailbox_id.0,
                        entry.campaign_id.map(|c| c.0),
                        entry.kind.to_string(),
                        entry.recipient,
                        entry.subject,
                        entry.body,
                        fmt_datetime(entry.scheduled_at),
                        entry.warmup_day,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(entries.len() as u32)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an entry by ID.
pub async fn get_entry(db: &Database, id: EntryId) -> Result<Option<SendEntry>, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM send_entries WHERE id = ?1"
            ))?;
            let result = stmt.query_row(params![id.0], entry_from_row);
            match result {
                Ok(entry) => Ok(Some(entry)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List pending entries due by `cutoff`, oldest slot first, ties broken by
/// mailbox ID.
pub async fn list_due(
    db: &Database,
    cutoff: NaiveDateTime,
) -> Result<Vec<SendEntry>, EmbermailError> {
    let cutoff = fmt_datetime(cutoff);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM send_entries
                 WHERE status = 'pending' AND scheduled_at <= ?1
                 ORDER BY scheduled_at ASC, mailbox_id ASC"
            ))?;
            let entries = stmt
                .query_map(params![cutoff], entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claim an entry for sending: `pending` -> `sending`.
///
/// Returns `false` when the entry was already claimed or is no longer
/// pending; the caller must treat that as no work, never as an error.
pub async fn claim(db: &Database, id: EntryId) -> Result<bool, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE send_entries SET status = 'sending'
                 WHERE id = ?1 AND status = 'pending'",
                params![id.0],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Commit a successful send: entry -> `sent` with receipt data, and the
/// owning mailbox's `last_sent_at` (plus the warmup counter when the entry
/// was warmup kind), all in one transaction.
pub async fn commit_sent(
    db: &Database,
    id: EntryId,
    mailbox_id: MailboxId,
    message_id: &str,
    sent_at: NaiveDateTime,
    increment_warmup_counter: bool,
) -> Result<(), EmbermailError> {
    let message_id = message_id.to_string();
    let sent_at = fmt_datetime(sent_at);
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "UPDATE send_entries SET status = 'sent', message_id = ?1, sent_at = ?2
                 WHERE id = ?3 AND status = 'sending'",
                params![message_id, sent_at, id.0],
            )?;
            if increment_warmup_counter {
                tx.execute(
                    "UPDATE mailboxes SET warmup_today_sent = warmup_today_sent + 1,
                        last_sent_at = ?1,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                     WHERE id = ?2",
                    params![sent_at, mailbox_id.0],
                )?;
            } else {
                tx.execute(
                    "UPDATE mailboxes SET last_sent_at = ?1,
                        updated_at = strftime('%Y-%m-%dT%H:%M:%S', 'now')
                     WHERE id = ?2",
                    params![sent_at, mailbox_id.0],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a claimed entry as failed with the transport error. Terminal; no
/// counter is touched and no retry is scheduled.
pub async fn mark_failed(db: &Database, id: EntryId, error: &str) -> Result<(), EmbermailError> {
    let error = error.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE send_entries SET status = 'failed', error = ?1
                 WHERE id = ?2 AND status IN ('pending', 'sending')",
                params![error, id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a pending entry as skipped with a reason (stale quota, mailbox no
/// longer warming, cancelled).
pub async fn mark_skipped(db: &Database, id: EntryId, reason: &str) -> Result<(), EmbermailError> {
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE send_entries SET status = 'skipped', error = ?1
                 WHERE id = ?2 AND status IN ('pending', 'sending')",
                params![reason, id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Skip all pending entries for a mailbox. Returns the number cancelled.
///
/// Used when a mailbox is deactivated; in-flight `sending` entries are left
/// for their dispatcher to finish.
pub async fn cancel_pending_for_mailbox(
    db: &Database,
    mailbox_id: MailboxId,
) -> Result<u32, EmbermailError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE send_entries SET status = 'skipped', error = 'mailbox deactivated'
                 WHERE mailbox_id = ?1 AND status = 'pending'",
                params![mailbox_id.0],
            )?;
            Ok(changed as u32)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count pending warmup entries scheduled within the calendar day of `day`.
///
/// Planner duplicate suppression: re-running the planner subtracts these
/// from the remaining quota.
pub async fn count_pending_today(
    db: &Database,
    mailbox_id: MailboxId,
    day: NaiveDateTime,
) -> Result<u32, EmbermailError> {
    let day_start = fmt_datetime(day.date().and_hms_opt(0, 0, 0).unwrap_or(day));
    let day_end = fmt_datetime(day.date().and_hms_opt(23, 59, 59).unwrap_or(day));
    db.connection()
        .call(move |conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM send_entries
                 WHERE mailbox_id = ?1 AND kind = 'warmup' AND status = 'pending'
                   AND scheduled_at >= ?2 AND scheduled_at <= ?3",
                params![mailbox_id.0, day_start, day_end],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Count entries sent by a mailbox within the clock hour containing `now`.
///
/// Campaign hourly rate limiting reads the sent audit trail rather than a
/// separate counter.
pub async fn sent_count_in_hour(
    db: &Database,
    mailbox_id: MailboxId,
    now: NaiveDateTime,
) -> Result<u32, EmbermailError> {
    let hour_start = fmt_datetime(
        now.with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(now),
    );
    let upper = fmt_datetime(now);
    db.connection()
        .call(move |conn| {
            let count: u32 = conn.query_row(
                "SELECT COUNT(*) FROM send_entries
                 WHERE mailbox_id = ?1 AND status = 'sent'
                   AND sent_at >= ?2 AND sent_at <= ?3",
                params![mailbox_id.0, hour_start, upper],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete terminal entries created before `cutoff`. Returns the number
/// removed. Pending and in-flight entries are never swept.
pub async fn delete_terminal_before(
    db: &Database,
    cutoff: NaiveDateTime,
) -> Result<u32, EmbermailError> {
    let cutoff = fmt_datetime(cutoff);
    db.connection()
        .call(move |conn| {
            let removed = conn.execute(
                "DELETE FROM send_entries
                 WHERE status IN ('sent', 'failed', 'skipped') AND created_at < ?1",
                params![cutoff],
            )?;
            Ok(removed as u32)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use embermail_core::types::{ImapCredentials, SmtpCredentials};
    use embermail_core::{EntryKind, EntryStatus};

    use crate::models::NewMailbox;
    use crate::queries::mailboxes;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    async fn insert_test_mailbox(db: &Database, email: &str) -> MailboxId {
        let mailbox = NewMailbox {
            email: email.to_string(),
            display_name: "Test Sender".to_string(),
            smtp: SmtpCredentials {
                host: "smtp.example.test".to_string(),
                port: 587,
                username: email.to_string(),
                password: "secret".to_string(),
            },
            imap: ImapCredentials {
                host: "imap.example.test".to_string(),
                port: 993,
                username: email.to_string(),
                password: "secret".to_string(),
            },
        };
        mailboxes::insert_mailbox(db, &mailbox).await.unwrap()
    }

    fn slot(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 16)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn warmup_entry(mailbox_id: MailboxId, scheduled_at: NaiveDateTime) -> NewSendEntry {
        NewSendEntry {
            mailbox_id,
            campaign_id: None,
            kind: EntryKind::Warmup,
            recipient: "peer@example.test".to_string(),
            subject: "Quick question".to_string(),
            body: "Hello".to_string(),
            scheduled_at,
            warmup_day: Some(1),
        }
    }

    #[tokio::test]
    async fn insert_batch_and_list_due_ordering() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        let b = insert_test_mailbox(&db, "b@example.test").await;

        // Same slot for both mailboxes plus a later and a not-yet-due slot.
        let count = insert_entries(
            &db,
            &[
                warmup_entry(b, slot(9, 0)),
                warmup_entry(a, slot(9, 0)),
                warmup_entry(a, slot(9, 30)),
                warmup_entry(a, slot(18, 0)),
            ],
        )
        .await
        .unwrap();
        assert_eq!(count, 4);

        let due = list_due(&db, slot(10, 0)).await.unwrap();
        assert_eq!(due.len(), 3);
        // Ties on scheduled_at break by mailbox ID.
        assert_eq!(due[0].mailbox_id, a);
        assert_eq!(due[1].mailbox_id, b);
        assert_eq!(due[2].scheduled_at, slot(9, 30));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn claim_is_compare_and_set() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        insert_entries(&db, &[warmup_entry(a, slot(9, 0))]).await.unwrap();

        let entry = &list_due(&db, slot(10, 0)).await.unwrap()[0];
        assert!(claim(&db, entry.id).await.unwrap());
        // Second claim loses.
        assert!(!claim(&db, entry.id).await.unwrap());

        let stored = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EntryStatus::Sending);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn commit_sent_updates_entry_and_mailbox_together() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        mailboxes::set_enrolled(&db, a, slot(0, 0).date(), 15)
            .await
            .unwrap();
        insert_entries(&db, &[warmup_entry(a, slot(9, 0))]).await.unwrap();

        let entry = &list_due(&db, slot(10, 0)).await.unwrap()[0];
        claim(&db, entry.id).await.unwrap();
        commit_sent(&db, entry.id, a, "<msg-1@example.test>", slot(9, 2), true)
            .await
            .unwrap();

        let stored = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EntryStatus::Sent);
        assert_eq!(stored.message_id.as_deref(), Some("<msg-1@example.test>"));
        assert_eq!(stored.sent_at, Some(slot(9, 2)));

        let mailbox = mailboxes::get_mailbox(&db, a).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_today_sent, 1);
        assert_eq!(mailbox.last_sent_at, Some(slot(9, 2)));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn mark_failed_is_terminal_and_keeps_counter() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        mailboxes::set_enrolled(&db, a, slot(0, 0).date(), 15)
            .await
            .unwrap();
        insert_entries(&db, &[warmup_entry(a, slot(9, 0))]).await.unwrap();

        let entry = &list_due(&db, slot(10, 0)).await.unwrap()[0];
        claim(&db, entry.id).await.unwrap();
        mark_failed(&db, entry.id, "550 relay denied").await.unwrap();

        let stored = get_entry(&db, entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EntryStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some("550 relay denied"));

        let mailbox = mailboxes::get_mailbox(&db, a).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_today_sent, 0);

        // A failed entry never comes back as due.
        assert!(list_due(&db, slot(23, 0)).await.unwrap().is_empty());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_pending_skips_only_pending() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        insert_entries(
            &db,
            &[warmup_entry(a, slot(9, 0)), warmup_entry(a, slot(9, 30))],
        )
        .await
        .unwrap();

        let first = &list_due(&db, slot(10, 0)).await.unwrap()[0];
        claim(&db, first.id).await.unwrap();

        let cancelled = cancel_pending_for_mailbox(&db, a).await.unwrap();
        assert_eq!(cancelled, 1);

        // The claimed entry is still in flight.
        let stored = get_entry(&db, first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, EntryStatus::Sending);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn count_pending_today_ignores_other_days_and_terminal_rows() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;

        let tomorrow = slot(9, 0) + chrono::Duration::days(1);
        insert_entries(
            &db,
            &[
                warmup_entry(a, slot(9, 0)),
                warmup_entry(a, slot(15, 0)),
                warmup_entry(a, tomorrow),
            ],
        )
        .await
        .unwrap();

        let first = &list_due(&db, slot(10, 0)).await.unwrap()[0];
        claim(&db, first.id).await.unwrap();
        mark_failed(&db, first.id, "boom").await.unwrap();

        let count = count_pending_today(&db, a, slot(12, 0)).await.unwrap();
        assert_eq!(count, 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn sent_count_in_hour_windows_on_the_clock_hour() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        insert_entries(
            &db,
            &[
                warmup_entry(a, slot(9, 0)),
                warmup_entry(a, slot(9, 30)),
                warmup_entry(a, slot(10, 5)),
            ],
        )
        .await
        .unwrap();

        let due = list_due(&db, slot(11, 0)).await.unwrap();
        for (entry, sent_at) in due.iter().zip([slot(9, 1), slot(9, 31), slot(10, 6)]) {
            claim(&db, entry.id).await.unwrap();
            commit_sent(&db, entry.id, a, "<m@example.test>", sent_at, false)
                .await
                .unwrap();
        }

        assert_eq!(sent_count_in_hour(&db, a, slot(9, 45)).await.unwrap(), 2);
        assert_eq!(sent_count_in_hour(&db, a, slot(10, 30)).await.unwrap(), 1);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn retention_sweep_spares_pending_entries() {
        let (db, _dir) = setup_db().await;
        let a = insert_test_mailbox(&db, "a@example.test").await;
        insert_entries(
            &db,
            &[warmup_entry(a, slot(9, 0)), warmup_entry(a, slot(9, 30))],
        )
        .await
        .unwrap();

        let first = &list_due(&db, slot(10, 0)).await.unwrap()[0];
        claim(&db, first.id).await.unwrap();
        commit_sent(&db, first.id, a, "<m@example.test>", slot(9, 1), false)
            .await
            .unwrap();

        // Cutoff far in the future: everything terminal is old enough.
        let cutoff = slot(0, 0) + chrono::Duration::days(365);
        let removed = delete_terminal_before(&db, cutoff).await.unwrap();
        assert_eq!(removed, 1);

        // The pending entry survived.
        assert_eq!(list_due(&db, slot(23, 0)).await.unwrap().len(), 1);

        db.close().await.unwrap();
    }
}
