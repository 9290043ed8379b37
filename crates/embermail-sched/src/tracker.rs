// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warmup quota tracker: daily day/limit progression and administrative
//! transitions.

use std::sync::Arc;

use chrono::NaiveDate;
use embermail_core::{Clock, EmbermailError, WarmupStatus};
use embermail_storage::models::Mailbox;
use embermail_storage::queries::{entries, mailboxes};
use embermail_storage::Database;
use tracing::{info, warn};

use crate::ramp::RampCurve;

/// Outcome tally of one advance pass.
///
/// `advanced` counts every mailbox whose warmup state changed, including
/// those that graduated; `completed` counts the graduations. Per-mailbox
/// store errors land in `errors` and never abort the pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AdvanceReport {
    pub advanced: u32,
    pub completed: u32,
    pub errors: Vec<String>,
}

/// Drives warmup day progression and enroll/deactivate transitions.
pub struct QuotaTracker {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    curve: RampCurve,
    silent_days: u32,
}

impl QuotaTracker {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, curve: RampCurve, silent_days: u32) -> Self {
        Self {
            db,
            clock,
            curve,
            silent_days,
        }
    }

    /// Advance every warming mailbox to today's warmup day.
    ///
    /// Idempotent within a calendar day: a mailbox already advanced today is
    /// left untouched. Mailboxes past the curve's final day graduate to
    /// `completed` with the curve's terminal daily limit.
    pub async fn advance_warmup_days(&self) -> Result<AdvanceReport, EmbermailError> {
        let today = self.clock.today();
        let warming = mailboxes::list_by_status(&self.db, WarmupStatus::Warming).await?;

        let mut report = AdvanceReport::default();
        for mailbox in warming {
            match self.advance_one(&mailbox, today).await {
                Ok(Some(completed)) => {
                    report.advanced += 1;
                    if completed {
                        report.completed += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(mailbox = %mailbox.email, error = %e, "warmup advance failed");
                    report.errors.push(format!("{}: {e}", mailbox.email));
                }
            }
        }

        info!(
            advanced = report.advanced,
            completed = report.completed,
            errors = report.errors.len(),
            "warmup advance pass finished"
        );
        Ok(report)
    }

    /// Advance a single mailbox. Returns `Some(graduated)` when the state
    /// changed, `None` when the day guard rejected the roll.
    async fn advance_one(
        &self,
        mailbox: &Mailbox,
        today: NaiveDate,
    ) -> Result<Option<bool>, EmbermailError> {
        // Self-heal counters left above the limit by a crash mid-commit.
        if mailboxes::clamp_today_sent(&self.db, mailbox.id).await? {
            warn!(mailbox = %mailbox.email, "clamped over-limit warmup counter");
        }

        let last = mailbox
            .warmup_last_advanced_on
            .or(mailbox.warmup_started_on);
        let elapsed = match last {
            Some(last) if last < today => (today - last).num_days() as u32,
            Some(_) => return Ok(None),
            // No guard date on record: treat as one day elapsed.
            None => 1,
        };

        let new_day = mailbox.warmup_day + elapsed;
        if new_day > self.curve.final_day() {
            let changed = mailboxes::set_completed(
                &self.db,
                mailbox.id,
                self.curve.terminal_limit(),
                today,
            )
            .await?;
            if changed {
                info!(mailbox = %mailbox.email, "warmup completed");
            }
            return Ok(changed.then_some(true));
        }

        let phase = if new_day > self.silent_days {
            "active"
        } else {
            "silent"
        };
        let limit = self.curve.limit(new_day);
        let changed =
            mailboxes::apply_advance(&self.db, mailbox.id, new_day, phase, limit, today).await?;
        if changed {
            info!(
                mailbox = %mailbox.email,
                day = new_day,
                limit,
                phase,
                "warmup day advanced"
            );
        }
        Ok(changed.then_some(false))
    }

    /// Enroll an inactive mailbox into warmup at day 1.
    pub async fn enroll(&self, email: &str) -> Result<(), EmbermailError> {
        let mailbox = mailboxes::get_mailbox_by_email(&self.db, email)
            .await?
            .ok_or_else(|| EmbermailError::MailboxNotFound(email.to_string()))?;

        if mailbox.warmup_status != WarmupStatus::Inactive {
            return Err(EmbermailError::InvalidTransition {
                from: mailbox.warmup_status,
                to: WarmupStatus::Warming,
            });
        }

        let enrolled = mailboxes::set_enrolled(
            &self.db,
            mailbox.id,
            self.clock.today(),
            self.curve.limit(1),
        )
        .await?;
        if !enrolled {
            // Lost a race with another admin action since the read above.
            return Err(EmbermailError::InvalidTransition {
                from: mailbox.warmup_status,
                to: WarmupStatus::Warming,
            });
        }

        info!(mailbox = %email, limit = self.curve.limit(1), "mailbox enrolled into warmup");
        Ok(())
    }

    /// Deactivate a warming or completed mailbox and cancel its pending
    /// entries. Returns the number of entries cancelled.
    pub async fn deactivate(&self, email: &str) -> Result<u32, EmbermailError> {
        let mailbox = mailboxes::get_mailbox_by_email(&self.db, email)
            .await?
            .ok_or_else(|| EmbermailError::MailboxNotFound(email.to_string()))?;

        if mailbox.warmup_status == WarmupStatus::Inactive {
            return Err(EmbermailError::InvalidTransition {
                from: mailbox.warmup_status,
                to: WarmupStatus::Inactive,
            });
        }

        if !mailboxes::set_deactivated(&self.db, mailbox.id).await? {
            return Err(EmbermailError::InvalidTransition {
                from: mailbox.warmup_status,
                to: WarmupStatus::Inactive,
            });
        }

        let cancelled = entries::cancel_pending_for_mailbox(&self.db, mailbox.id).await?;
        info!(mailbox = %email, cancelled, "mailbox deactivated");
        Ok(cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use embermail_core::types::{ImapCredentials, SmtpCredentials};
    use embermail_core::{EntryKind, WarmupPhase};
    use embermail_storage::models::{NewMailbox, NewSendEntry};
    use embermail_test_utils::FixedClock;
    use tempfile::tempdir;

    fn base_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
    }

    async fn setup() -> (Arc<Database>, Arc<FixedClock>, QuotaTracker, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Arc::new(Database::open(db_path.to_str().unwrap(), true).await.unwrap());
        let clock = Arc::new(FixedClock::at(base_day().and_hms_opt(0, 5, 0).unwrap()));
        let tracker = QuotaTracker::new(
            db.clone(),
            clock.clone(),
            RampCurve::new(30, vec![15, 25, 35, 50, 75], 100),
            7,
        );
        (db, clock, tracker, dir)
    }

    async fn add_mailbox(db: &Database, email: &str) -> embermail_core::MailboxId {
        let mailbox = NewMailbox {
            email: email.to_string(),
            display_name: "Test".to_string(),
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

    #[tokio::test]
    async fn enroll_starts_day_one_silent() {
        let (db, _clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;

        tracker.enroll("a@example.test").await.unwrap();

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_status, WarmupStatus::Warming);
        assert_eq!(mailbox.warmup_day, 1);
        assert_eq!(mailbox.warmup_phase, WarmupPhase::Silent);
        assert_eq!(mailbox.warmup_daily_limit, 15);

        // Enrolling a warming mailbox is an invalid transition.
        let err = tracker.enroll("a@example.test").await.unwrap_err();
        assert!(matches!(err, EmbermailError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn enroll_unknown_mailbox_fails() {
        let (_db, _clock, tracker, _dir) = setup().await;
        let err = tracker.enroll("nobody@example.test").await.unwrap_err();
        assert!(matches!(err, EmbermailError::MailboxNotFound(_)));
    }

    #[tokio::test]
    async fn advance_resets_counter_and_recomputes_limit() {
        let (db, clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;
        tracker.enroll("a@example.test").await.unwrap();

        // Simulate sends on day 1.
        let noon = base_day().and_hms_opt(12, 0, 0).unwrap();
        for _ in 0..5 {
            mailboxes::record_send_success(&db, id, noon, true).await.unwrap();
        }

        clock.advance(Duration::days(1));
        let report = tracker.advance_warmup_days().await.unwrap();
        assert_eq!(report.advanced, 1);
        assert_eq!(report.completed, 0);
        assert!(report.errors.is_empty());

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_day, 2);
        assert_eq!(mailbox.warmup_today_sent, 0);
        assert_eq!(mailbox.warmup_daily_limit, 15);
    }

    #[tokio::test]
    async fn advance_twice_same_day_is_a_noop() {
        let (db, clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;
        tracker.enroll("a@example.test").await.unwrap();

        clock.advance(Duration::days(1));
        let first = tracker.advance_warmup_days().await.unwrap();
        assert_eq!(first.advanced, 1);

        let second = tracker.advance_warmup_days().await.unwrap();
        assert_eq!(second.advanced, 0);
        assert_eq!(second.completed, 0);

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_day, 2);
    }

    #[tokio::test]
    async fn advance_catches_up_missed_days() {
        let (db, clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;
        tracker.enroll("a@example.test").await.unwrap();

        // The advance job was down for three days.
        clock.advance(Duration::days(3));
        tracker.advance_warmup_days().await.unwrap();

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_day, 4);
    }

    #[tokio::test]
    async fn crossing_week_boundary_raises_the_limit_and_phase() {
        let (db, clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;
        tracker.enroll("a@example.test").await.unwrap();

        // Day 1 + 7 elapsed days = day 8: second week, past the silent phase.
        clock.advance(Duration::days(7));
        tracker.advance_warmup_days().await.unwrap();

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_day, 8);
        assert_eq!(mailbox.warmup_daily_limit, 25);
        assert_eq!(mailbox.warmup_phase, WarmupPhase::Active);
    }

    #[tokio::test]
    async fn advancing_past_final_day_completes_warmup() {
        let (db, clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;
        tracker.enroll("a@example.test").await.unwrap();

        clock.advance(Duration::days(30));
        let report = tracker.advance_warmup_days().await.unwrap();
        assert_eq!(report.advanced, 1);
        assert_eq!(report.completed, 1);

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_status, WarmupStatus::Completed);
        assert_eq!(mailbox.daily_email_limit, 100);

        // Completed mailboxes are out of the advance loop.
        clock.advance(Duration::days(1));
        let later = tracker.advance_warmup_days().await.unwrap();
        assert_eq!(later.advanced, 0);
    }

    #[tokio::test]
    async fn deactivate_cancels_pending_entries() {
        let (db, _clock, tracker, _dir) = setup().await;
        let id = add_mailbox(&db, "a@example.test").await;
        tracker.enroll("a@example.test").await.unwrap();

        let slot = base_day().and_hms_opt(10, 0, 0).unwrap();
        entries::insert_entries(
            &db,
            &[NewSendEntry {
                mailbox_id: id,
                campaign_id: None,
                kind: EntryKind::Warmup,
                recipient: "peer@example.test".to_string(),
                subject: "hi".to_string(),
                body: "hello".to_string(),
                scheduled_at: slot,
                warmup_day: Some(1),
            }],
        )
        .await
        .unwrap();

        let cancelled = tracker.deactivate("a@example.test").await.unwrap();
        assert_eq!(cancelled, 1);

        let mailbox = mailboxes::get_mailbox(&db, id).await.unwrap().unwrap();
        assert_eq!(mailbox.warmup_status, WarmupStatus::Inactive);

        // Deactivating again is an invalid transition.
        let err = tracker.deactivate("a@example.test").await.unwrap_err();
        assert!(matches!(err, EmbermailError::InvalidTransition { .. }));
    }
}
