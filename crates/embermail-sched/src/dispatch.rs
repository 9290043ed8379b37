// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate-controlled dispatch engine.
//!
//! Walks the due pending entries in slot order, gates each against its
//! sending window and quota, claims the first eligible one with a
//! compare-and-set, and hands it to the transport. Counters only move on a
//! successful send; a failed entry is terminal.

use std::sync::Arc;

use chrono::Duration;
use embermail_config::model::TimingConfig;
use embermail_core::types::OutboundEmail;
use embermail_core::{
    Clock, EmbermailError, EntryId, EntryKind, HolidaySource, MailTransport, WarmupStatus,
};
use embermail_storage::models::{Mailbox, SendEntry};
use embermail_storage::queries::{campaigns, entries, mailboxes};
use embermail_storage::Database;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::window::{WindowGate, WindowSchedule};

/// Result of a single dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// One email was delivered and committed.
    Sent { entry: EntryId },
    /// The claimed entry's send failed; the entry is now terminal.
    Failed { entry: EntryId, error: String },
    /// No due entry passed its gates.
    Idle,
}

impl DispatchOutcome {
    /// Whether an entry was consumed by a transport attempt. True for both
    /// `Sent` and `Failed`; a failed attempt still spent its entry.
    pub fn mail_sent(&self) -> bool {
        matches!(
            self,
            DispatchOutcome::Sent { .. } | DispatchOutcome::Failed { .. }
        )
    }
}

/// Tally of a batch drain.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub sent: u32,
    pub failed: u32,
    /// Due pending entries whose gates rejected them when the drain went
    /// idle. Zero when the drain stopped at the batch bound or on
    /// cancellation, since entries left at that point were never evaluated.
    pub skipped: u32,
}

/// Sends due entries one at a time through the mail transport.
pub struct DispatchEngine {
    db: Arc<Database>,
    transport: Arc<dyn MailTransport + Send + Sync>,
    holidays: Arc<dyn HolidaySource + Send + Sync>,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
    holiday_countries: Vec<String>,
    max_batch: u32,
}

impl DispatchEngine {
    pub fn new(
        db: Arc<Database>,
        transport: Arc<dyn MailTransport + Send + Sync>,
        holidays: Arc<dyn HolidaySource + Send + Sync>,
        clock: Arc<dyn Clock>,
        timing: TimingConfig,
        holiday_countries: Vec<String>,
        max_batch: u32,
    ) -> Self {
        Self {
            db,
            transport,
            holidays,
            clock,
            timing,
            holiday_countries,
            max_batch,
        }
    }

    /// Send the single highest-priority eligible entry, if any.
    ///
    /// Due entries are visited in slot order (ties broken by mailbox ID);
    /// the first one whose gates pass is claimed. A lost claim means
    /// another dispatcher took it, which counts as no eligible work here.
    pub async fn send_next_scheduled_email(&self) -> Result<DispatchOutcome, EmbermailError> {
        let now = self.clock.now();
        let cutoff = now + Duration::minutes(self.timing.tolerance_minutes as i64);
        let due = entries::list_due(&self.db, cutoff).await?;
        let gate = WindowGate::new(self.holidays.as_ref());

        for entry in due {
            let Some(mailbox) = mailboxes::get_mailbox(&self.db, entry.mailbox_id).await? else {
                entries::mark_skipped(&self.db, entry.id, "mailbox missing").await?;
                continue;
            };
            if !mailbox.is_active {
                entries::mark_skipped(&self.db, entry.id, "mailbox inactive").await?;
                continue;
            }

            if !self.entry_is_eligible(&entry, &mailbox, &gate).await? {
                continue;
            }

            if !entries::claim(&self.db, entry.id).await? {
                // Lost the claim race; the winner is sending it.
                debug!(entry = entry.id.0, "claim lost");
                continue;
            }

            return self.send_claimed(&entry, &mailbox).await;
        }

        Ok(DispatchOutcome::Idle)
    }

    /// Gate checks for a due entry. A `false` leaves the entry pending for a
    /// later tick; hard-stale entries are marked skipped inside.
    async fn entry_is_eligible(
        &self,
        entry: &SendEntry,
        mailbox: &Mailbox,
        gate: &WindowGate<'_>,
    ) -> Result<bool, EmbermailError> {
        let now = self.clock.now();
        match entry.kind {
            EntryKind::Warmup => {
                if mailbox.warmup_status != WarmupStatus::Warming {
                    entries::mark_skipped(&self.db, entry.id, "mailbox no longer warming").await?;
                    return Ok(false);
                }
                if mailbox.warmup_today_sent >= mailbox.warmup_daily_limit {
                    return Ok(false);
                }
                let schedule = WindowSchedule::from_timing(&self.timing, &self.holiday_countries);
                gate.is_open(&schedule, now).await
            }
            EntryKind::Campaign => {
                let Some(campaign_id) = entry.campaign_id else {
                    entries::mark_skipped(&self.db, entry.id, "campaign reference missing").await?;
                    return Ok(false);
                };
                let Some(campaign) = campaigns::get_campaign(&self.db, campaign_id).await? else {
                    entries::mark_skipped(&self.db, entry.id, "campaign deleted").await?;
                    return Ok(false);
                };

                let schedule = WindowSchedule::from_campaign(&campaign);
                if !gate.is_open(&schedule, now).await? {
                    return Ok(false);
                }

                let sent_this_hour =
                    entries::sent_count_in_hour(&self.db, mailbox.id, now).await?;
                if sent_this_hour >= campaign.max_emails_per_hour {
                    return Ok(false);
                }

                if let Some(last_sent) = mailbox.last_sent_at {
                    let min_gap = Duration::seconds(campaign.delay_between_secs as i64);
                    if now - last_sent < min_gap {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Deliver a claimed entry and commit the result.
    async fn send_claimed(
        &self,
        entry: &SendEntry,
        mailbox: &Mailbox,
    ) -> Result<DispatchOutcome, EmbermailError> {
        let email = OutboundEmail {
            from: mailbox.email.clone(),
            to: entry.recipient.clone(),
            subject: entry.subject.clone(),
            body: entry.body.clone(),
        };

        match self.transport.send_email(&mailbox.smtp, &email).await {
            Ok(receipt) => {
                let sent_at = self.clock.now();
                entries::commit_sent(
                    &self.db,
                    entry.id,
                    mailbox.id,
                    &receipt.message_id,
                    sent_at,
                    entry.kind == EntryKind::Warmup,
                )
                .await?;
                info!(
                    entry = entry.id.0,
                    mailbox = %mailbox.email,
                    to = %entry.recipient,
                    "email sent"
                );
                Ok(DispatchOutcome::Sent { entry: entry.id })
            }
            Err(e) => {
                let error = e.to_string();
                entries::mark_failed(&self.db, entry.id, &error).await?;
                warn!(
                    entry = entry.id.0,
                    mailbox = %mailbox.email,
                    error = %error,
                    "email send failed"
                );
                Ok(DispatchOutcome::Failed {
                    entry: entry.id,
                    error,
                })
            }
        }
    }

    /// Drain eligible entries, up to `dispatch.max_batch` sends per call.
    ///
    /// The cancellation token is checked between iterations, never mid-send;
    /// an in-flight delivery always runs to completion. `skipped` counts
    /// gated entries only when the drain went idle: an idle pass has just
    /// evaluated and rejected every remaining due entry, whereas a
    /// batch-bound or cancelled stop leaves their eligibility unknown.
    pub async fn send_scheduled_emails(
        &self,
        cancel: &CancellationToken,
    ) -> Result<DrainReport, EmbermailError> {
        let mut report = DrainReport::default();
        let mut went_idle = false;

        for _ in 0..self.max_batch {
            if cancel.is_cancelled() {
                break;
            }
            match self.send_next_scheduled_email().await? {
                DispatchOutcome::Sent { .. } => report.sent += 1,
                DispatchOutcome::Failed { .. } => report.failed += 1,
                DispatchOutcome::Idle => {
                    went_idle = true;
                    break;
                }
            }
        }

        if went_idle {
            let now = self.clock.now();
            let cutoff = now + Duration::minutes(self.timing.tolerance_minutes as i64);
            report.skipped = entries::list_due(&self.db, cutoff).await?.len() as u32;
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "dispatch drain finished"
        );
        Ok(report)
    }
}
