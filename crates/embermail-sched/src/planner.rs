// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily warmup planner.
//!
//! Materializes each warming mailbox's remaining daily quota as pending send
//! entries addressed to randomly chosen peer mailboxes, with slot times
//! jittered across the configured sending window. Warmup traffic is strictly
//! internal: peers are the other active mailboxes in the pool.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use embermail_config::model::TimingConfig;
use embermail_core::{Clock, EmbermailError, EntryKind, WarmupStatus};
use embermail_storage::models::{Mailbox, NewSendEntry};
use embermail_storage::queries::{entries, mailboxes};
use embermail_storage::Database;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, warn};

/// Tally of one planning pass.
///
/// Per-mailbox store errors land in `errors` and never abort the pass; the
/// remaining mailboxes are still planned.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanReport {
    /// Entries created across all mailboxes.
    pub total: u32,
    /// Mailboxes that received at least one new entry.
    pub mailboxes: u32,
    pub errors: Vec<String>,
}

/// Rotating warmup conversation templates.
///
/// `{{date}}` and `{{senderName}}` are substituted at planning time. Bodies
/// are deliberately mundane; warmup traffic should read like routine
/// correspondence.
const WARMUP_TEMPLATES: &[(&str, &str)] = &[
    (
        "Quick check-in",
        "Hi,\n\nJust checking in on {{date}}. Everything running smoothly on \
         your side?\n\nBest,\n{{senderName}}",
    ),
    (
        "Notes from today",
        "Hello,\n\nSharing a few notes from {{date}}. Nothing urgent, will \
         follow up later in the week.\n\nRegards,\n{{senderName}}",
    ),
    (
        "Following up",
        "Hi there,\n\nFollowing up on our earlier thread. Does {{date}} still \
         work for you?\n\nThanks,\n{{senderName}}",
    ),
    (
        "Short status update",
        "Hi,\n\nShort status update as of {{date}}: all items on track. Let \
         me know if anything needs attention.\n\nCheers,\n{{senderName}}",
    ),
    (
        "Question about scheduling",
        "Hello,\n\nQuick question about scheduling around {{date}}. Is your \
         calendar up to date?\n\nBest regards,\n{{senderName}}",
    ),
];

fn render_template(template: &str, date: NaiveDate, sender_name: &str) -> String {
    template
        .replace("{{date}}", &date.format("%Y-%m-%d").to_string())
        .replace("{{senderName}}", sender_name)
}

/// Plans the day's warmup entries for all warming mailboxes.
pub struct DailyPlanner {
    db: Arc<Database>,
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
}

impl DailyPlanner {
    pub fn new(db: Arc<Database>, clock: Arc<dyn Clock>, timing: TimingConfig) -> Self {
        Self { db, clock, timing }
    }

    /// Create today's remaining warmup entries for every warming mailbox.
    ///
    /// `remaining = warmup_daily_limit - warmup_today_sent - pending entries
    /// already scheduled today`, so re-running the planner adds nothing.
    /// Mailboxes without peers are skipped with a warning.
    pub async fn schedule_daily_emails_for_all(&self) -> Result<PlanReport, EmbermailError> {
        let now = self.clock.now();
        let warming = mailboxes::list_by_status(&self.db, WarmupStatus::Warming).await?;
        let active = mailboxes::list_active(&self.db).await?;

        let mut report = PlanReport::default();
        for mailbox in &warming {
            match self.schedule_for_mailbox(mailbox, &active, now).await {
                Ok(created) if created > 0 => {
                    report.total += created;
                    report.mailboxes += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(mailbox = %mailbox.email, error = %e, "warmup planning failed");
                    report.errors.push(format!("{}: {e}", mailbox.email));
                }
            }
        }

        info!(
            total = report.total,
            mailboxes = report.mailboxes,
            errors = report.errors.len(),
            "daily warmup planning finished"
        );
        Ok(report)
    }

    async fn schedule_for_mailbox(
        &self,
        mailbox: &Mailbox,
        active: &[Mailbox],
        now: NaiveDateTime,
    ) -> Result<u32, EmbermailError> {
        let pending = entries::count_pending_today(&self.db, mailbox.id, now).await?;
        let remaining = mailbox
            .warmup_daily_limit
            .saturating_sub(mailbox.warmup_today_sent)
            .saturating_sub(pending);
        if remaining == 0 {
            debug!(mailbox = %mailbox.email, "warmup quota already covered");
            return Ok(0);
        }

        let peers: Vec<&Mailbox> = active.iter().filter(|m| m.id != mailbox.id).collect();
        if peers.is_empty() {
            warn!(mailbox = %mailbox.email, "no peer mailboxes, skipping warmup planning");
            return Ok(0);
        }

        let new_entries = {
            let mut rng = rand::thread_rng();
            let slots = plan_slots(now.date(), remaining, &self.timing, &mut rng);

            let mut new_entries = Vec::with_capacity(slots.len());
            for (i, slot) in slots.iter().enumerate() {
                let peer = peers
                    .choose(&mut rng)
                    .ok_or_else(|| EmbermailError::Internal("peer pool drained".to_string()))?;
                let (subject, body) = WARMUP_TEMPLATES[i % WARMUP_TEMPLATES.len()];
                new_entries.push(NewSendEntry {
                    mailbox_id: mailbox.id,
                    campaign_id: None,
                    kind: EntryKind::Warmup,
                    recipient: peer.email.clone(),
                    subject: subject.to_string(),
                    body: render_template(body, now.date(), &mailbox.display_name),
                    scheduled_at: *slot,
                    warmup_day: Some(mailbox.warmup_day),
                });
            }
            new_entries
        };

        let created = entries::insert_entries(&self.db, &new_entries).await?;
        debug!(
            mailbox = %mailbox.email,
            created,
            requested = remaining,
            "warmup entries planned"
        );
        Ok(created)
    }
}

/// Spread up to `count` slots across the sending window.
///
/// The first slot starts a random few minutes after the window opens;
/// subsequent slots follow at random 10-30 minute spacing (per config).
/// Planning stops early if the window runs out, so a tight window can yield
/// fewer slots than requested.
fn plan_slots(
    day: NaiveDate,
    count: u32,
    timing: &TimingConfig,
    rng: &mut impl Rng,
) -> Vec<NaiveDateTime> {
    let Some(start) = NaiveTime::from_hms_opt(timing.start_hour, timing.start_minute, 0) else {
        return Vec::new();
    };
    let Some(end) = NaiveTime::from_hms_opt(timing.end_hour, timing.end_minute, 0) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    let window_end = day.and_time(end);
    let jitter = rng.gen_range(0..=timing.start_jitter_minutes.max(1) as i64);
    let mut slot = day.and_time(start) + Duration::minutes(jitter);

    let mut slots = Vec::new();
    while slots.len() < count as usize && slot < window_end {
        slots.push(slot);
        let gap = rng.gen_range(
            timing.min_delay_minutes as i64..=timing.max_delay_minutes.max(timing.min_delay_minutes) as i64,
        );
        slot += Duration::minutes(gap);
    }
    slots
}
