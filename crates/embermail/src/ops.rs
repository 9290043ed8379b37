// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot administrative commands and shared component wiring.
//!
//! `App` holds the live wiring (real clock, real transport) that `serve`
//! and each one-shot command build their components from.

use std::sync::Arc;

use embermail_config::model::EmbermailConfig;
use embermail_core::{Clock, EmbermailError, HolidaySource, MailTransport, SystemClock};
use embermail_sched::{
    DailyPlanner, DispatchEngine, DispatchOutcome, HolidayCache, NoHolidays, QuotaTracker,
    RampCurve, ReputationMonitor,
};
use embermail_storage::Database;
use embermail_transport::LiveTransport;
use tokio_util::sync::CancellationToken;

pub struct App {
    pub config: EmbermailConfig,
    pub db: Arc<Database>,
    pub clock: Arc<dyn Clock>,
    pub transport: Arc<dyn MailTransport + Send + Sync>,
}

impl App {
    pub async fn open(config: EmbermailConfig) -> Result<Self, EmbermailError> {
        let db = Arc::new(
            Database::open(&config.storage.database_path, config.storage.wal_mode).await?,
        );
        Ok(Self {
            config,
            db,
            clock: Arc::new(SystemClock),
            transport: Arc::new(LiveTransport::new()),
        })
    }

    pub fn tracker(&self) -> QuotaTracker {
        QuotaTracker::new(
            self.db.clone(),
            self.clock.clone(),
            RampCurve::from_config(&self.config.warmup),
            self.config.warmup.silent_days,
        )
    }

    pub fn planner(&self) -> DailyPlanner {
        DailyPlanner::new(self.db.clone(), self.clock.clone(), self.config.timing.clone())
    }

    pub fn engine(&self) -> DispatchEngine {
        let holidays: Arc<dyn HolidaySource + Send + Sync> = if self.config.holidays.enabled {
            Arc::new(HolidayCache::new(self.db.clone()))
        } else {
            Arc::new(NoHolidays)
        };
        DispatchEngine::new(
            self.db.clone(),
            self.transport.clone(),
            holidays,
            self.clock.clone(),
            self.config.timing.clone(),
            self.config.holidays.countries.clone(),
            self.config.dispatch.max_batch,
        )
    }

    pub fn monitor(&self) -> ReputationMonitor {
        ReputationMonitor::new(self.db.clone(), self.transport.clone())
    }
}

pub async fn run_advance(config: EmbermailConfig) -> Result<(), EmbermailError> {
    let app = App::open(config).await?;
    let report = app.tracker().advance_warmup_days().await?;
    println!(
        "advanced {} mailboxes ({} completed warmup)",
        report.advanced, report.completed
    );
    for error in &report.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

pub async fn run_plan(config: EmbermailConfig) -> Result<(), EmbermailError> {
    let app = App::open(config).await?;
    let report = app.planner().schedule_daily_emails_for_all().await?;
    println!(
        "planned {} warmup emails across {} mailboxes",
        report.total, report.mailboxes
    );
    for error in &report.errors {
        eprintln!("warning: {error}");
    }
    Ok(())
}

pub async fn run_dispatch(config: EmbermailConfig, one: bool) -> Result<(), EmbermailError> {
    let app = App::open(config).await?;
    let engine = app.engine();

    if one {
        match engine.send_next_scheduled_email().await? {
            DispatchOutcome::Sent { .. } => println!("sent 1 email"),
            DispatchOutcome::Failed { error, .. } => {
                println!("send attempted and failed: {error}")
            }
            DispatchOutcome::Idle => println!("nothing to send"),
        }
        return Ok(());
    }

    let report = engine.send_scheduled_emails(&CancellationToken::new()).await?;
    println!(
        "sent {}, failed {}, {} still gated",
        report.sent, report.failed, report.skipped
    );
    Ok(())
}

pub async fn run_enroll(config: EmbermailConfig, email: &str) -> Result<(), EmbermailError> {
    let app = App::open(config).await?;
    app.tracker().enroll(email).await?;
    println!("{email} enrolled in warmup (day 1)");
    Ok(())
}

pub async fn run_stop(config: EmbermailConfig, email: &str) -> Result<(), EmbermailError> {
    let app = App::open(config).await?;
    let cancelled = app.tracker().deactivate(email).await?;
    println!("{email} warmup stopped, {cancelled} pending entries cancelled");
    Ok(())
}

pub async fn run_check_spam(config: EmbermailConfig, email: &str) -> Result<(), EmbermailError> {
    let app = App::open(config).await?;
    let report = app.monitor().check_spam_folder(email).await?;

    println!(
        "{email}: {} messages in spam, {} from warmup peers",
        report.messages.len(),
        report.warmup_hits
    );
    for message in &report.messages {
        println!("  {} - {}", message.from, message.subject);
    }
    Ok(())
}
