// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `embermail serve` command implementation.
//!
//! Starts the warmup daemon: opens storage, installs signal handlers and
//! spawns one cron loop per scheduled job (advance, plan, dispatch, entry
//! retention sweep, holiday refresh). Each loop sleeps until its next cron
//! occurrence, runs the job, and exits on cancellation.

use std::future::Future;
use std::sync::Arc;

use chrono::{Duration, Local};
use croner::parser::{CronParser, Seconds};
use embermail_config::model::EmbermailConfig;
use embermail_core::EmbermailError;
use embermail_sched::holidays::{self, HolidayFetcher};
use embermail_storage::queries::entries;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ops::App;
use crate::shutdown;

/// Runs the `embermail serve` command.
pub async fn run_serve(config: EmbermailConfig) -> Result<(), EmbermailError> {
    init_tracing(&config.daemon.log_level);

    info!("starting embermail serve");

    let app = App::open(config).await?;
    let config = app.config.clone();
    let db = app.db.clone();

    // Prime the holiday cache before the first dispatch tick.
    let fetcher = if config.holidays.enabled {
        let fetcher = Arc::new(HolidayFetcher::new(&config.holidays.api_base_url));
        match holidays::refresh(
            &db,
            &fetcher,
            &config.holidays.countries,
            Local::now().date_naive(),
        )
        .await
        {
            Ok(inserted) => info!(inserted, "holiday cache primed"),
            Err(e) => warn!(error = %e, "initial holiday refresh failed, retrying on schedule"),
        }
        Some(fetcher)
    } else {
        info!("holiday calendar disabled by configuration");
        None
    };

    let cancel = shutdown::install_signal_handler();
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    // Daily warmup-day advance.
    {
        let tracker = Arc::new(app.tracker());
        handles.push(spawn_cron_job(
            "advance",
            &config.daemon.advance_cron,
            cancel.clone(),
            move || {
                let tracker = tracker.clone();
                async move {
                    match tracker.advance_warmup_days().await {
                        Ok(report) => info!(
                            advanced = report.advanced,
                            completed = report.completed,
                            "warmup advance finished"
                        ),
                        Err(e) => error!(error = %e, "warmup advance failed"),
                    }
                }
            },
        )?);
    }

    // Daily planning.
    {
        let planner = Arc::new(app.planner());
        handles.push(spawn_cron_job(
            "plan",
            &config.daemon.plan_cron,
            cancel.clone(),
            move || {
                let planner = planner.clone();
                async move {
                    match planner.schedule_daily_emails_for_all().await {
                        Ok(report) => info!(
                            total = report.total,
                            mailboxes = report.mailboxes,
                            errors = report.errors.len(),
                            "daily planning finished"
                        ),
                        Err(e) => error!(error = %e, "daily planning failed"),
                    }
                }
            },
        )?);
    }

    // Dispatch drain.
    {
        let engine = Arc::new(app.engine());
        let drain_cancel = cancel.clone();
        handles.push(spawn_cron_job(
            "dispatch",
            &config.daemon.dispatch_cron,
            cancel.clone(),
            move || {
                let engine = engine.clone();
                let drain_cancel = drain_cancel.clone();
                async move {
                    match engine.send_scheduled_emails(&drain_cancel).await {
                        Ok(report) if report.sent > 0 || report.failed > 0 => info!(
                            sent = report.sent,
                            failed = report.failed,
                            gated = report.skipped,
                            "dispatch drain finished"
                        ),
                        Ok(report) => debug!(gated = report.skipped, "dispatch drain idle"),
                        Err(e) => error!(error = %e, "dispatch drain failed"),
                    }
                }
            },
        )?);
    }

    // Retention sweep for terminal entries.
    {
        let sweep_db = db.clone();
        let retention_days = config.daemon.retention_days;
        handles.push(spawn_cron_job(
            "cleanup",
            &config.daemon.cleanup_cron,
            cancel.clone(),
            move || {
                let sweep_db = sweep_db.clone();
                async move {
                    let cutoff =
                        Local::now().naive_local() - Duration::days(i64::from(retention_days));
                    match entries::delete_terminal_before(&sweep_db, cutoff).await {
                        Ok(deleted) if deleted > 0 => {
                            info!(deleted, "retention sweep finished")
                        }
                        Ok(_) => debug!("retention sweep found nothing to delete"),
                        Err(e) => error!(error = %e, "retention sweep failed"),
                    }
                }
            },
        )?);
    }

    // Holiday cache refresh.
    if let Some(fetcher) = fetcher {
        let refresh_db = db.clone();
        let countries = config.holidays.countries.clone();
        handles.push(spawn_cron_job(
            "holidays",
            &config.daemon.holidays_cron,
            cancel.clone(),
            move || {
                let refresh_db = refresh_db.clone();
                let fetcher = fetcher.clone();
                let countries = countries.clone();
                async move {
                    match holidays::refresh(
                        &refresh_db,
                        &fetcher,
                        &countries,
                        Local::now().date_naive(),
                    )
                    .await
                    {
                        Ok(inserted) if inserted > 0 => {
                            info!(inserted, "holiday cache refreshed")
                        }
                        Ok(_) => debug!("holiday cache already current"),
                        Err(e) => error!(error = %e, "holiday refresh failed"),
                    }
                }
            },
        )?);
    }

    info!(jobs = handles.len(), "embermail daemon running");

    for handle in handles {
        let _ = handle.await;
    }

    drop(app);
    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => debug!("database still referenced at shutdown, skipping checkpoint"),
    }

    info!("embermail serve shutdown complete");
    Ok(())
}

/// Spawn a loop that runs `job` at every occurrence of `pattern`.
///
/// The pattern uses six fields with seconds. The loop exits when `cancel`
/// fires; a job already running is not interrupted.
fn spawn_cron_job<F, Fut>(
    name: &'static str,
    pattern: &str,
    cancel: CancellationToken,
    mut job: F,
) -> Result<JoinHandle<()>, EmbermailError>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let cron = CronParser::builder()
        .seconds(Seconds::Optional)
        .build()
        .parse(pattern)
        .map_err(|e| {
            EmbermailError::Config(format!("invalid cron pattern for {name} job: {e}"))
        })?;

    Ok(tokio::spawn(async move {
        loop {
            let now = Local::now();
            let next = match cron.find_next_occurrence(&now, false) {
                Ok(next) => next,
                Err(e) => {
                    error!(job = name, error = %e, "no next cron occurrence, stopping job");
                    break;
                }
            };
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    debug!(job = name, "cron job firing");
                    job().await;
                }
                _ = cancel.cancelled() => {
                    info!(job = name, "cron job stopped");
                    break;
                }
            }
        }
    }))
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("embermail={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn cron_job_rejects_bad_pattern() {
        let result = spawn_cron_job("bad", "not a cron", CancellationToken::new(), || async {});
        assert!(matches!(result, Err(EmbermailError::Config(_))));
    }

    #[tokio::test]
    async fn cron_job_fires_on_schedule() {
        let counter = Arc::new(AtomicU32::new(0));
        let job_counter = counter.clone();
        let cancel = CancellationToken::new();

        // Every second.
        let handle = spawn_cron_job("tick", "* * * * * *", cancel.clone(), move || {
            let job_counter = job_counter.clone();
            async move {
                job_counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        cancel.cancel();
        let _ = handle.await;

        assert!(counter.load(Ordering::SeqCst) >= 1);
    }
}
