// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `embermail status` command implementation.
//!
//! Reads per-mailbox warmup state straight from storage and prints a
//! summary table, or structured JSON with `--json`.

use std::io::IsTerminal;

use embermail_config::model::EmbermailConfig;
use embermail_core::{EmbermailError, WarmupStatus};
use embermail_storage::models::Mailbox;
use embermail_storage::queries::mailboxes;
use embermail_storage::Database;
use serde::Serialize;

/// Structured per-mailbox status for `--json` mode.
#[derive(Debug, Serialize)]
pub struct MailboxStatus {
    pub email: String,
    pub active: bool,
    pub warmup_status: String,
    pub warmup_day: u32,
    pub warmup_phase: String,
    pub daily_limit: u32,
    pub today_sent: u32,
    pub last_sent_at: Option<String>,
}

impl From<&Mailbox> for MailboxStatus {
    fn from(mailbox: &Mailbox) -> Self {
        Self {
            email: mailbox.email.clone(),
            active: mailbox.is_active,
            warmup_status: mailbox.warmup_status.to_string(),
            warmup_day: mailbox.warmup_day,
            warmup_phase: mailbox.warmup_phase.to_string(),
            daily_limit: effective_daily_limit(mailbox),
            today_sent: mailbox.warmup_today_sent,
            last_sent_at: mailbox
                .last_sent_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

fn effective_daily_limit(mailbox: &Mailbox) -> u32 {
    match mailbox.warmup_status {
        WarmupStatus::Completed => mailbox.daily_email_limit,
        _ => mailbox.warmup_daily_limit,
    }
}

/// Run the `embermail status` command.
pub async fn run_status(
    config: &EmbermailConfig,
    json: bool,
    plain: bool,
) -> Result<(), EmbermailError> {
    let db = Database::open(&config.storage.database_path, config.storage.wal_mode).await?;
    let all = mailboxes::list_active(&db).await?;
    let statuses: Vec<MailboxStatus> = all.iter().map(MailboxStatus::from).collect();
    db.close().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&statuses).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(());
    }

    let use_color = !plain && std::io::stdout().is_terminal();
    print_status_table(&statuses, use_color);
    Ok(())
}

fn print_status_table(statuses: &[MailboxStatus], use_color: bool) {
    println!();
    println!("  embermail status");
    println!("  {}", "-".repeat(60));

    if statuses.is_empty() {
        println!("    no active mailboxes");
        println!();
        println!("  Enroll with: embermail warmup enroll <email>");
        println!();
        return;
    }

    for status in statuses {
        let state = format_state(status, use_color);
        println!("    {:<32} {}", status.email, state);
        if status.warmup_status != "inactive" {
            println!(
                "      day {:>2}  phase {:<6}  sent {}/{} today",
                status.warmup_day, status.warmup_phase, status.today_sent, status.daily_limit
            );
        }
        if let Some(ref last) = status.last_sent_at {
            println!("      last sent {last}");
        }
    }
    println!();
}

fn format_state(status: &MailboxStatus, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        match status.warmup_status.as_str() {
            "warming" => status.warmup_status.yellow().to_string(),
            "completed" => status.warmup_status.green().to_string(),
            _ => status.warmup_status.dimmed().to_string(),
        }
    } else {
        status.warmup_status.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embermail_core::types::{ImapCredentials, MailboxId, SmtpCredentials};
    use embermail_core::WarmupPhase;

    fn sample_mailbox(status: WarmupStatus) -> Mailbox {
        Mailbox {
            id: MailboxId(1),
            email: "sender@example.test".to_string(),
            display_name: "Sender".to_string(),
            smtp: SmtpCredentials {
                host: "smtp.example.test".to_string(),
                port: 587,
                username: "sender@example.test".to_string(),
                password: "secret".to_string(),
            },
            imap: ImapCredentials {
                host: "imap.example.test".to_string(),
                port: 993,
                username: "sender@example.test".to_string(),
                password: "secret".to_string(),
            },
            is_active: true,
            warmup_status: status,
            warmup_day: 8,
            warmup_phase: WarmupPhase::Active,
            warmup_daily_limit: 25,
            daily_email_limit: 100,
            warmup_today_sent: 10,
            warmup_started_on: None,
            warmup_last_advanced_on: None,
            last_sent_at: None,
        }
    }

    #[test]
    fn warming_mailbox_reports_ramp_limit() {
        let status = MailboxStatus::from(&sample_mailbox(WarmupStatus::Warming));
        assert_eq!(status.daily_limit, 25);
        assert_eq!(status.warmup_status, "warming");
    }

    #[test]
    fn completed_mailbox_reports_overall_limit() {
        let status = MailboxStatus::from(&sample_mailbox(WarmupStatus::Completed));
        assert_eq!(status.daily_limit, 100);
    }

    #[test]
    fn status_serializes_to_json() {
        let status = MailboxStatus::from(&sample_mailbox(WarmupStatus::Warming));
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"warmup_day\":8"));
        assert!(json.contains("\"today_sent\":10"));
    }
}
