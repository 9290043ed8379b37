// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embermail - mailbox warmup daemon and CLI.
//!
//! This is the binary entry point for the Embermail scheduler.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod ops;
mod serve;
mod shutdown;
mod status;

use clap::{Parser, Subcommand};
use embermail_core::EmbermailError;

/// Embermail - mailbox warmup and rate-controlled dispatch.
#[derive(Parser, Debug)]
#[command(name = "embermail", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the warmup daemon with all cron jobs.
    Serve,
    /// Show per-mailbox warmup state.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Run the daily warmup-day advance once and exit.
    Advance,
    /// Run the daily planner once and exit.
    Plan,
    /// Drain due entries once and exit.
    Dispatch {
        /// Send at most one email.
        #[arg(long)]
        one: bool,
    },
    /// Manage a mailbox's warmup enrollment.
    Warmup {
        #[command(subcommand)]
        action: WarmupAction,
    },
    /// Probe a mailbox's spam folder for warmup deliverability signals.
    CheckSpam {
        /// Email address of the mailbox to probe.
        email: String,
    },
}

#[derive(Subcommand, Debug)]
enum WarmupAction {
    /// Enroll a mailbox into the warmup ramp.
    Enroll { email: String },
    /// Stop warmup and cancel the mailbox's pending entries.
    Stop { email: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match embermail_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            embermail_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result: Result<(), EmbermailError> = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Advance) => ops::run_advance(config).await,
        Some(Commands::Plan) => ops::run_plan(config).await,
        Some(Commands::Dispatch { one }) => ops::run_dispatch(config, one).await,
        Some(Commands::Warmup { action }) => match action {
            WarmupAction::Enroll { email } => ops::run_enroll(config, &email).await,
            WarmupAction::Stop { email } => ops::run_stop(config, &email).await,
        },
        Some(Commands::CheckSpam { email }) => ops::run_check_spam(config, &email).await,
        None => {
            println!("embermail: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = embermail_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.warmup.days, 30);
    }
}
