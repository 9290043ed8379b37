// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Embermail warmup scheduler.

use thiserror::Error;

use crate::types::WarmupStatus;

/// The primary error type used across all Embermail crates.
#[derive(Debug, Error)]
pub enum EmbermailError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mail transport errors (SMTP send failure, IMAP connection, TLS handshake).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A mailbox's warmup counters are inconsistent (e.g. sent count above the
    /// daily limit). Self-heals by clamping on the next day advance.
    #[error("quota state error: {0}")]
    QuotaState(String),

    /// An administrative warmup transition was requested from an invalid state.
    #[error("invalid warmup transition: {from} -> {to}")]
    InvalidTransition { from: WarmupStatus, to: WarmupStatus },

    /// A requested mailbox does not exist.
    #[error("mailbox not found: {0}")]
    MailboxNotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
