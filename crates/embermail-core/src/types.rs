// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Embermail workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for a sending mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MailboxId(pub i64);

/// Unique identifier for a scheduled send entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(pub i64);

/// Unique identifier for a campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignId(pub i64);

/// Warmup lifecycle state of a mailbox.
///
/// Created `inactive`; `warming` while the ramp curve is in progress;
/// `completed` once the curve is exhausted. Administrative transitions
/// (enroll, deactivate) are validated against the current state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WarmupStatus {
    Inactive,
    Warming,
    Completed,
}

/// Warmup phase within the `warming` state.
///
/// `silent`: quota derives purely from the ramp curve, no live traffic.
/// `active`: the mailbox may additionally serve campaign traffic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WarmupPhase {
    Silent,
    Active,
}

/// Kind of a scheduled send entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Warmup,
    Campaign,
}

/// Status of a scheduled send entry.
///
/// `pending -> sending` is the atomic dispatch claim; `sent`, `failed` and
/// `skipped` are terminal. A failed entry is never re-attempted; re-sending
/// requires a fresh entry from a later planning pass.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Skipped,
}

/// SMTP credentials for a sending mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// IMAP credentials for the receiving side of a mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImapCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// An outbound email handed to the transport for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Receipt returned by the transport after a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// RFC 5322 Message-ID assigned to the delivered email.
    pub message_id: String,
}

/// Summary of a message found in a mailbox's spam folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpamMessage {
    pub from: String,
    pub subject: String,
    pub received_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn warmup_status_round_trips_through_strings() {
        for status in [
            WarmupStatus::Inactive,
            WarmupStatus::Warming,
            WarmupStatus::Completed,
        ] {
            let s = status.to_string();
            assert_eq!(WarmupStatus::from_str(&s).unwrap(), status);
        }
        assert_eq!(WarmupStatus::Warming.to_string(), "warming");
    }

    #[test]
    fn entry_status_round_trips_through_strings() {
        for status in [
            EntryStatus::Pending,
            EntryStatus::Sending,
            EntryStatus::Sent,
            EntryStatus::Failed,
            EntryStatus::Skipped,
        ] {
            let s = status.to_string();
            assert_eq!(EntryStatus::from_str(&s).unwrap(), status);
        }
    }

    #[test]
    fn entry_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntryKind::Warmup).unwrap();
        assert_eq!(json, "\"warmup\"");
        let parsed: EntryKind = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, EntryKind::Warmup);
    }
}
