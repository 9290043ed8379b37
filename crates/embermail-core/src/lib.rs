// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Embermail warmup scheduler.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Embermail workspace. The transport,
//! holiday, and clock collaborators are trait seams implemented elsewhere.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::EmbermailError;
pub use types::{
    CampaignId, EntryId, EntryKind, EntryStatus, MailboxId, WarmupPhase, WarmupStatus,
};

pub use traits::{Clock, HolidaySource, MailTransport, SystemClock};
