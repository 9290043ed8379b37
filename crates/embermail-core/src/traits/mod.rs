// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the scheduler core.
//!
//! The scheduler never talks to SMTP/IMAP, the holiday calendar, or the wall
//! clock directly; it goes through these seams so tests can substitute
//! deterministic implementations.

pub mod clock;
pub mod holiday;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use holiday::HolidaySource;
pub use transport::MailTransport;
