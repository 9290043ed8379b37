// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Embermail integration tests.
//!
//! Provides mock collaborators for fast, deterministic, CI-runnable tests
//! without live SMTP or IMAP servers.
//!
//! # Components
//!
//! - [`MockTransport`] - Mail transport with captured sends and scriptable failures
//! - [`FixedClock`] - Clock pinned to a settable instant

pub mod fixed_clock;
pub mod mock_transport;

pub use fixed_clock::FixedClock;
pub use mock_transport::MockTransport;
