// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per storage entity.

pub mod campaigns;
pub mod entries;
pub mod holidays;
pub mod mailboxes;
