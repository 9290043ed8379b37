// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spam-folder reputation probe.
//!
//! Read-only: lists a mailbox's spam folder and counts how many of the
//! messages came from peer mailboxes in the warmup pool. No remediation is
//! attempted.

use std::collections::HashSet;
use std::sync::Arc;

use embermail_core::types::SpamMessage;
use embermail_core::{EmbermailError, MailTransport};
use embermail_storage::queries::mailboxes;
use embermail_storage::Database;
use tracing::info;

/// Result of one spam-folder probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamReport {
    pub messages: Vec<SpamMessage>,
    /// Messages whose sender is another mailbox in the warmup pool.
    pub warmup_hits: u32,
}

/// Probes mailbox spam folders for warmup deliverability signals.
pub struct ReputationMonitor {
    db: Arc<Database>,
    transport: Arc<dyn MailTransport + Send + Sync>,
}

impl ReputationMonitor {
    pub fn new(db: Arc<Database>, transport: Arc<dyn MailTransport + Send + Sync>) -> Self {
        Self { db, transport }
    }

    /// List the mailbox's spam folder and flag warmup peers among senders.
    pub async fn check_spam_folder(&self, email: &str) -> Result<SpamReport, EmbermailError> {
        let mailbox = mailboxes::get_mailbox_by_email(&self.db, email)
            .await?
            .ok_or_else(|| EmbermailError::MailboxNotFound(email.to_string()))?;

        let messages = self.transport.list_spam_messages(&mailbox.imap).await?;

        let peers: HashSet<String> = mailboxes::list_active(&self.db)
            .await?
            .into_iter()
            .filter(|m| m.id != mailbox.id)
            .map(|m| m.email.to_lowercase())
            .collect();

        let warmup_hits = messages
            .iter()
            .filter(|m| peers.contains(&sender_address(&m.from)))
            .count() as u32;

        info!(
            mailbox = %email,
            spam_messages = messages.len(),
            warmup_hits,
            "spam folder probed"
        );
        Ok(SpamReport {
            messages,
            warmup_hits,
        })
    }
}

/// Extract the bare address from an RFC 5322 From value.
///
/// Handles both `Name <addr@host>` and plain `addr@host` forms.
fn sender_address(from: &str) -> String {
    let inner = match (from.find('<'), from.rfind('>')) {
        (Some(open), Some(close)) if open < close => &from[open + 1..close],
        _ => from,
    };
    inner.trim().to_lowercase()
}
