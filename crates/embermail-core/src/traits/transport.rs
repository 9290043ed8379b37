// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;

use crate::error::EmbermailError;
use crate::types::{ImapCredentials, OutboundEmail, SendReceipt, SmtpCredentials, SpamMessage};

/// Transactional mail transport: SMTP delivery plus the IMAP spam probe.
///
/// A send is not idempotent from the recipient's perspective; callers must
/// let an in-flight send run to completion rather than abandoning it.
#[async_trait]
pub trait MailTransport {
    /// Deliver one email using the given mailbox credentials.
    async fn send_email(
        &self,
        credentials: &SmtpCredentials,
        email: &OutboundEmail,
    ) -> Result<SendReceipt, EmbermailError>;

    /// List the messages currently sitting in the mailbox's spam folder.
    async fn list_spam_messages(
        &self,
        credentials: &ImapCredentials,
    ) -> Result<Vec<SpamMessage>, EmbermailError>;
}
