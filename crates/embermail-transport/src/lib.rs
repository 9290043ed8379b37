// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live mail transport: STARTTLS SMTP for sending, implicit-TLS IMAP for
//! the read-only spam probe. The scheduler only ever sees the
//! [`MailTransport`] trait, so tests swap this out for a mock.

pub mod imap;
pub mod smtp;

use async_trait::async_trait;
use embermail_core::types::{
    ImapCredentials, OutboundEmail, SendReceipt, SmtpCredentials, SpamMessage,
};
use embermail_core::{EmbermailError, MailTransport};

/// Production transport speaking to real SMTP and IMAP servers.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveTransport;

impl LiveTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MailTransport for LiveTransport {
    async fn send_email(
        &self,
        credentials: &SmtpCredentials,
        email: &OutboundEmail,
    ) -> Result<SendReceipt, EmbermailError> {
        smtp::send_email(credentials, email).await
    }

    async fn list_spam_messages(
        &self,
        credentials: &ImapCredentials,
    ) -> Result<Vec<SpamMessage>, EmbermailError> {
        imap::list_spam_messages(credentials).await
    }
}
