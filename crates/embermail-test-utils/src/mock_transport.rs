// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock mail transport for deterministic testing.
//!
//! `MockTransport` implements `MailTransport` with captured outbound emails
//! and scriptable failures, so dispatch behavior can be asserted without a
//! live SMTP server.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use embermail_core::types::{
    ImapCredentials, OutboundEmail, SendReceipt, SmtpCredentials, SpamMessage,
};
use embermail_core::{EmbermailError, MailTransport};

/// A captured send with the credentials it was attempted under.
#[derive(Debug, Clone)]
pub struct CapturedSend {
    pub username: String,
    pub email: OutboundEmail,
}

/// A mock mail transport for testing.
///
/// Sends are captured and retrievable via `sent_emails()`. Failures are
/// scripted with `fail_next()`: each queued error string fails exactly one
/// subsequent send, in order. The spam folder returned by
/// `list_spam_messages` is set per test via `set_spam_messages()`.
pub struct MockTransport {
    sent: Arc<Mutex<Vec<CapturedSend>>>,
    scripted_failures: Arc<Mutex<VecDeque<String>>>,
    spam: Arc<Mutex<Vec<SpamMessage>>>,
}

impl MockTransport {
    /// Create a new mock transport with no scripted failures.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            scripted_failures: Arc::new(Mutex::new(VecDeque::new())),
            spam: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script the next send to fail with the given error message.
    ///
    /// Multiple calls queue up; failures are consumed first-in first-out.
    pub async fn fail_next(&self, error: &str) {
        self.scripted_failures
            .lock()
            .await
            .push_back(error.to_string());
    }

    /// Replace the spam folder contents returned by `list_spam_messages`.
    pub async fn set_spam_messages(&self, messages: Vec<SpamMessage>) {
        *self.spam.lock().await = messages;
    }

    /// Get all emails that were successfully sent.
    pub async fn sent_emails(&self) -> Vec<CapturedSend> {
        self.sent.lock().await.clone()
    }

    /// Get the count of successfully sent emails.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all captured sends.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for MockTransport {
    async fn send_email(
        &self,
        credentials: &SmtpCredentials,
        email: &OutboundEmail,
    ) -> Result<SendReceipt, EmbermailError> {
        if let Some(error) = self.scripted_failures.lock().await.pop_front() {
            return Err(EmbermailError::Transport {
                message: error,
                source: None,
            });
        }

        self.sent.lock().await.push(CapturedSend {
            username: credentials.username.clone(),
            email: email.clone(),
        });
        Ok(SendReceipt {
            message_id: format!("<mock-{}@example.test>", uuid::Uuid::new_v4()),
        })
    }

    async fn list_spam_messages(
        &self,
        _credentials: &ImapCredentials,
    ) -> Result<Vec<SpamMessage>, EmbermailError> {
        Ok(self.spam.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> SmtpCredentials {
        SmtpCredentials {
            host: "smtp.example.test".to_string(),
            port: 587,
            username: "a@example.test".to_string(),
            password: "secret".to_string(),
        }
    }

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            from: "a@example.test".to_string(),
            to: to.to_string(),
            subject: "hi".to_string(),
            body: "hello".to_string(),
        }
    }

    #[tokio::test]
    async fn send_captures_emails_in_order() {
        let transport = MockTransport::new();

        transport.send_email(&creds(), &email("b@example.test")).await.unwrap();
        transport.send_email(&creds(), &email("c@example.test")).await.unwrap();

        let sent = transport.sent_emails().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].email.to, "b@example.test");
        assert_eq!(sent[1].email.to, "c@example.test");
        assert_eq!(sent[0].username, "a@example.test");
    }

    #[tokio::test]
    async fn scripted_failure_consumes_exactly_one_send() {
        let transport = MockTransport::new();
        transport.fail_next("550 mailbox unavailable").await;

        let err = transport
            .send_email(&creds(), &email("b@example.test"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("550 mailbox unavailable"));
        assert_eq!(transport.sent_count().await, 0);

        // The failure is spent; the next send succeeds.
        let receipt = transport
            .send_email(&creds(), &email("b@example.test"))
            .await
            .unwrap();
        assert!(receipt.message_id.starts_with("<mock-"));
        assert_eq!(transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn spam_folder_is_scriptable() {
        let transport = MockTransport::new();
        let imap = ImapCredentials {
            host: "imap.example.test".to_string(),
            port: 993,
            username: "a@example.test".to_string(),
            password: "secret".to_string(),
        };

        assert!(transport.list_spam_messages(&imap).await.unwrap().is_empty());

        transport
            .set_spam_messages(vec![SpamMessage {
                from: "peer@example.test".to_string(),
                subject: "Quick question".to_string(),
                received_at: None,
            }])
            .await;

        let spam = transport.list_spam_messages(&imap).await.unwrap();
        assert_eq!(spam.len(), 1);
        assert_eq!(spam[0].from, "peer@example.test");
    }
}
