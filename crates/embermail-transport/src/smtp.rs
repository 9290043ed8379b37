// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP delivery via lettre.
//!
//! Each send builds a fresh transport from the mailbox's own credentials.
//! Warmup traffic is low-volume by definition, so connection pooling across
//! sends buys nothing and would keep per-mailbox sessions alive for hours.

use embermail_core::types::{OutboundEmail, SendReceipt, SmtpCredentials};
use embermail_core::EmbermailError;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

fn transport_err(
    message: impl Into<String>,
    source: impl std::error::Error + Send + Sync + 'static,
) -> EmbermailError {
    EmbermailError::Transport {
        message: message.into(),
        source: Some(Box::new(source)),
    }
}

/// Deliver one message over STARTTLS submission.
pub async fn send_email(
    credentials: &SmtpCredentials,
    email: &OutboundEmail,
) -> Result<SendReceipt, EmbermailError> {
    let message_id = format!(
        "<{}@{}>",
        uuid::Uuid::new_v4(),
        credentials.host.trim_start_matches("smtp.")
    );

    let message = Message::builder()
        .from(email.from.parse().map_err(|e| {
            transport_err(format!("invalid sender address: {}", email.from), e)
        })?)
        .to(email.to.parse().map_err(|e| {
            transport_err(format!("invalid recipient address: {}", email.to), e)
        })?)
        .subject(&email.subject)
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_PLAIN)
        .body(email.body.clone())
        .map_err(|e| transport_err("failed to build message", e))?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&credentials.host)
        .map_err(|e| transport_err(format!("invalid SMTP relay: {}", credentials.host), e))?
        .port(credentials.port)
        .credentials(Credentials::new(
            credentials.username.clone(),
            credentials.password.clone(),
        ))
        .build();

    let response = mailer
        .send(message)
        .await
        .map_err(|e| transport_err(format!("SMTP send via {} failed", credentials.host), e))?;

    debug!(
        host = %credentials.host,
        to = %email.to,
        code = %response.code(),
        "message accepted by relay"
    );
    Ok(SendReceipt { message_id })
}
