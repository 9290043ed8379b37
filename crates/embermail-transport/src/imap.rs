// SPDX-FileCopyrightText: 2026 Embermail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only IMAP access to the spam folder.
//!
//! Connects over implicit TLS, EXAMINEs (never SELECTs) the junk folder and
//! fetches envelope metadata only. Message bodies are never downloaded and
//! nothing is ever moved or flagged.

use std::sync::Arc;

use async_imap::types::Fetch;
use async_imap::Session;
use chrono::{DateTime, Utc};
use embermail_core::types::{ImapCredentials, SpamMessage};
use embermail_core::EmbermailError;
use futures::TryStreamExt;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

type ImapSession = Session<TlsStream<TcpStream>>;

// Folder names vary by provider; EXAMINE each until one exists.
const SPAM_FOLDERS: &[&str] = &["Junk", "Spam", "INBOX.Junk", "INBOX.Spam", "[Gmail]/Spam"];

fn transport_err(
    message: impl Into<String>,
    source: impl std::error::Error + Send + Sync + 'static,
) -> EmbermailError {
    EmbermailError::Transport {
        message: message.into(),
        source: Some(Box::new(source)),
    }
}

async fn connect(credentials: &ImapCredentials) -> Result<ImapSession, EmbermailError> {
    debug!(host = %credentials.host, port = credentials.port, "connecting to IMAP server");

    let tcp = TcpStream::connect((credentials.host.as_str(), credentials.port))
        .await
        .map_err(|e| transport_err(format!("TCP connect to {} failed", credentials.host), e))?;

    let roots = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.into(),
    };
    let config = rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let server_name = ServerName::try_from(credentials.host.clone())
        .map_err(|e| transport_err(format!("invalid IMAP host name: {}", credentials.host), e))?;
    let tls = TlsConnector::from(Arc::new(config))
        .connect(server_name, tcp)
        .await
        .map_err(|e| transport_err(format!("TLS handshake with {} failed", credentials.host), e))?;

    let client = async_imap::Client::new(tls);
    let session = client
        .login(&credentials.username, &credentials.password)
        .await
        .map_err(|(e, _)| transport_err(format!("IMAP login as {} failed", credentials.username), e))?;

    Ok(session)
}

/// EXAMINE the first spam folder the server knows about.
///
/// Returns the message count, or `None` when no candidate folder exists.
async fn open_spam_folder(session: &mut ImapSession) -> Option<u32> {
    for folder in SPAM_FOLDERS {
        match session.examine(folder).await {
            Ok(mailbox) => {
                debug!(folder, exists = mailbox.exists, "opened spam folder");
                return Some(mailbox.exists);
            }
            Err(_) => continue,
        }
    }
    None
}

fn decode(bytes: Option<&[u8]>) -> String {
    bytes
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

fn message_from_fetch(fetch: &Fetch) -> Option<SpamMessage> {
    let envelope = fetch.envelope()?;

    let from = envelope
        .from
        .as_deref()
        .and_then(|addrs| addrs.first())
        .map(|addr| {
            let address = format!(
                "{}@{}",
                decode(addr.mailbox.as_deref()),
                decode(addr.host.as_deref())
            );
            match addr.name.as_deref() {
                Some(name) => format!("{} <{address}>", String::from_utf8_lossy(name)),
                None => address,
            }
        })?;

    let received_at: Option<DateTime<Utc>> =
        fetch.internal_date().map(|d| d.with_timezone(&Utc));

    Some(SpamMessage {
        from,
        subject: decode(envelope.subject.as_deref()),
        received_at,
    })
}

/// List envelope metadata for every message in the spam folder.
pub async fn list_spam_messages(
    credentials: &ImapCredentials,
) -> Result<Vec<SpamMessage>, EmbermailError> {
    let mut session = connect(credentials).await?;

    let exists = open_spam_folder(&mut session).await;
    let messages = match exists {
        None | Some(0) => Vec::new(),
        Some(_) => {
            let fetches: Vec<Fetch> = session
                .fetch("1:*", "(ENVELOPE INTERNALDATE)")
                .await
                .map_err(|e| transport_err("spam folder FETCH failed", e))?
                .try_collect()
                .await
                .map_err(|e| transport_err("spam folder FETCH stream failed", e))?;

            fetches.iter().filter_map(message_from_fetch).collect()
        }
    };

    // Best effort; the probe result is already in hand.
    if let Err(e) = session.logout().await {
        debug!(error = %e, "IMAP logout failed");
    }

    info!(
        host = %credentials.host,
        messages = messages.len(),
        "spam folder listed"
    );
    Ok(messages)
}
