/// Outgoing mail transports
///
/// [`SmtpMailer`] delivers through an SMTP relay. [`LogMailer`] only logs and
/// keeps the most recent messages in memory, for development and tests.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub email: String,
    pub name: Option<String>,
}

impl Address {
    pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            email: email.into(),
            name,
        }
    }

    fn to_mailbox(&self) -> Result<Mailbox> {
        let email = self
            .email
            .parse()
            .map_err(|e| anyhow!("Invalid address {}: {}", self.email, e))?;
        Ok(Mailbox::new(self.name.clone(), email))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: Address,
    pub to: Address,
    pub reply_to: Option<Address>,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl Email {
    fn to_message(&self) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.to_mailbox()?)
            .to(self.to.to_mailbox()?)
            .subject(self.subject.clone());

        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.to_mailbox()?);
        }

        let message = match &self.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                self.text_body.clone(),
                html.clone(),
            ))?,
            None => builder.singlepart(SinglePart::plain(self.text_body.clone()))?,
        };

        Ok(message)
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;
}

/// SMTP delivery through a STARTTLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| anyhow!("Failed to configure SMTP transport: {}", e))?
            .port(config.port);

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        let message = email.to_message()?;
        self.transport
            .send(message)
            .await
            .map_err(|e| anyhow!("SMTP delivery failed: {}", e))?;
        Ok(())
    }
}

/// Logs messages instead of delivering them.
///
/// Only the last `capacity` messages are kept.
pub struct LogMailer {
    sent: Mutex<VecDeque<Email>>,
    capacity: usize,
}

impl LogMailer {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Messages still held, oldest first.
    pub async fn sent(&self) -> Vec<Email> {
        self.sent.lock().await.iter().cloned().collect()
    }
}

impl Default for LogMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        // Build the MIME message anyway so bad addresses fail the same way SMTP would.
        email.to_message()?;
        tracing::info!(
            to = %email.to.email,
            subject = %email.subject,
            "email captured (log mailer)"
        );

        if self.capacity == 0 {
            return Ok(());
        }
        let mut sent = self.sent.lock().await;
        if sent.len() == self.capacity {
            sent.pop_front();
        }
        sent.push_back(email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> Email {
        Email {
            from: Address::new("noreply@example.com", Some("Site robot".into())),
            to: Address::new(to, None),
            reply_to: Some(Address::new("jane@example.com", Some("Jane".into()))),
            subject: "Hello".into(),
            text_body: "Plain body".into(),
            html_body: Some("<p>Html body</p>".into()),
        }
    }

    #[test]
    fn builds_mime_message() {
        let message = email("admin@example.com").to_message().unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("Reply-To:"));
        assert!(raw.contains("<jane@example.com>"));
    }

    #[tokio::test]
    async fn log_mailer_records_messages() {
        let mailer = LogMailer::new();
        mailer.send(&email("admin@example.com")).await.unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.email, "admin@example.com");
    }

    #[tokio::test]
    async fn log_mailer_rejects_bad_address() {
        let mailer = LogMailer::new();
        assert!(mailer.send(&email("not an address")).await.is_err());
        assert!(mailer.sent().await.is_empty());
    }

    #[tokio::test]
    async fn log_mailer_keeps_only_recent_messages() {
        let mailer = LogMailer::with_capacity(2);
        for to in ["a@example.com", "b@example.com", "c@example.com"] {
            mailer.send(&email(to)).await.unwrap();
        }

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to.email, "b@example.com");
        assert_eq!(sent[1].to.email, "c@example.com");
    }
}
