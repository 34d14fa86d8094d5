//! Delivers rendered reports by email.
//!
//! `Dispatcher` knows who a message is from and where it goes by default; the `MailTransport` it
//! holds knows how to get a message there. Production uses SMTP through `lettre`.

use crate::{Config, Result};
use anyhow::{bail, Context};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::{error, info};

/// An email to send. When `to` is `None` the dispatcher's default recipient is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub html: String,
    pub to: Option<String>,
}

/// A fully addressed message, as handed to a `MailTransport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// What the transport said about a message it accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub recipient: String,
    pub response: String,
}

/// Moves one message to its recipient. Implementations make exactly one attempt per call.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    /// Sends `envelope` and returns the transport's response text.
    async fn deliver(&self, envelope: &Envelope) -> Result<String>;
}

/// Sends messages on behalf of the configured account.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    from: String,
    default_recipient: Option<String>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        from: impl Into<String>,
        default_recipient: Option<String>,
    ) -> Self {
        Self {
            transport,
            from: from.into(),
            default_recipient,
        }
    }

    /// Creates a dispatcher that sends over SMTP using the email settings in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = SmtpTransport::new(
            config.email_service()?,
            config.email_user()?,
            config.email_password()?,
        )?;
        Ok(Self::new(
            Arc::new(transport),
            config.email_user()?,
            config.email_recipient().map(str::to_string),
        ))
    }

    /// Sends `email`, addressed to `email.to` or, if that is absent, the default recipient.
    pub async fn send(&self, email: Email) -> Result<Delivery> {
        let to = match email.to.or_else(|| self.default_recipient.clone()) {
            Some(to) => to,
            None => bail!("No recipient given and no default recipient is configured"),
        };
        let envelope = Envelope {
            from: self.from.clone(),
            to,
            subject: email.subject,
            html: email.html,
        };

        info!(
            "Sending email to {} with subject \"{}\"",
            envelope.to, envelope.subject
        );
        match self.transport.deliver(&envelope).await {
            Ok(response) => {
                info!("Email sent successfully");
                Ok(Delivery {
                    recipient: envelope.to,
                    response,
                })
            }
            Err(e) => {
                error!("Error sending email to {}: {e:#}", envelope.to);
                Err(e.context(format!("Failed to send email to {}", envelope.to)))
            }
        }
    }
}

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    /// `service` is either a well-known provider name such as `gmail` or an SMTP hostname.
    pub fn new(service: &str, user: &str, password: &str) -> Result<Self> {
        let host = relay_host(service);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .with_context(|| format!("Unable to set up SMTP relay '{host}'"))?
            .credentials(Credentials::new(user.to_string(), password.to_string()))
            .build();
        Ok(Self { mailer })
    }
}

#[async_trait::async_trait]
impl MailTransport for SmtpTransport {
    async fn deliver(&self, envelope: &Envelope) -> Result<String> {
        let message = build_message(envelope)?;
        let response = self
            .mailer
            .send(message)
            .await
            .context("The SMTP server did not accept the message")?;
        Ok(response.message().collect::<Vec<&str>>().join(" "))
    }
}

fn build_message(envelope: &Envelope) -> Result<Message> {
    let from: Mailbox = envelope
        .from
        .parse()
        .with_context(|| format!("Invalid sender address '{}'", envelope.from))?;
    let to: Mailbox = envelope
        .to
        .parse()
        .with_context(|| format!("Invalid recipient address '{}'", envelope.to))?;
    Message::builder()
        .from(from)
        .to(to)
        .subject(envelope.subject.as_str())
        .header(ContentType::TEXT_HTML)
        .body(envelope.html.clone())
        .context("Unable to build email message")
}

/// Maps well-known service names to their SMTP submission hosts. Anything else is taken to be a
/// hostname.
fn relay_host(service: &str) -> &str {
    match service.trim().to_ascii_lowercase().as_str() {
        "gmail" | "googlemail" => "smtp.gmail.com",
        "outlook" | "hotmail" | "outlook365" | "office365" => "smtp.office365.com",
        "yahoo" => "smtp.mail.yahoo.com",
        "icloud" => "smtp.mail.me.com",
        "zoho" => "smtp.zoho.com",
        _ => service.trim(),
    }
}
