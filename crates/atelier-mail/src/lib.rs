//! Outbound email for the site.
//!
//! Three messages leave this system: booking confirmations, gift-card
//! receipts, and private-event notifications to the studio inbox. They are
//! rendered by [`templates`] as plain text and delivered through a
//! [`Mailer`].
//!
//! Two transports exist: [`SmtpMailer`] for production and [`ConsoleMailer`]
//! for development, where the daemon runs without a `[mail]` config section
//! and rendered messages are only logged.
//!
//! Sending is synchronous (the SMTP transport blocks); async callers wrap
//! `send` in `spawn_blocking`. Email failures are never allowed to fail the
//! purchase that triggered them; callers log and move on.

pub mod templates;

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use atelier_core::{AtelierError, Result};

/// A rendered, ready-to-send message.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,

    /// Subject line
    pub subject: String,

    /// Plain-text body
    pub body: String,
}

/// Delivery interface for rendered messages.
pub trait Mailer: Send + Sync + 'static {
    /// Deliver one message.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// SMTP delivery via a relay (production).
#[derive(Clone)]
pub struct SmtpMailer {
    smtp_host: String,
    smtp_port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpMailer {
    /// Create an SMTP mailer for the given relay and sender identity.
    pub fn new(
        smtp_host: String,
        smtp_port: u16,
        username: String,
        password: String,
        from_email: String,
        from_name: String,
    ) -> Self {
        Self {
            smtp_host,
            smtp_port,
            credentials: Credentials::new(username, password),
            from_email,
            from_name,
        }
    }

    /// Build a transport for one send.
    ///
    /// A fresh transport per message sidesteps stale pooled connections;
    /// outbound volume here is a handful of messages a day.
    fn build_transport(&self) -> Result<SmtpTransport> {
        Ok(SmtpTransport::relay(&self.smtp_host)
            .map_err(|e| AtelierError::mail(format!("SMTP relay error: {}", e)))?
            .port(self.smtp_port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let email = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| AtelierError::mail(format!("invalid from address: {}", e)))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|e| AtelierError::mail(format!("invalid recipient address: {}", e)))?)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| AtelierError::mail(format!("failed to build message: {}", e)))?;

        let transport = self.build_transport()?;
        transport
            .send(&email)
            .map_err(|e| AtelierError::mail(format!("SMTP send failed: {}", e)))?;

        tracing::info!("sent email '{}' to {}", message.subject, message.to);
        Ok(())
    }
}

/// Log-only delivery (development).
#[derive(Debug, Clone, Default)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            "email (console transport) to={} subject={:?}\n{}",
            message.to,
            message.subject,
            message.body
        );
        Ok(())
    }
}
