//! SMTP delivery.

use crate::error::{NotifyError, Result};
use crate::templates::EmailMessage;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use mietbot_core::NotifySection;

/// Sends notification mail through a configured SMTP relay.
///
/// Construction decides whether notifications happen at all: with an
/// incomplete SMTP section or no notification address there is no notifier,
/// and the crawl loop simply skips the step.
pub struct Notifier {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
    to: String,
}

impl Notifier {
    /// Build a notifier when the config and profile allow one.
    #[must_use]
    pub fn from_config(section: &NotifySection, notification_email: Option<&str>) -> Option<Self> {
        let to = notification_email?.trim();
        if to.is_empty() {
            return None;
        }
        Some(Self {
            host: section.smtp_host.clone()?,
            port: section.smtp_port?,
            username: section.smtp_username.clone()?,
            password: section.smtp_password.clone()?,
            from: section.from_address.clone()?,
            to: to.to_string(),
        })
    }

    /// The configured notification address.
    #[must_use]
    pub fn recipient(&self) -> &str {
        &self.to
    }

    /// Send one mail through the relay.
    pub fn send(&self, mail: &EmailMessage) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| NotifyError::BadAddress {
                role: "from",
                address: self.from.clone(),
                reason: format!("{e}"),
            })?)
            .to(mail.to.parse().map_err(|e| NotifyError::BadAddress {
                role: "to",
                address: mail.to.clone(),
                reason: format!("{e}"),
            })?)
            .subject(&mail.subject)
            .body(mail.body.clone())?;

        let credentials = Credentials::new(self.username.clone(), self.password.clone());
        let transport = SmtpTransport::relay(&self.host)?
            .port(self.port)
            .credentials(credentials)
            .build();

        transport.send(&message)?;
        tracing::info!(to = %mail.to, subject = %mail.subject, "notification sent");
        Ok(())
    }
}
