//! Outbound SMTP mail.
//!
//! Used for email OTP dispatch and the contact form. Plain-text bodies
//! only; nothing here renders templates.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;

use charkha_core::Email;

use crate::config::SmtpConfig;

/// Errors that can occur when sending mail.
#[derive(Debug, Error)]
pub enum MailerError {
    /// An address failed to parse into a mailbox.
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Message construction failed.
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// SMTP transport failure.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// SMTP mailer.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    /// Contact-form submissions are delivered to this inbox.
    contact_inbox: Mailbox,
}

impl Mailer {
    /// Create a mailer from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host or from-address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailerError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_owned(),
            ))
            .build();

        let from: Mailbox = config.from.parse()?;

        Ok(Self {
            transport,
            contact_inbox: from.clone(),
            from,
        })
    }

    /// Send a plain-text email.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or the relay refuses it.
    pub async fn send(&self, to: &Email, subject: &str, body: String) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.as_str().parse()?)
            .subject(subject)
            .body(body)?;

        self.transport.send(message).await?;
        Ok(())
    }

    /// Relay a contact-form submission to the store inbox.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or the relay refuses it.
    pub async fn send_contact(
        &self,
        reply_to: &Email,
        name: &str,
        message_body: &str,
    ) -> Result<(), MailerError> {
        let message = Message::builder()
            .from(self.from.clone())
            .reply_to(reply_to.as_str().parse()?)
            .to(self.contact_inbox.clone())
            .subject(format!("Contact form: {name}"))
            .body(message_body.to_owned())?;

        self.transport.send(message).await?;
        Ok(())
    }
}
