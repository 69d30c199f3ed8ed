//! Connection code delivery over SMTP.
//!
//! Each code goes out as a `multipart/alternative` message rendered from
//! the `email/connection_code.{html,txt}` templates.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

const CONNECTION_CODE_SUBJECT: &str = "Your Interactive Studio connection code";

#[derive(Template)]
#[template(path = "email/connection_code.html")]
struct CodeHtml<'a> {
    code: &'a str,
}

#[derive(Template)]
#[template(path = "email/connection_code.txt")]
struct CodeText<'a> {
    code: &'a str,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends connection codes through an authenticated STARTTLS relay.
#[derive(Clone)]
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailService")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl EmailService {
    /// Build the SMTP transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host is invalid or the sender is not a
    /// valid mailbox.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let from = parse_mailbox(&config.from_address)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_owned(),
            ))
            .build();

        Ok(Self { transport, from })
    }

    /// Mail `code` to `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if `to` is not a valid address, a template fails to
    /// render, or the relay rejects the message.
    pub async fn send_connection_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let message = connection_code_message(self.from.clone(), parse_mailbox(to)?, code)?;
        self.transport.send(message).await?;

        tracing::info!(to = %to, "Connection code sent");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_owned()))
}

fn connection_code_message(from: Mailbox, to: Mailbox, code: &str) -> Result<Message, EmailError> {
    let text = CodeText { code }.render()?;
    let html = CodeHtml { code }.render()?;

    Ok(Message::builder()
        .from(from)
        .to(to)
        .subject(CONNECTION_CODE_SUBJECT)
        .multipart(MultiPart::alternative_plain_html(text, html))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_message_carries_code_in_both_parts() {
        let message = connection_code_message(
            parse_mailbox("studio@example.com").unwrap(),
            parse_mailbox("merchant@example.com").unwrap(),
            "482913",
        )
        .unwrap();

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Your Interactive Studio connection code"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
        assert_eq!(raw.matches("482913").count(), 2);
    }

    #[test]
    fn test_invalid_recipient() {
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
