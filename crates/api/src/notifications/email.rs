//! Activation-email delivery.
//!
//! Handlers depend on the [`Mailer`] trait. [`SmtpMailer`] sends through the
//! `lettre` async SMTP transport when `SMTP_HOST` is configured; otherwise the
//! binary installs [`DisabledMailer`], which only logs that a message was
//! dropped.

use std::sync::Arc;

use async_trait::async_trait;
use marquee_core::types::Timestamp;

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver an activation token, valid until `expiry`, to `recipient`.
    async fn send_activation(
        &self,
        recipient: &str,
        token: &str,
        expiry: Timestamp,
    ) -> Result<(), EmailError>;
}

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "Marquee <no-reply@marquee.local>";

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" mailbox.
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                            |
    /// |-----------------|----------|------------------------------------|
    /// | `SMTP_HOST`     | yes      |                                    |
    /// | `SMTP_PORT`     | no       | `587`                              |
    /// | `SMTP_FROM`     | no       | `Marquee <no-reply@marquee.local>` |
    /// | `SMTP_USER`     | no       |                                    |
    /// | `SMTP_PASSWORD` | no       |                                    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

fn activation_body(token: &str, expiry: Timestamp) -> String {
    let expiry = expiry.format("%Y-%m-%d %H:%M UTC");
    format!(
        "Hi,\n\n\
         Please send a `PUT /v1/users/activated` request with the following JSON\n\
         body to activate your account:\n\n\
         {{\"token\": \"{token}\"}}\n\n\
         Please note that this is a one-time use token and it will expire at {expiry}.\n"
    )
}

/// Sends activation emails via SMTP.
pub struct SmtpMailer {
    config: EmailConfig,
}

impl SmtpMailer {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_activation(
        &self,
        recipient: &str,
        token: &str,
        expiry: Timestamp,
    ) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(recipient.parse()?)
            .subject("Activate your Marquee account")
            .header(ContentType::TEXT_PLAIN)
            .body(activation_body(token, expiry))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport_builder.build().send(email).await?;

        tracing::info!(to = recipient, "Activation email sent");
        Ok(())
    }
}

/// Used when SMTP is not configured. Drops every message.
#[derive(Debug, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_activation(
        &self,
        recipient: &str,
        _token: &str,
        _expiry: Timestamp,
    ) -> Result<(), EmailError> {
        tracing::warn!(to = recipient, "SMTP not configured, activation email dropped");
        Ok(())
    }
}

/// Build the mailer selected by the environment.
pub fn mailer_from_env() -> Arc<dyn Mailer> {
    match EmailConfig::from_env() {
        Some(config) => {
            tracing::info!(
                host = %config.smtp_host,
                port = config.smtp_port,
                "SMTP mailer configured"
            );
            Arc::new(SmtpMailer::new(config))
        }
        None => Arc::new(DisabledMailer),
    }
}
