//! SMTP email sender built on lettre, with async transport and TLS.

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use shared_error::AppError;

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty()
    }
}

/// Outbound message content (plain text).
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

/// Trait for email sending abstraction
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, content: EmailContent) -> Result<(), AppError>;

    fn is_available(&self) -> bool;
}

/// SMTP Email Sender implementation
pub struct SmtpEmailSender {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpEmailSender {
    pub fn new(config: SmtpConfig) -> Result<Self, AppError> {
        if !config.is_configured() {
            tracing::warn!("SMTP not configured - email sending is disabled");
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let transport = Self::build_transport(&config)?;

        tracing::info!(
            host = %config.host,
            port = %config.port,
            "SMTP email sender initialized"
        );

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }

    fn build_transport(
        config: &SmtpConfig,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AppError::ConfigError(format!("Failed to create SMTP transport: {}", e)))?
            .port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let creds = Credentials::new(username.clone(), password.clone());
            builder = builder.credentials(creds);
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, content: EmailContent) -> Result<(), AppError> {
        let Some(transport) = &self.transport else {
            tracing::debug!("SMTP disabled, dropping outbound mail");
            return Ok(());
        };

        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| AppError::ConfigError(format!("Invalid from address: {}", e)))?;
        let to: Mailbox = content
            .to
            .parse()
            .map_err(|e| AppError::InvalidInput(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(&content.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.text_body)
            .map_err(|e| AppError::Internal(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Internal(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.transport.is_some()
    }
}
