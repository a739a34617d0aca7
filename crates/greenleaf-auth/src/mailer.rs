//! Outbound mail for password resets

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;
use url::Url;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Message build error: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// A password-reset email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetEmail {
    pub to: String,
    pub name: String,
    pub link: Url,
}

impl ResetEmail {
    pub fn subject(&self) -> &'static str {
        "Reset your Green Leaf password"
    }

    pub fn body(&self) -> String {
        format!(
            "Hello {},\n\n\
             We received a request to reset your Green Leaf password.\n\
             Open the link below to choose a new one. It expires in one hour.\n\n\
             {}\n\n\
             If you did not ask for this, you can ignore this email.\n",
            self.name, self.link
        )
    }
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, email: &ResetEmail) -> Result<(), MailError>;
}

/// Writes the reset link to the log instead of sending mail (development)
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, email: &ResetEmail) -> Result<(), MailError> {
        info!(to = %email.to, link = %email.link, "Password reset email (not sent, log mailer)");
        Ok(())
    }
}

/// SMTP relay mailer
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        username: Option<String>,
        password: Option<String>,
        from: impl Into<String>,
    ) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.into(),
        })
    }

    fn build_message(&self, email: &ResetEmail) -> Result<Message, MailError> {
        Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e: lettre::address::AddressError| MailError::Address(e.to_string()))?)
            .subject(email.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(&self, email: &ResetEmail) -> Result<(), MailError> {
        let message = self.build_message(email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}
