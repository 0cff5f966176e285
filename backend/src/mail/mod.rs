//! Outgoing mail
//!
//! Password reset links are delivered through a [`Mailer`]. Delivery is best
//! effort: [`send_in_background`] detaches the send and only logs the
//! outcome.

use crate::config::{MailConfig, MailTls};
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use tracing::{error, info};

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Something that can deliver an [`OutgoingMail`]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

/// SMTP delivery through lettre
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let builder = match config.tls {
            MailTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?,
            MailTls::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            }
        };
        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.parse()?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html)?;

        let response = self.transport.send(message).await?;
        info!(code = %response.code(), "SMTP server accepted message");
        Ok(())
    }
}

/// Writes mail to the log instead of sending it. Used when SMTP is
/// disabled, e.g. in development.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.html, "Mail delivery disabled; logging message");
        Ok(())
    }
}

/// Pick the mailer for the configuration
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    if config.enabled {
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        Ok(Arc::new(LogMailer))
    }
}

/// Render the password reset email
pub fn password_reset_mail(to: &str, reset_link: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        html: format!(
            "<h1>Password Reset</h1>\n\
             <p>Click the link below to reset your password:</p>\n\
             <a href=\"{link}\">Reset Password</a>\n\
             <p>The link expires in one hour.</p>",
            link = reset_link
        ),
    }
}

/// Send without waiting for the result; failures are logged
pub fn send_in_background(mailer: Arc<dyn Mailer>, mail: OutgoingMail) {
    tokio::spawn(async move {
        let to = mail.to.clone();
        match mailer.send(mail).await {
            Ok(()) => info!(to = %to, "Password reset email sent"),
            Err(e) => error!(to = %to, error = %e, "Error sending email"),
        }
    });
}
