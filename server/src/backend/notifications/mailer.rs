use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use crate::backend::config::SmtpConfig;

/// A plain text mail to a single recipient
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &MailMessage) -> Result<()>;
}

/// Sends mail through an SMTP relay using STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .context("Failed to create SMTP relay")?
            .port(config.port);

        if let Some(username) = &config.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.parse::<Mailbox>().context("Failed to parse MAIL_FROM")?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: &MailMessage) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse::<Mailbox>().context("Failed to parse recipient")?)
            .subject(mail.subject.clone())
            .body(mail.body.clone())
            .context("Failed to build email")?;

        self.transport
            .send(message)
            .await
            .context("Failed to send email")?;
        info!(target: "mail", to = %mail.to, subject = %mail.subject, "Mail sent");
        Ok(())
    }
}

/// Writes mails to the `mail` log channel instead of sending them
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &MailMessage) -> Result<()> {
        info!(
            target: "mail",
            to = %mail.to,
            subject = %mail.subject,
            body = %mail.body,
            "Mail not sent (no SMTP configured)"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps sent mails in memory; can be told to fail
    #[derive(Default)]
    pub struct MemoryMailer {
        pub sent: Mutex<Vec<MailMessage>>,
        pub fail: bool,
    }

    impl MemoryMailer {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<MailMessage> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for MemoryMailer {
        async fn send(&self, mail: &MailMessage) -> Result<()> {
            if self.fail {
                anyhow::bail!("SMTP connection refused");
            }
            self.sent.lock().unwrap().push(mail.clone());
            Ok(())
        }
    }
}
