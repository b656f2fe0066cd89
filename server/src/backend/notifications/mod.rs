//! # Notifications
//!
//! Budget alerts and the mail transport they are delivered with. Delivery
//! itself (database channel first, then mail) is done by
//! [`crate::backend::domain::notification_service::NotificationService`].

pub mod budget_alert;
pub mod mailer;

pub use budget_alert::{AlertLevel, BudgetAlert};
pub use mailer::{LogMailer, MailMessage, Mailer, SmtpMailer};

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::backend::config::Config;

/// SMTP when configured, otherwise mails only go to the log
pub fn mailer_from_config(config: &Config) -> Result<Arc<dyn Mailer>> {
    match &config.smtp {
        Some(smtp) => {
            info!(target: "mail", host = %smtp.host, port = smtp.port, "Using SMTP mailer");
            Ok(Arc::new(SmtpMailer::new(smtp, &config.mail_from)?))
        }
        None => {
            info!(target: "mail", "SMTP_HOST not set, mails are written to the log");
            Ok(Arc::new(LogMailer))
        }
    }
}
