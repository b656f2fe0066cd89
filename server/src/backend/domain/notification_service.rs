use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use shared::NotificationKind;
use tracing::{error, info, warn};

use crate::backend::domain::models::notification::Notification;
use crate::backend::error::{AppError, AppResult};
use crate::backend::notifications::{BudgetAlert, Mailer};
use crate::backend::storage::{Connection, NotificationStorage, UserStorage};

/// Delivers budget alerts over the database and mail channels
#[derive(Clone)]
pub struct NotificationService<C: Connection> {
    notification_repository: C::NotificationRepository,
    user_repository: C::UserRepository,
    mailer: Arc<dyn Mailer>,
    app_url: String,
}

impl<C: Connection> NotificationService<C> {
    pub fn new(connection: &C, mailer: Arc<dyn Mailer>, app_url: impl Into<String>) -> Self {
        Self {
            notification_repository: connection.create_notification_repository(),
            user_repository: connection.create_user_repository(),
            mailer,
            app_url: app_url.into(),
        }
    }

    /// Whether an alert of this kind already went out for the budget period
    pub async fn already_sent(&self, budget_id: &str, kind: NotificationKind, period_start: NaiveDate) -> AppResult<bool> {
        Ok(self
            .notification_repository
            .exists_for(budget_id, kind, period_start)
            .await?)
    }

    /// Store the alert, then mail it. A mail failure is logged and does not
    /// undo the stored notification.
    pub async fn deliver(&self, user_id: &str, alert: &BudgetAlert, period_start: NaiveDate) -> AppResult<Notification> {
        let notification = Notification {
            id: Notification::generate_id(),
            user_id: user_id.to_string(),
            kind: alert.kind(),
            budget_id: alert.budget_id.clone(),
            period_start,
            data: alert.to_data(),
            read_at: None,
            created_at: Utc::now(),
        };
        self.notification_repository
            .store_notification(&notification)
            .await?;

        match self.user_repository.get_user(user_id).await {
            Ok(Some(user)) => {
                let mail = alert.to_mail(&user.email, &user.name, &self.app_url);
                if let Err(e) = self.mailer.send(&mail).await {
                    error!(
                        target: "mail",
                        user_id,
                        budget_id = %alert.budget_id,
                        kind = alert.kind().as_str(),
                        error = %format!("{:#}", e),
                        "Budget alert mail failed"
                    );
                }
            }
            Ok(None) => warn!(target: "mail", user_id, "No user to mail budget alert to"),
            Err(e) => error!(target: "mail", user_id, error = %e, "Could not load alert recipient"),
        }

        info!(
            target: "app",
            user_id,
            budget_id = %alert.budget_id,
            kind = alert.kind().as_str(),
            "Budget alert delivered"
        );
        Ok(notification)
    }

    /// Notifications newest first, with the user's unread count
    pub async fn list_notifications(&self, user_id: &str, unread_only: bool) -> AppResult<(Vec<Notification>, u32)> {
        let notifications = self
            .notification_repository
            .list_notifications(user_id, unread_only)
            .await?;
        let unread = self.notification_repository.unread_count(user_id).await?;
        Ok((notifications, unread))
    }

    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<Notification> {
        let mut notification = self
            .notification_repository
            .get_notification(user_id, notification_id)
            .await?
            .ok_or_else(|| AppError::not_found("Notification", notification_id))?;

        if notification.read_at.is_none() {
            let now = Utc::now();
            self.notification_repository
                .mark_read(user_id, notification_id, now)
                .await?;
            notification.read_at = Some(now);
        }
        Ok(notification)
    }

    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u32> {
        Ok(self
            .notification_repository
            .mark_all_read(user_id, Utc::now())
            .await?)
    }
}
