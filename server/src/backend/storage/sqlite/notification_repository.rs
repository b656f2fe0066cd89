use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::NotificationKind;
use sqlx::{sqlite::SqliteRow, Row};

use super::{format_date, format_timestamp, parse_date, parse_enum, parse_timestamp, DbConnection};
use crate::backend::domain::models::notification::Notification;
use crate::backend::storage::traits::NotificationStorage;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, kind, budget_id, period_start, data, read_at, created_at";

/// Repository for the database notification channel
#[derive(Clone)]
pub struct NotificationRepository {
    db: DbConnection,
}

impl NotificationRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_notification(row: &SqliteRow) -> Result<Notification> {
        let data: &str = row.try_get("data")?;
        let read_at: Option<&str> = row.try_get("read_at")?;

        Ok(Notification {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            kind: parse_enum(row.try_get("kind")?)?,
            budget_id: row.try_get("budget_id")?,
            period_start: parse_date(row.try_get("period_start")?)?,
            data: serde_json::from_str(data).context("Invalid notification payload")?,
            read_at: read_at.map(parse_timestamp).transpose()?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }
}

#[async_trait]
impl NotificationStorage for NotificationRepository {
    async fn store_notification(&self, notification: &Notification) -> Result<()> {
        let data = serde_json::to_string(&notification.data)?;
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, kind, budget_id, period_start, data, read_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(notification.kind.as_str())
        .bind(&notification.budget_id)
        .bind(format_date(notification.period_start))
        .bind(data)
        .bind(notification.read_at.map(format_timestamp))
        .bind(format_timestamp(notification.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_notification(&self, user_id: &str, notification_id: &str) -> Result<Option<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = ? AND id = ?",
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(notification_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_notification).transpose()
    }

    async fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = ? {} ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS,
            if unread_only { "AND read_at IS NULL" } else { "" }
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn exists_for(&self, budget_id: &str, kind: NotificationKind, period_start: NaiveDate) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM notifications WHERE budget_id = ? AND kind = ? AND period_start = ?
            ) AS found
            "#,
        )
        .bind(budget_id)
        .bind(kind.as_str())
        .bind(format_date(period_start))
        .fetch_one(self.db.pool())
        .await?;

        Ok(row.try_get::<bool, _>("found")?)
    }

    async fn mark_read(&self, user_id: &str, notification_id: &str, read_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = ? WHERE user_id = ? AND id = ? AND read_at IS NULL",
        )
        .bind(format_timestamp(read_at))
        .bind(user_id)
        .bind(notification_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: &str, read_at: DateTime<Utc>) -> Result<u32> {
        let result = sqlx::query("UPDATE notifications SET read_at = ? WHERE user_id = ? AND read_at IS NULL")
            .bind(format_timestamp(read_at))
            .bind(user_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() as u32)
    }

    async fn unread_count(&self, user_id: &str) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM notifications WHERE user_id = ? AND read_at IS NULL")
            .bind(user_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(row.try_get::<i64, _>("count")? as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::sqlite::test_utils::{create_test_user, date};
    use shared::BudgetAlertData;

    fn notification(user_id: &str, kind: NotificationKind, period_start: NaiveDate) -> Notification {
        Notification {
            id: Notification::generate_id(),
            user_id: user_id.to_string(),
            kind,
            budget_id: "b1".to_string(),
            period_start,
            data: BudgetAlertData {
                budget_id: "b1".to_string(),
                category_name: "Їжа".to_string(),
                percentage: 85.0,
                spent: 425.0,
                amount: 500.0,
                level: "warning".to_string(),
            },
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_exists_for_budget_period() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let repo = NotificationRepository::new(db);

        let stored = notification("u1", NotificationKind::BudgetWarning, date(2025, 6, 1));
        repo.store_notification(&stored).await.unwrap();

        assert!(repo.exists_for("b1", NotificationKind::BudgetWarning, date(2025, 6, 1)).await.unwrap());
        assert!(!repo.exists_for("b1", NotificationKind::BudgetExceeded, date(2025, 6, 1)).await.unwrap());
        assert!(!repo.exists_for("b1", NotificationKind::BudgetWarning, date(2025, 7, 1)).await.unwrap());

        let loaded = repo.get_notification("u1", &stored.id).await.unwrap().unwrap();
        assert_eq!(loaded.data, stored.data);
    }

    #[tokio::test]
    async fn test_read_state() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let repo = NotificationRepository::new(db);

        let first = notification("u1", NotificationKind::BudgetWarning, date(2025, 6, 1));
        let second = notification("u1", NotificationKind::BudgetExceeded, date(2025, 6, 1));
        repo.store_notification(&first).await.unwrap();
        repo.store_notification(&second).await.unwrap();
        assert_eq!(repo.unread_count("u1").await.unwrap(), 2);

        assert!(repo.mark_read("u1", &first.id, Utc::now()).await.unwrap());
        assert!(!repo.mark_read("u1", &first.id, Utc::now()).await.unwrap());
        assert_eq!(repo.list_notifications("u1", true).await.unwrap().len(), 1);
        assert_eq!(repo.list_notifications("u1", false).await.unwrap().len(), 2);

        assert_eq!(repo.mark_all_read("u1", Utc::now()).await.unwrap(), 1);
        assert_eq!(repo.unread_count("u1").await.unwrap(), 0);
    }
}
