use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use super::{format_date, format_timestamp, parse_date, parse_enum, parse_timestamp, DbConnection};
use crate::backend::domain::models::budget::Budget;
use crate::backend::storage::traits::BudgetStorage;

const BUDGET_COLUMNS: &str = "id, user_id, category_id, amount, period, start_date, end_date, \
     alert_threshold, notifications_enabled, recurring, created_at, updated_at";

/// Repository for budgets
#[derive(Clone)]
pub struct BudgetRepository {
    db: DbConnection,
}

impl BudgetRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_budget(row: &SqliteRow) -> Result<Budget> {
        Ok(Budget {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            category_id: row.try_get("category_id")?,
            amount: row.try_get("amount")?,
            period: parse_enum(row.try_get("period")?)?,
            start_date: parse_date(row.try_get("start_date")?)?,
            end_date: parse_date(row.try_get("end_date")?)?,
            alert_threshold: row.try_get("alert_threshold")?,
            notifications_enabled: row.try_get("notifications_enabled")?,
            recurring: row.try_get("recurring")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
        })
    }

    async fn fetch(&self, mut query: QueryBuilder<'_, Sqlite>) -> Result<Vec<Budget>> {
        let rows = query.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_budget).collect()
    }

    fn select() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!("SELECT {} FROM budgets WHERE 1 = 1", BUDGET_COLUMNS))
    }
}

#[async_trait]
impl BudgetStorage for BudgetRepository {
    async fn store_budget(&self, budget: &Budget) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO budgets (id, user_id, category_id, amount, period, start_date, end_date,
                                 alert_threshold, notifications_enabled, recurring, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&budget.id)
        .bind(&budget.user_id)
        .bind(&budget.category_id)
        .bind(budget.amount)
        .bind(budget.period.to_string())
        .bind(format_date(budget.start_date))
        .bind(format_date(budget.end_date))
        .bind(budget.alert_threshold)
        .bind(budget.notifications_enabled)
        .bind(budget.recurring)
        .bind(format_timestamp(budget.created_at))
        .bind(format_timestamp(budget.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_budget(&self, user_id: &str, budget_id: &str) -> Result<Option<Budget>> {
        let sql = format!(
            "SELECT {} FROM budgets WHERE user_id = ? AND id = ?",
            BUDGET_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(budget_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_budget).transpose()
    }

    async fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>> {
        let mut query = Self::select();
        query.push(" AND user_id = ").push_bind(user_id.to_string());
        query.push(" ORDER BY start_date DESC, created_at DESC");
        self.fetch(query).await
    }

    async fn update_budget(&self, budget: &Budget) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE budgets
            SET amount = ?, start_date = ?, end_date = ?, alert_threshold = ?,
                notifications_enabled = ?, recurring = ?, updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(budget.amount)
        .bind(format_date(budget.start_date))
        .bind(format_date(budget.end_date))
        .bind(budget.alert_threshold)
        .bind(budget.notifications_enabled)
        .bind(budget.recurring)
        .bind(format_timestamp(budget.updated_at))
        .bind(&budget.user_id)
        .bind(&budget.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM budgets WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(budget_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_active_on(&self, date: NaiveDate) -> Result<Vec<Budget>> {
        let day = format_date(date);
        let mut query = Self::select();
        query.push(" AND start_date <= ").push_bind(day.clone());
        query.push(" AND end_date >= ").push_bind(day);
        query.push(" ORDER BY user_id, start_date");
        self.fetch(query).await
    }

    async fn find_overlapping(
        &self,
        user_id: &str,
        category_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Vec<Budget>> {
        let mut query = Self::select();
        query.push(" AND user_id = ").push_bind(user_id.to_string());
        query.push(" AND category_id = ").push_bind(category_id.to_string());
        query.push(" AND start_date <= ").push_bind(format_date(end));
        query.push(" AND end_date >= ").push_bind(format_date(start));
        if let Some(exclude_id) = exclude_id {
            query.push(" AND id <> ").push_bind(exclude_id.to_string());
        }
        self.fetch(query).await
    }

    async fn list_for_category_on(&self, user_id: &str, category_id: &str, date: NaiveDate) -> Result<Vec<Budget>> {
        self.find_overlapping(user_id, category_id, date, date, None).await
    }

    async fn list_expired_recurring(&self, date: NaiveDate) -> Result<Vec<Budget>> {
        let mut query = Self::select();
        query.push(" AND recurring = 1 AND end_date < ").push_bind(format_date(date));
        query.push(" ORDER BY end_date ASC");
        self.fetch(query).await
    }

    async fn count_for_category(&self, user_id: &str, category_id: &str) -> Result<u32> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM budgets WHERE user_id = ? AND category_id = ?")
            .bind(user_id)
            .bind(category_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(row.try_get::<i64, _>("count")? as u32)
    }
}
