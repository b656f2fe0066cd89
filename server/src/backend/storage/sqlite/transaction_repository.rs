use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::TransactionType;
use sqlx::{sqlite::SqliteRow, QueryBuilder, Row, Sqlite};

use super::{format_date, format_timestamp, parse_date, parse_enum, parse_timestamp, DbConnection};
use crate::backend::domain::models::transaction::{Transaction, TransactionFilter};
use crate::backend::storage::traits::TransactionStorage;

const TRANSACTION_COLUMNS: &str =
    "id, user_id, category_id, transaction_type, amount, description, date, created_at, updated_at";

/// Repository for transaction operations
#[derive(Clone)]
pub struct TransactionRepository {
    db: DbConnection,
}

impl TransactionRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_transaction(row: &SqliteRow) -> Result<Transaction> {
        Ok(Transaction {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            category_id: row.try_get("category_id")?,
            transaction_type: parse_enum(row.try_get("transaction_type")?)?,
            amount: row.try_get("amount")?,
            description: row.try_get("description")?,
            date: parse_date(row.try_get("date")?)?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
        })
    }
}

#[async_trait]
impl TransactionStorage for TransactionRepository {
    async fn store_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, category_id, transaction_type, amount, description, date, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.user_id)
        .bind(&transaction.category_id)
        .bind(transaction.transaction_type.to_string())
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(format_date(transaction.date))
        .bind(format_timestamp(transaction.created_at))
        .bind(format_timestamp(transaction.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Option<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE user_id = ? AND id = ?",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(transaction_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    async fn list_transactions(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM transactions WHERE user_id = ",
            TRANSACTION_COLUMNS
        ));
        query.push_bind(user_id);

        if let Some(start) = filter.start_date {
            query.push(" AND date >= ").push_bind(format_date(start));
        }
        if let Some(end) = filter.end_date {
            query.push(" AND date <= ").push_bind(format_date(end));
        }
        if let Some(category_id) = &filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id.clone());
        }
        if let Some(transaction_type) = filter.transaction_type {
            query
                .push(" AND transaction_type = ")
                .push_bind(transaction_type.to_string());
        }
        if let Some(after) = &filter.after {
            // Rows strictly after the cursor in (date, created_at, id) descending order
            query
                .push(" AND (date, created_at, id) < (SELECT date, created_at, id FROM transactions WHERE user_id = ")
                .push_bind(user_id)
                .push(" AND id = ")
                .push_bind(after.clone())
                .push(")");
        }

        query
            .push(" ORDER BY date DESC, created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit as i64);

        let rows = query.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn list_transactions_chronological(
        &self,
        user_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM transactions WHERE user_id = ",
            TRANSACTION_COLUMNS
        ));
        query.push_bind(user_id);

        if let Some(start) = start_date {
            query.push(" AND date >= ").push_bind(format_date(start));
        }
        if let Some(end) = end_date {
            query.push(" AND date <= ").push_bind(format_date(end));
        }
        query.push(" ORDER BY date ASC, created_at ASC, id ASC");

        let rows = query.build().fetch_all(self.db.pool()).await?;
        rows.iter().map(Self::row_to_transaction).collect()
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE transactions
            SET category_id = ?, transaction_type = ?, amount = ?, description = ?, date = ?, updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(&transaction.category_id)
        .bind(transaction.transaction_type.to_string())
        .bind(transaction.amount)
        .bind(&transaction.description)
        .bind(format_date(transaction.date))
        .bind(format_timestamp(transaction.updated_at))
        .bind(&transaction.user_id)
        .bind(&transaction.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(transaction_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn sum_amount(
        &self,
        user_id: &str,
        category_id: Option<&str>,
        transaction_type: TransactionType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COALESCE(SUM(amount), 0.0) AS total FROM transactions WHERE user_id = ",
        );
        query.push_bind(user_id);
        query
            .push(" AND transaction_type = ")
            .push_bind(transaction_type.to_string());
        query.push(" AND date >= ").push_bind(format_date(start));
        query.push(" AND date <= ").push_bind(format_date(end));
        if let Some(category_id) = category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }

        let row = query.build().fetch_one(self.db.pool()).await?;
        Ok(row.try_get::<f64, _>("total")?)
    }

    async fn count_for_category(&self, user_id: &str, category_id: &str) -> Result<u32> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM transactions WHERE user_id = ? AND category_id = ?",
        )
        .bind(user_id)
        .bind(category_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(row.try_get::<i64, _>("count")? as u32)
    }
}
