use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::{format_timestamp, DbConnection};
use crate::backend::storage::traits::LockStorage;

/// Scheduler locks kept in the shared database
#[derive(Clone)]
pub struct LockRepository {
    db: DbConnection,
}

impl LockRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LockStorage for LockRepository {
    async fn try_acquire(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl).context("Lock ttl out of range")?;

        // Single statement: insert, or take over a lock that has expired
        let result = sqlx::query(
            r#"
            INSERT INTO scheduler_locks (name, owner, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE
                SET owner = excluded.owner, expires_at = excluded.expires_at
                WHERE scheduler_locks.expires_at <= ?
            "#,
        )
        .bind(name)
        .bind(owner)
        .bind(format_timestamp(now + ttl))
        .bind(format_timestamp(now))
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, name: &str, owner: &str) -> Result<()> {
        sqlx::query("DELETE FROM scheduler_locks WHERE name = ? AND owner = ?")
            .bind(name)
            .bind(owner)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }
}
