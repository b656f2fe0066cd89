use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use super::{format_timestamp, parse_timestamp, DbConnection};
use crate::backend::domain::models::user::User;
use crate::backend::storage::traits::UserStorage;

/// Repository for user accounts
#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_user(row: &SqliteRow) -> Result<User> {
        Ok(User {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            api_token_hash: row.try_get("api_token_hash")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
        })
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!(
            "SELECT id, name, email, api_token_hash, created_at FROM users WHERE {} = ?",
            column
        );
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }
}

#[async_trait]
impl UserStorage for UserRepository {
    async fn store_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, api_token_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.api_token_hash)
        .bind(format_timestamp(user.created_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.find_one("id", user_id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        self.find_one("api_token_hash", token_hash).await
    }
}
