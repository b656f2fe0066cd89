use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row};

use super::{format_timestamp, parse_enum, parse_timestamp, DbConnection};
use crate::backend::domain::models::category::Category;
use crate::backend::storage::traits::CategoryStorage;

const CATEGORY_COLUMNS: &str =
    "id, user_id, name, category_type, color, icon, created_at, updated_at";

/// Repository for categories
#[derive(Clone)]
pub struct CategoryRepository {
    db: DbConnection,
}

impl CategoryRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    fn row_to_category(row: &SqliteRow) -> Result<Category> {
        Ok(Category {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            category_type: parse_enum(row.try_get("category_type")?)?,
            color: row.try_get("color")?,
            icon: row.try_get("icon")?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
        })
    }
}

#[async_trait]
impl CategoryStorage for CategoryRepository {
    async fn store_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, user_id, name, category_type, color, icon, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.user_id)
        .bind(&category.name)
        .bind(category.category_type.to_string())
        .bind(&category.color)
        .bind(&category.icon)
        .bind(format_timestamp(category.created_at))
        .bind(format_timestamp(category.updated_at))
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn get_category(&self, user_id: &str, category_id: &str) -> Result<Option<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE user_id = ? AND id = ?",
            CATEGORY_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(category_id)
            .fetch_optional(self.db.pool())
            .await?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let sql = format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY name COLLATE NOCASE ASC, id ASC",
            CATEGORY_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.iter().map(Self::row_to_category).collect()
    }

    async fn update_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE categories
            SET name = ?, color = ?, icon = ?, updated_at = ?
            WHERE user_id = ? AND id = ?
            "#,
        )
        .bind(&category.name)
        .bind(&category.color)
        .bind(&category.icon)
        .bind(format_timestamp(category.updated_at))
        .bind(&category.user_id)
        .bind(&category.id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn delete_category(&self, user_id: &str, category_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE user_id = ? AND id = ?")
            .bind(user_id)
            .bind(category_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::sqlite::test_utils::{create_test_category, create_test_user};
    use shared::TransactionType;

    #[tokio::test]
    async fn test_categories_are_scoped_to_user() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        create_test_user(&db, "u2").await.unwrap();
        let food = create_test_category(&db, "u1", "food", TransactionType::Expense).await.unwrap();
        create_test_category(&db, "u2", "Salary", TransactionType::Income).await.unwrap();
        let repo = CategoryRepository::new(db);

        assert!(repo.get_category("u2", &food.id).await.unwrap().is_none());
        assert_eq!(repo.get_category("u1", &food.id).await.unwrap().unwrap(), food);
        assert_eq!(repo.list_categories("u1").await.unwrap().len(), 1);
        assert!(!repo.delete_category("u2", &food.id).await.unwrap());
        assert!(repo.delete_category("u1", &food.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_orders_by_name_ignoring_case() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        create_test_category(&db, "u1", "travel", TransactionType::Expense).await.unwrap();
        create_test_category(&db, "u1", "Bills", TransactionType::Expense).await.unwrap();
        create_test_category(&db, "u1", "groceries", TransactionType::Expense).await.unwrap();
        let repo = CategoryRepository::new(db);

        let names: Vec<String> = repo
            .list_categories("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Bills", "groceries", "travel"]);
    }

    #[tokio::test]
    async fn test_update_category() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let mut category = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        let repo = CategoryRepository::new(db);

        category.name = "Groceries".to_string();
        category.color = Some("#00ff00".to_string());
        repo.update_category(&category).await.unwrap();

        let stored = repo.get_category("u1", &category.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Groceries");
        assert_eq!(stored.color.as_deref(), Some("#00ff00"));
    }
}
