use chrono::Utc;
use tracing::info;

use crate::backend::cache::{keys, CacheStore};
use crate::backend::domain::commands::categories::{CreateCategoryCommand, UpdateCategoryCommand};
use crate::backend::domain::models::category::Category;
use crate::backend::domain::observers::{CategoryObserver, ModelObserver};
use crate::backend::error::{AppError, AppResult};
use crate::backend::storage::{BudgetStorage, CategoryStorage, Connection, TransactionStorage};

const MAX_NAME_LEN: usize = 100;
const MAX_ICON_LEN: usize = 50;

#[derive(Clone)]
pub struct CategoryService<C: Connection> {
    category_repository: C::CategoryRepository,
    transaction_repository: C::TransactionRepository,
    budget_repository: C::BudgetRepository,
    cache: CacheStore,
    observer: CategoryObserver,
}

impl<C: Connection> CategoryService<C> {
    pub fn new(connection: &C, cache: CacheStore) -> Self {
        Self {
            category_repository: connection.create_category_repository(),
            transaction_repository: connection.create_transaction_repository(),
            budget_repository: connection.create_budget_repository(),
            observer: CategoryObserver::new(cache.clone()),
            cache,
        }
    }

    pub async fn list_categories(&self, user_id: &str) -> AppResult<Vec<Category>> {
        self.cache
            .remember(&keys::user_categories(user_id), || async {
                Ok::<_, AppError>(self.category_repository.list_categories(user_id).await?)
            })
            .await
    }

    pub async fn get_category(&self, user_id: &str, category_id: &str) -> AppResult<Category> {
        self.category_repository
            .get_category(user_id, category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category", category_id))
    }

    pub async fn create_category(&self, user_id: &str, command: CreateCategoryCommand) -> AppResult<Category> {
        let name = validate_name(&command.name)?;
        validate_color(command.color.as_deref())?;
        validate_icon(command.icon.as_deref())?;
        self.ensure_unique_name(user_id, &name, None).await?;

        let now = Utc::now();
        let category = Category {
            id: Category::generate_id(),
            user_id: user_id.to_string(),
            name,
            category_type: command.category_type,
            color: command.color,
            icon: command.icon,
            created_at: now,
            updated_at: now,
        };
        self.category_repository.store_category(&category).await?;
        self.observer.created(&category).await;

        info!(target: "app", user_id, category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: &str,
        command: UpdateCategoryCommand,
    ) -> AppResult<Category> {
        let before = self.get_category(user_id, category_id).await?;
        let mut after = before.clone();

        if let Some(name) = &command.name {
            let name = validate_name(name)?;
            self.ensure_unique_name(user_id, &name, Some(category_id)).await?;
            after.name = name;
        }
        if command.color.is_some() {
            validate_color(command.color.as_deref())?;
            after.color = command.color;
        }
        if command.icon.is_some() {
            validate_icon(command.icon.as_deref())?;
            after.icon = command.icon;
        }
        after.updated_at = Utc::now();

        self.category_repository.update_category(&after).await?;
        self.observer.updated(&before, &after).await;
        Ok(after)
    }

    /// Categories still referenced by transactions or budgets are kept
    pub async fn delete_category(&self, user_id: &str, category_id: &str) -> AppResult<()> {
        let category = self.get_category(user_id, category_id).await?;

        let transactions = self
            .transaction_repository
            .count_for_category(user_id, category_id)
            .await?;
        let budgets = self
            .budget_repository
            .count_for_category(user_id, category_id)
            .await?;
        if transactions > 0 || budgets > 0 {
            return Err(AppError::conflict(format!(
                "Category is used by {} transaction(s) and {} budget(s)",
                transactions, budgets
            )));
        }

        self.category_repository
            .delete_category(user_id, category_id)
            .await?;
        self.observer.deleted(&category).await;

        info!(target: "app", user_id, category_id, "Category deleted");
        Ok(())
    }

    async fn ensure_unique_name(&self, user_id: &str, name: &str, except_id: Option<&str>) -> AppResult<()> {
        let wanted = name.to_lowercase();
        let taken = self
            .category_repository
            .list_categories(user_id)
            .await?
            .into_iter()
            .any(|c| Some(c.id.as_str()) != except_id && c.name.to_lowercase() == wanted);

        if taken {
            return Err(AppError::conflict(format!("Category '{}' already exists", name)));
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("Category name must be between 1 and 100 characters"));
    }
    Ok(name.to_string())
}

fn validate_color(color: Option<&str>) -> AppResult<()> {
    match color {
        Some(color) if !Category::is_valid_color(color) => {
            Err(AppError::validation("Color must be in #RRGGBB format"))
        }
        _ => Ok(()),
    }
}

fn validate_icon(icon: Option<&str>) -> AppResult<()> {
    match icon {
        Some(icon) if icon.chars().count() > MAX_ICON_LEN => {
            Err(AppError::validation("Icon cannot exceed 50 characters"))
        }
        _ => Ok(()),
    }
}
