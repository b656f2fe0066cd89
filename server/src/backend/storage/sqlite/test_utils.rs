//! Fixtures shared by repository and service tests

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use shared::{BudgetPeriod, TransactionType};

use super::connection::DbConnection;
use crate::backend::domain::models::{
    budget::{period_end, Budget, DEFAULT_ALERT_THRESHOLD},
    category::Category,
    transaction::Transaction,
    user::User,
};
use crate::backend::storage::traits::{
    BudgetStorage, CategoryStorage, Connection, TransactionStorage, UserStorage,
};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// Store a user with the given id; the API token is the id itself
pub async fn create_test_user(db: &DbConnection, user_id: &str) -> Result<User> {
    let user = User {
        id: user_id.to_string(),
        name: format!("User {}", user_id),
        email: format!("{}@example.com", user_id),
        api_token_hash: User::hash_api_token(user_id),
        created_at: Utc::now(),
    };
    db.create_user_repository().store_user(&user).await?;
    Ok(user)
}

pub async fn create_test_category(
    db: &DbConnection,
    user_id: &str,
    name: &str,
    category_type: TransactionType,
) -> Result<Category> {
    let now = Utc::now();
    let category = Category {
        id: Category::generate_id(),
        user_id: user_id.to_string(),
        name: name.to_string(),
        category_type,
        color: None,
        icon: None,
        created_at: now,
        updated_at: now,
    };
    db.create_category_repository().store_category(&category).await?;
    Ok(category)
}

pub async fn create_test_transaction(
    db: &DbConnection,
    category: &Category,
    amount: f64,
    on: NaiveDate,
) -> Result<Transaction> {
    let now = Utc::now();
    let transaction = Transaction {
        id: Transaction::generate_id(),
        user_id: category.user_id.clone(),
        category_id: category.id.clone(),
        transaction_type: category.category_type,
        amount,
        description: None,
        date: on,
        created_at: now,
        updated_at: now,
    };
    db.create_transaction_repository().store_transaction(&transaction).await?;
    Ok(transaction)
}

/// Store a monthly budget starting on `start`
pub async fn create_test_budget(
    db: &DbConnection,
    category: &Category,
    amount: f64,
    start: NaiveDate,
) -> Result<Budget> {
    let now = Utc::now();
    let budget = Budget {
        id: Budget::generate_id(),
        user_id: category.user_id.clone(),
        category_id: category.id.clone(),
        amount,
        period: BudgetPeriod::Monthly,
        start_date: start,
        end_date: period_end(BudgetPeriod::Monthly, start),
        alert_threshold: DEFAULT_ALERT_THRESHOLD,
        notifications_enabled: true,
        recurring: false,
        created_at: now,
        updated_at: now,
    };
    db.create_budget_repository().store_budget(&budget).await?;
    Ok(budget)
}
