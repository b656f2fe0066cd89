//! # Storage Traits
//!
//! Storage abstraction used by the domain layer. The SQLite repositories in
//! [`super::sqlite`] implement every trait; a [`Connection`] hands them out.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use shared::{NotificationKind, TransactionType};

use crate::backend::domain::models::{
    budget::Budget,
    category::Category,
    notification::Notification,
    transaction::{Transaction, TransactionFilter},
    user::User,
};

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn store_user(&self, user: &User) -> Result<()>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Look up the owner of an API token by the token's SHA-256 digest
    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait CategoryStorage: Send + Sync {
    async fn store_category(&self, category: &Category) -> Result<()>;

    async fn get_category(&self, user_id: &str, category_id: &str) -> Result<Option<Category>>;

    /// All categories of a user ordered by name
    async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>>;

    async fn update_category(&self, category: &Category) -> Result<()>;

    /// Returns true if the category was found and deleted
    async fn delete_category(&self, user_id: &str, category_id: &str) -> Result<bool>;
}

#[async_trait]
pub trait TransactionStorage: Send + Sync {
    async fn store_transaction(&self, transaction: &Transaction) -> Result<()>;

    async fn get_transaction(&self, user_id: &str, transaction_id: &str) -> Result<Option<Transaction>>;

    /// List transactions newest first (date, created_at, id descending).
    /// `filter.after` is the id of the last transaction of the previous page
    /// and must belong to the user. Returns at most `filter.limit` rows.
    async fn list_transactions(&self, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>>;

    /// Transactions in chronological order with optional date bounds (inclusive)
    async fn list_transactions_chronological(
        &self,
        user_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>>;

    async fn update_transaction(&self, transaction: &Transaction) -> Result<()>;

    async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> Result<bool>;

    /// Sum of amounts of the given type within `start..=end`, optionally
    /// restricted to a single category
    async fn sum_amount(
        &self,
        user_id: &str,
        category_id: Option<&str>,
        transaction_type: TransactionType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<f64>;

    async fn count_for_category(&self, user_id: &str, category_id: &str) -> Result<u32>;
}

#[async_trait]
pub trait BudgetStorage: Send + Sync {
    async fn store_budget(&self, budget: &Budget) -> Result<()>;

    async fn get_budget(&self, user_id: &str, budget_id: &str) -> Result<Option<Budget>>;

    /// All budgets of a user, most recent period first
    async fn list_budgets(&self, user_id: &str) -> Result<Vec<Budget>>;

    async fn update_budget(&self, budget: &Budget) -> Result<()>;

    async fn delete_budget(&self, user_id: &str, budget_id: &str) -> Result<bool>;

    /// Budgets of every user whose range contains `date`
    async fn list_active_on(&self, date: NaiveDate) -> Result<Vec<Budget>>;

    /// Budgets of the category whose range intersects `start..=end`
    async fn find_overlapping(
        &self,
        user_id: &str,
        category_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<&str>,
    ) -> Result<Vec<Budget>>;

    /// Budgets of the category whose range contains `date`
    async fn list_for_category_on(&self, user_id: &str, category_id: &str, date: NaiveDate) -> Result<Vec<Budget>>;

    /// Recurring budgets of every user that ended before `date`
    async fn list_expired_recurring(&self, date: NaiveDate) -> Result<Vec<Budget>>;

    async fn count_for_category(&self, user_id: &str, category_id: &str) -> Result<u32>;
}

#[async_trait]
pub trait NotificationStorage: Send + Sync {
    async fn store_notification(&self, notification: &Notification) -> Result<()>;

    async fn get_notification(&self, user_id: &str, notification_id: &str) -> Result<Option<Notification>>;

    /// Newest first
    async fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>>;

    /// Whether an alert of this kind was already stored for the budget period
    async fn exists_for(&self, budget_id: &str, kind: NotificationKind, period_start: NaiveDate) -> Result<bool>;

    /// Set `read_at` if still unread; returns true if a row changed
    async fn mark_read(&self, user_id: &str, notification_id: &str, read_at: DateTime<Utc>) -> Result<bool>;

    /// Returns the number of notifications that changed
    async fn mark_all_read(&self, user_id: &str, read_at: DateTime<Utc>) -> Result<u32>;

    async fn unread_count(&self, user_id: &str) -> Result<u32>;
}

/// Named locks with an owner and an expiry, shared by every server node
#[async_trait]
pub trait LockStorage: Send + Sync {
    /// Take the lock unless another owner holds an unexpired one.
    /// Expired locks are reclaimed. Returns true when acquired.
    async fn try_acquire(&self, name: &str, owner: &str, ttl: Duration) -> Result<bool>;

    /// Release the lock if `owner` holds it
    async fn release(&self, name: &str, owner: &str) -> Result<()>;
}

/// Storage connection that creates repositories.
///
/// The domain layer is generic over this trait so services never name a
/// concrete backend.
pub trait Connection: Send + Sync + Clone + 'static {
    type UserRepository: UserStorage + Clone + 'static;
    type CategoryRepository: CategoryStorage + Clone + 'static;
    type TransactionRepository: TransactionStorage + Clone + 'static;
    type BudgetRepository: BudgetStorage + Clone + 'static;
    type NotificationRepository: NotificationStorage + Clone + 'static;
    type LockRepository: LockStorage + Clone + 'static;

    fn create_user_repository(&self) -> Self::UserRepository;
    fn create_category_repository(&self) -> Self::CategoryRepository;
    fn create_transaction_repository(&self) -> Self::TransactionRepository;
    fn create_budget_repository(&self) -> Self::BudgetRepository;
    fn create_notification_repository(&self) -> Self::NotificationRepository;
    fn create_lock_repository(&self) -> Self::LockRepository;
}
