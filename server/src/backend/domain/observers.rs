//! # Model Observers
//!
//! Hooks run by services after a repository write succeeded. They only
//! invalidate cache keys; a failed lookup is logged and never fails the write.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, error};

use crate::backend::cache::{keys, CacheStore};
use crate::backend::domain::models::{budget::Budget, category::Category, transaction::Transaction};
use crate::backend::storage::{BudgetStorage, Connection};

#[async_trait]
pub trait ModelObserver<M: Sync>: Send + Sync {
    async fn created(&self, model: &M);

    async fn updated(&self, before: &M, after: &M);

    async fn deleted(&self, model: &M);
}

#[derive(Clone)]
pub struct CategoryObserver {
    cache: CacheStore,
}

impl CategoryObserver {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    fn forget_for(&self, category: &Category) {
        let user_id = &category.user_id;
        self.cache.forget_many([
            keys::user_categories(user_id),
            keys::user_budgets(user_id),
            keys::user_dashboard(user_id),
        ]);
    }
}

#[async_trait]
impl ModelObserver<Category> for CategoryObserver {
    async fn created(&self, model: &Category) {
        self.forget_for(model);
    }

    async fn updated(&self, _before: &Category, after: &Category) {
        self.forget_for(after);
    }

    async fn deleted(&self, model: &Category) {
        self.forget_for(model);
    }
}

#[derive(Clone)]
pub struct BudgetObserver {
    cache: CacheStore,
}

impl BudgetObserver {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    fn forget_for(&self, budget: &Budget) {
        self.cache.forget_many([
            keys::user_budgets(&budget.user_id),
            keys::user_dashboard(&budget.user_id),
            keys::budget_progress(&budget.id),
        ]);
    }
}

#[async_trait]
impl ModelObserver<Budget> for BudgetObserver {
    async fn created(&self, model: &Budget) {
        self.forget_for(model);
    }

    async fn updated(&self, _before: &Budget, after: &Budget) {
        self.forget_for(after);
    }

    async fn deleted(&self, model: &Budget) {
        self.forget_for(model);
    }
}

/// Besides the user keys, forgets the progress of every budget whose range
/// contains the transaction
#[derive(Clone)]
pub struct TransactionObserver<C: Connection> {
    cache: CacheStore,
    budget_repository: C::BudgetRepository,
}

impl<C: Connection> TransactionObserver<C> {
    pub fn new(cache: CacheStore, connection: &C) -> Self {
        Self {
            cache,
            budget_repository: connection.create_budget_repository(),
        }
    }

    fn forget_user_keys(&self, user_id: &str) {
        self.cache
            .forget_many([keys::user_budgets(user_id), keys::user_dashboard(user_id)]);
    }

    async fn forget_budget_progress(&self, user_id: &str, category_id: &str, date: NaiveDate) {
        match self
            .budget_repository
            .list_for_category_on(user_id, category_id, date)
            .await
        {
            Ok(budgets) => {
                debug!(target: "app", category_id, %date, count = budgets.len(), "Forgetting budget progress");
                self.cache
                    .forget_many(budgets.iter().map(|b| keys::budget_progress(&b.id)));
            }
            Err(e) => {
                error!(target: "app", category_id, %date, error = %e, "Could not look up budgets to invalidate");
            }
        }
    }
}

#[async_trait]
impl<C: Connection> ModelObserver<Transaction> for TransactionObserver<C> {
    async fn created(&self, model: &Transaction) {
        self.forget_user_keys(&model.user_id);
        self.forget_budget_progress(&model.user_id, &model.category_id, model.date)
            .await;
    }

    async fn updated(&self, before: &Transaction, after: &Transaction) {
        self.forget_user_keys(&after.user_id);
        self.forget_budget_progress(&before.user_id, &before.category_id, before.date)
            .await;
        if before.category_id != after.category_id || before.date != after.date {
            self.forget_budget_progress(&after.user_id, &after.category_id, after.date)
                .await;
        }
    }

    async fn deleted(&self, model: &Transaction) {
        self.forget_user_keys(&model.user_id);
        self.forget_budget_progress(&model.user_id, &model.category_id, model.date)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::sqlite::test_utils::{
        create_test_budget, create_test_category, create_test_transaction, create_test_user, date,
    };
    use crate::backend::storage::DbConnection;
    use shared::TransactionType;
    use std::time::Duration;

    fn warm(cache: &CacheStore, keys: &[String]) {
        for key in keys {
            cache.put(key, &1);
        }
    }

    #[tokio::test]
    async fn test_category_observer_forgets_user_keys() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let category = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        let cache = CacheStore::new(Duration::from_secs(60));
        warm(
            &cache,
            &[
                keys::user_categories("u1"),
                keys::user_budgets("u1"),
                keys::user_dashboard("u1"),
                keys::user_categories("u2"),
            ],
        );

        CategoryObserver::new(cache.clone()).created(&category).await;

        assert!(!cache.has(&keys::user_categories("u1")));
        assert!(!cache.has(&keys::user_budgets("u1")));
        assert!(!cache.has(&keys::user_dashboard("u1")));
        assert!(cache.has(&keys::user_categories("u2")));
    }

    #[tokio::test]
    async fn test_budget_observer_forgets_progress() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let category = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        let budget = create_test_budget(&db, &category, 100.0, date(2025, 6, 1)).await.unwrap();
        let cache = CacheStore::new(Duration::from_secs(60));
        warm(
            &cache,
            &[
                keys::user_categories("u1"),
                keys::user_budgets("u1"),
                keys::budget_progress(&budget.id),
            ],
        );

        BudgetObserver::new(cache.clone()).deleted(&budget).await;

        assert!(cache.has(&keys::user_categories("u1")));
        assert!(!cache.has(&keys::user_budgets("u1")));
        assert!(!cache.has(&keys::budget_progress(&budget.id)));
    }

    #[tokio::test]
    async fn test_transaction_observer_forgets_matching_budget_progress() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let food = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        let june = create_test_budget(&db, &food, 100.0, date(2025, 6, 1)).await.unwrap();
        let july = create_test_budget(&db, &food, 100.0, date(2025, 7, 1)).await.unwrap();
        let cache = CacheStore::new(Duration::from_secs(60));
        warm(
            &cache,
            &[
                keys::user_dashboard("u1"),
                keys::budget_progress(&june.id),
                keys::budget_progress(&july.id),
            ],
        );
        let observer = TransactionObserver::new(cache.clone(), &db);

        let transaction = create_test_transaction(&db, &food, 10.0, date(2025, 6, 15)).await.unwrap();
        observer.created(&transaction).await;

        assert!(!cache.has(&keys::user_dashboard("u1")));
        assert!(!cache.has(&keys::budget_progress(&june.id)));
        assert!(cache.has(&keys::budget_progress(&july.id)));
    }

    #[tokio::test]
    async fn test_transaction_update_forgets_old_and_new_budget() {
        let db = DbConnection::init_test().await.unwrap();
        create_test_user(&db, "u1").await.unwrap();
        let food = create_test_category(&db, "u1", "Food", TransactionType::Expense).await.unwrap();
        let june = create_test_budget(&db, &food, 100.0, date(2025, 6, 1)).await.unwrap();
        let july = create_test_budget(&db, &food, 100.0, date(2025, 7, 1)).await.unwrap();
        let cache = CacheStore::new(Duration::from_secs(60));
        warm(
            &cache,
            &[keys::budget_progress(&june.id), keys::budget_progress(&july.id)],
        );
        let observer = TransactionObserver::new(cache.clone(), &db);

        let before = create_test_transaction(&db, &food, 10.0, date(2025, 6, 15)).await.unwrap();
        let mut after = before.clone();
        after.date = date(2025, 7, 2);
        observer.updated(&before, &after).await;

        assert!(!cache.has(&keys::budget_progress(&june.id)));
        assert!(!cache.has(&keys::budget_progress(&july.id)));
    }
}
