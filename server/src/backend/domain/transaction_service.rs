//! Transaction service domain logic.

use chrono::{Local, Utc};
use tracing::info;

use crate::backend::domain::commands::transactions::{
    CreateTransactionCommand, TransactionListQuery, TransactionListResult, UpdateTransactionCommand,
};
use crate::backend::domain::models::{
    category::Category,
    round_money,
    transaction::{Transaction, TransactionFilter},
};
use crate::backend::domain::observers::{ModelObserver, TransactionObserver};
use crate::backend::error::{AppError, AppResult};
use crate::backend::cache::CacheStore;
use crate::backend::storage::{CategoryStorage, Connection, TransactionStorage};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
const MAX_DESCRIPTION_LEN: usize = 256;

#[derive(Clone)]
pub struct TransactionService<C: Connection> {
    transaction_repository: C::TransactionRepository,
    category_repository: C::CategoryRepository,
    observer: TransactionObserver<C>,
}

impl<C: Connection> TransactionService<C> {
    pub fn new(connection: &C, cache: CacheStore) -> Self {
        Self {
            transaction_repository: connection.create_transaction_repository(),
            category_repository: connection.create_category_repository(),
            observer: TransactionObserver::new(cache, connection),
        }
    }

    /// Newest first, paginated with the id of the last row seen
    pub async fn list_transactions(&self, user_id: &str, query: TransactionListQuery) -> AppResult<TransactionListResult> {
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(AppError::validation("Limit must be between 1 and 100"));
        }
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            if start > end {
                return Err(AppError::validation("start_date must not be after end_date"));
            }
        }
        if let Some(after) = &query.after {
            if self
                .transaction_repository
                .get_transaction(user_id, after)
                .await?
                .is_none()
            {
                return Err(AppError::validation("Invalid pagination cursor"));
            }
        }

        // One extra row tells whether another page exists
        let filter = TransactionFilter {
            after: query.after,
            limit: limit + 1,
            start_date: query.start_date,
            end_date: query.end_date,
            category_id: query.category_id,
            transaction_type: query.transaction_type,
        };
        let mut transactions = self
            .transaction_repository
            .list_transactions(user_id, &filter)
            .await?;

        let has_more = transactions.len() > limit as usize;
        transactions.truncate(limit as usize);
        let next_cursor = if has_more {
            transactions.last().map(|t| t.id.clone())
        } else {
            None
        };

        Ok(TransactionListResult {
            transactions,
            has_more,
            next_cursor,
        })
    }

    pub async fn get_transaction(&self, user_id: &str, transaction_id: &str) -> AppResult<Transaction> {
        self.transaction_repository
            .get_transaction(user_id, transaction_id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction", transaction_id))
    }

    pub async fn create_transaction(
        &self,
        user_id: &str,
        command: CreateTransactionCommand,
    ) -> AppResult<Transaction> {
        let amount = validate_amount(command.amount)?;
        let description = validate_description(command.description)?;
        let category = self.owned_category(user_id, &command.category_id).await?;

        let now = Utc::now();
        let transaction = Transaction {
            id: Transaction::generate_id(),
            user_id: user_id.to_string(),
            category_id: category.id,
            transaction_type: category.category_type,
            amount,
            description,
            date: command.date.unwrap_or_else(|| Local::now().date_naive()),
            created_at: now,
            updated_at: now,
        };
        self.transaction_repository
            .store_transaction(&transaction)
            .await?;
        self.observer.created(&transaction).await;

        info!(
            target: "app",
            user_id,
            transaction_id = %transaction.id,
            amount = transaction.amount,
            "Transaction created"
        );
        Ok(transaction)
    }

    pub async fn update_transaction(
        &self,
        user_id: &str,
        transaction_id: &str,
        command: UpdateTransactionCommand,
    ) -> AppResult<Transaction> {
        let before = self.get_transaction(user_id, transaction_id).await?;
        let mut after = before.clone();

        if let Some(category_id) = &command.category_id {
            let category = self.owned_category(user_id, category_id).await?;
            after.category_id = category.id;
            after.transaction_type = category.category_type;
        }
        if let Some(amount) = command.amount {
            after.amount = validate_amount(amount)?;
        }
        if command.description.is_some() {
            after.description = validate_description(command.description)?;
        }
        if let Some(date) = command.date {
            after.date = date;
        }
        after.updated_at = Utc::now();

        self.transaction_repository
            .update_transaction(&after)
            .await?;
        self.observer.updated(&before, &after).await;
        Ok(after)
    }

    pub async fn delete_transaction(&self, user_id: &str, transaction_id: &str) -> AppResult<()> {
        let transaction = self.get_transaction(user_id, transaction_id).await?;
        self.transaction_repository
            .delete_transaction(user_id, transaction_id)
            .await?;
        self.observer.deleted(&transaction).await;

        info!(target: "app", user_id, transaction_id, "Transaction deleted");
        Ok(())
    }

    async fn owned_category(&self, user_id: &str, category_id: &str) -> AppResult<Category> {
        self.category_repository
            .get_category(user_id, category_id)
            .await?
            .ok_or_else(|| AppError::validation(format!("Unknown category: {}", category_id)))
    }
}

fn validate_amount(amount: f64) -> AppResult<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("Amount must be a positive number"));
    }
    let rounded = round_money(amount);
    if rounded <= 0.0 {
        return Err(AppError::validation("Amount must be at least 0.01"));
    }
    Ok(rounded)
}

/// Blank descriptions are stored as none
fn validate_description(description: Option<String>) -> AppResult<Option<String>> {
    let description = description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    if let Some(d) = &description {
        if d.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::validation("Description cannot exceed 256 characters"));
        }
    }
    Ok(description)
}
