use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shared::TransactionType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub transaction_type: TransactionType,
    /// Always positive; the type carries the direction
    pub amount: f64,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Filters for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub after: Option<String>,
    pub limit: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<String>,
    pub transaction_type: Option<TransactionType>,
}
