//! # SQLite Storage
//!
//! Repositories built on `sqlx`. Dates are stored as `YYYY-MM-DD` text and
//! timestamps as fixed-width RFC 3339 text so both sort correctly as strings.

pub mod budget_repository;
pub mod category_repository;
pub mod connection;
pub mod lock_repository;
pub mod notification_repository;
pub mod transaction_repository;
pub mod user_repository;

#[cfg(test)]
pub mod test_utils;

pub use budget_repository::BudgetRepository;
pub use category_repository::CategoryRepository;
pub use connection::DbConnection;
pub use lock_repository::LockRepository;
pub use notification_repository::NotificationRepository;
pub use transaction_repository::TransactionRepository;
pub use user_repository::UserRepository;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .with_context(|| format!("Invalid stored date: {}", value))
}

pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("Invalid stored timestamp: {}", value))
}

/// Parse one of the `shared` enums from its stored string form
pub(crate) fn parse_enum<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse::<T>().map_err(|e| anyhow!(e))
}
