//! Conversions between the `shared` DTOs and domain types.
//!
//! Incoming dates arrive as `YYYY-MM-DD` strings; a malformed date is a
//! validation error (422), never a server error.

pub mod budget_mapper;
pub mod category_mapper;
pub mod dashboard_mapper;
pub mod notification_mapper;
pub mod transaction_mapper;
pub mod user_mapper;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::backend::error::{AppError, AppResult};

pub fn parse_date_field(field: &str, value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("{} must be a date in YYYY-MM-DD form", field)))
}

pub fn parse_optional_date(field: &str, value: Option<&str>) -> AppResult<Option<NaiveDate>> {
    value.map(|v| parse_date_field(field, v)).transpose()
}

pub fn date_to_dto(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn timestamp_to_dto(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
