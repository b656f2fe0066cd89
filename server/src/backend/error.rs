//! # Error Types
//!
//! `AppError` is what domain services return and what REST handlers turn into
//! HTTP responses. Storage code keeps using `anyhow::Result`; the conversion
//! below recovers database errors so they can be logged on their own channel.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;

/// The main error type for domain and REST operations
#[derive(Error, Debug)]
pub enum AppError {
    /// Input failed a business rule
    #[error("{0}")]
    Validation(String),

    /// Entity not found (or not owned by the caller)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Entity clashes with existing data
    #[error("{0}")]
    Conflict(String),

    /// Missing or unknown API token
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// A write rejected by a UNIQUE constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// What the request-context middleware should log, if anything.
    /// Client mistakes (validation, missing entities, conflicts) are not reported.
    pub fn report(&self) -> Option<ReportedError> {
        match self {
            AppError::Database(err) => Some(ReportedError {
                channel: ErrorChannel::Database,
                message: err.to_string(),
                code: database_error_code(err),
            }),
            AppError::Unauthenticated => Some(ReportedError {
                channel: ErrorChannel::Auth,
                message: self.to_string(),
                code: None,
            }),
            AppError::Internal(err) => Some(ReportedError {
                channel: ErrorChannel::App,
                message: format!("{:#}", err),
                code: None,
            }),
            AppError::Validation(_) | AppError::NotFound { .. } | AppError::Conflict(_) => None,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<sqlx::Error>() {
            Ok(db_err) => return AppError::Database(db_err),
            Err(err) => err,
        };
        match err.downcast::<AppError>() {
            Ok(app_err) => app_err,
            Err(err) => AppError::Internal(err),
        }
    }
}

fn database_error_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.to_string()),
        sqlx::Error::RowNotFound => Some("row_not_found".to_string()),
        sqlx::Error::PoolTimedOut => Some("pool_timed_out".to_string()),
        _ => None,
    }
}

/// Log channel an error report is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorChannel {
    Database,
    Auth,
    App,
}

/// Error details attached to a response so the middleware can log them
/// together with the request context
#[derive(Debug, Clone)]
pub struct ReportedError {
    pub channel: ErrorChannel,
    pub message: String,
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "Server error".to_string()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(ErrorResponse { error: message })).into_response();
        if let Some(report) = self.report() {
            response.extensions_mut().insert(report);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::not_found("Budget", "abc");
        assert_eq!(err.to_string(), "Budget not found: abc");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_anyhow_recovers_database_error() {
        let err: anyhow::Error = anyhow::Error::new(sqlx::Error::RowNotFound).context("loading budget");
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Database(sqlx::Error::RowNotFound)));
        let report = app_err.report().unwrap();
        assert_eq!(report.channel, ErrorChannel::Database);
        assert_eq!(report.code.as_deref(), Some("row_not_found"));
    }

    #[test]
    fn test_anyhow_recovers_app_error() {
        let err = anyhow::Error::new(AppError::conflict("duplicate"));
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Conflict(_)));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let app_err: AppError = anyhow::anyhow!("disk on fire").into();
        assert!(matches!(app_err, AppError::Internal(_)));
        assert_eq!(app_err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app_err.report().unwrap().channel, ErrorChannel::App);
    }

    #[test]
    fn test_client_errors_are_not_reported() {
        assert!(AppError::validation("bad").report().is_none());
        assert!(AppError::not_found("Category", "x").report().is_none());
        assert!(AppError::conflict("dup").report().is_none());
        assert_eq!(
            AppError::Unauthenticated.report().unwrap().channel,
            ErrorChannel::Auth
        );
    }

    #[test]
    fn test_server_error_response_hides_details() {
        let response = AppError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<ReportedError>().is_some());
    }
}
