//! # REST API
//!
//! Every endpoint lives under `/api`. Each `*_apis` module exposes a
//! `router()` that [`crate::backend::create_router`] nests or merges.
//! Handlers return [`AppResult`](crate::backend::error::AppResult), so
//! failures become `{"error": "..."}` bodies with the matching status.

pub mod auth;
pub mod budget_apis;
pub mod category_apis;
pub mod dashboard_apis;
pub mod export_apis;
pub mod extract;
pub mod logging_apis;
pub mod mappers;
pub mod notification_apis;
pub mod request_context;
pub mod transaction_apis;
pub mod user_apis;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::backend::AppState;

/// All API routes, without the `/api` prefix
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(user_apis::router())
        .merge(logging_apis::router())
        .nest("/categories", category_apis::router())
        .nest("/transactions", transaction_apis::router())
        .nest("/budgets", budget_apis::router())
        .nest("/dashboard", dashboard_apis::router())
        .nest("/notifications", notification_apis::router())
        .nest("/export", export_apis::router())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}


#[cfg(test)]
mod tests {
    use super::test_support::TestApp;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = TestApp::new().await;
        let (status, body) = app.send("GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let app = TestApp::new().await;
        let (status, _) = app.send("GET", "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
