//! # REST API for the Dashboard

use axum::{extract::State, routing::get, Json, Router};
use chrono::Local;
use shared::DashboardSummary;

use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::mappers::dashboard_mapper::DashboardMapper;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Totals of the current month and the state of active budgets
pub async fn dashboard(State(state): State<AppState>, AuthUser(user): AuthUser) -> AppResult<Json<DashboardSummary>> {
    let today = Local::now().date_naive();
    let summary = state.dashboard_service.summary(&user.id, today).await?;
    Ok(Json(DashboardMapper::to_dto(summary)))
}

#[cfg(test)]
mod tests {
    use crate::backend::io::rest::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_dashboard_totals_for_current_month() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let salary = app.create_category(&token, "Salary", "income").await;
        let food = app.create_category(&token, "Food", "expense").await;

        for (category, amount) in [(&salary, 1000.0), (&food, 250.25)] {
            app.send(
                "POST",
                "/api/transactions",
                Some(&token),
                Some(json!({"category_id": category, "amount": amount})),
            )
            .await;
        }

        let (status, summary) = app.send("GET", "/api/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["total_income"], 1000.0);
        assert_eq!(summary["total_expense"], 250.25);
        assert_eq!(summary["net"], 749.75);
        assert_eq!(summary["active_budgets"], 0);
    }
}
