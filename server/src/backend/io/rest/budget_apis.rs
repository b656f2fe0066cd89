//! # REST API for Budgets

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{Budget, BudgetListResponse, BudgetProgress, CreateBudgetRequest, UpdateBudgetRequest};
use tracing::info;

use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::extract::ApiJson;
use crate::backend::io::rest::mappers::budget_mapper::BudgetMapper;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_budgets).post(create_budget))
        .route("/:id", get(get_budget).put(update_budget).delete(delete_budget))
        .route("/:id/progress", get(budget_progress))
}

pub async fn list_budgets(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<BudgetListResponse>> {
    let budgets = state.budget_service.list_budgets(&user.id).await?;
    Ok(Json(BudgetMapper::to_list_response(budgets)))
}

pub async fn get_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Budget>> {
    let budget = state.budget_service.get_budget(&user.id, &id).await?;
    Ok(Json(BudgetMapper::to_dto(budget)))
}

pub async fn budget_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<BudgetProgress>> {
    let progress = state.budget_service.budget_progress(&user.id, &id).await?;
    Ok(Json(BudgetMapper::progress_to_dto(progress)))
}

pub async fn create_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateBudgetRequest>,
) -> AppResult<(StatusCode, Json<Budget>)> {
    let command = BudgetMapper::to_create_command(request)?;
    let budget = state.budget_service.create_budget(&user.id, command).await?;
    info!(target: "app", user_id = %user.id, budget_id = %budget.budget.id, "Budget created");
    Ok((StatusCode::CREATED, Json(BudgetMapper::to_dto(budget))))
}

pub async fn update_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateBudgetRequest>,
) -> AppResult<Json<Budget>> {
    let command = BudgetMapper::to_update_command(request)?;
    let budget = state.budget_service.update_budget(&user.id, &id, command).await?;
    Ok(Json(BudgetMapper::to_dto(budget)))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.budget_service.delete_budget(&user.id, &id).await?;
    info!(target: "app", user_id = %user.id, budget_id = %id, "Budget deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::backend::io::rest::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_budget_progress_follows_transactions() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let food = app.create_category(&token, "Food", "expense").await;

        let (status, budget) = app
            .send(
                "POST",
                "/api/budgets",
                Some(&token),
                Some(json!({
                    "category_id": food,
                    "amount": 200,
                    "period": "monthly",
                    "start_date": "2025-06-01"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(budget["end_date"], "2025-06-30");
        assert_eq!(budget["category_name"], "Food");
        assert_eq!(budget["progress"]["status"], "ok");
        let progress_uri = format!("/api/budgets/{}/progress", budget["id"].as_str().unwrap());

        // Cached progress is forgotten when a transaction lands in the period
        app.send("GET", &progress_uri, Some(&token), None).await;
        app.send(
            "POST",
            "/api/transactions",
            Some(&token),
            Some(json!({"category_id": food, "amount": 170, "date": "2025-06-10"})),
        )
        .await;

        let (status, progress) = app.send("GET", &progress_uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress["spent"], 170.0);
        assert_eq!(progress["remaining"], 30.0);
        assert_eq!(progress["percentage"], 85.0);
        assert_eq!(progress["status"], "warning");
    }

    #[tokio::test]
    async fn test_overlapping_budget_conflicts() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let food = app.create_category(&token, "Food", "expense").await;
        let request = json!({"category_id": food, "amount": 100, "period": "monthly", "start_date": "2025-06-01"});

        let (status, _) = app.send("POST", "/api/budgets", Some(&token), Some(request.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = app.send("POST", "/api/budgets", Some(&token), Some(request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_update_and_delete_budget() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let food = app.create_category(&token, "Food", "expense").await;
        let (_, budget) = app
            .send(
                "POST",
                "/api/budgets",
                Some(&token),
                Some(json!({"category_id": food, "amount": 100, "period": "weekly", "start_date": "2025-06-16"})),
            )
            .await;
        let uri = format!("/api/budgets/{}", budget["id"].as_str().unwrap());

        let (status, updated) = app
            .send("PUT", &uri, Some(&token), Some(json!({"amount": 150, "alert_threshold": 90})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["amount"], 150.0);
        assert_eq!(updated["alert_threshold"], 90.0);

        let (status, _) = app
            .send("PUT", &uri, Some(&token), Some(json!({"end_date": "2025-06-01"})))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = app.send("DELETE", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, list) = app.send("GET", "/api/budgets", Some(&token), None).await;
        assert!(list["budgets"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_income_category_cannot_be_budgeted() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let salary = app.create_category(&token, "Salary", "income").await;
        let (status, _) = app
            .send(
                "POST",
                "/api/budgets",
                Some(&token),
                Some(json!({"category_id": salary, "amount": 100, "period": "monthly"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
