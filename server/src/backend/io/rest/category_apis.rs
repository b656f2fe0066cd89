//! # REST API for Categories

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{Category, CategoryListResponse, CreateCategoryRequest, UpdateCategoryRequest};
use tracing::info;

use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::extract::ApiJson;
use crate::backend::io::rest::mappers::category_mapper::CategoryMapper;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
}

pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<CategoryListResponse>> {
    let categories = state.category_service.list_categories(&user.id).await?;
    Ok(Json(CategoryMapper::to_list_response(categories)))
}

pub async fn get_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Category>> {
    let category = state.category_service.get_category(&user.id, &id).await?;
    Ok(Json(CategoryMapper::to_dto(category)))
}

pub async fn create_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = state
        .category_service
        .create_category(&user.id, CategoryMapper::to_create_command(request))
        .await?;
    info!(target: "app", user_id = %user.id, category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(CategoryMapper::to_dto(category))))
}

pub async fn update_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCategoryRequest>,
) -> AppResult<Json<Category>> {
    let category = state
        .category_service
        .update_category(&user.id, &id, CategoryMapper::to_update_command(request))
        .await?;
    Ok(Json(CategoryMapper::to_dto(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.category_service.delete_category(&user.id, &id).await?;
    info!(target: "app", user_id = %user.id, category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::backend::io::rest::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_category_lifecycle() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;

        let (status, created) = app
            .send(
                "POST",
                "/api/categories",
                Some(&token),
                Some(json!({"name": "Food", "category_type": "expense", "color": "#FF8800"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = app
            .send("PUT", &format!("/api/categories/{}", id), Some(&token), Some(json!({"name": "Groceries"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Groceries");
        assert_eq!(updated["category_type"], "expense");

        let (_, list) = app.send("GET", "/api/categories", Some(&token), None).await;
        assert_eq!(list["categories"].as_array().unwrap().len(), 1);

        let (status, _) = app.send("DELETE", &format!("/api/categories/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.send("GET", &format!("/api/categories/{}", id), Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_categories_are_private() {
        let app = TestApp::new().await;
        let owner = app.register("owner@example.com").await;
        let other = app.register("other@example.com").await;

        let (_, created) = app
            .send("POST", "/api/categories", Some(&owner), Some(json!({"name": "Rent", "category_type": "expense"})))
            .await;
        let id = created["id"].as_str().unwrap();

        let (status, _) = app.send("GET", &format!("/api/categories/{}", id), Some(&other), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (_, list) = app.send("GET", "/api/categories", Some(&other), None).await;
        assert!(list["categories"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_color_is_rejected() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let (status, _) = app
            .send(
                "POST",
                "/api/categories",
                Some(&token),
                Some(json!({"name": "Food", "category_type": "expense", "color": "orange"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
