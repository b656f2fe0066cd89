//! # REST API for Users
//!
//! Registration hands out the API token used by every other endpoint.

use axum::{extract::State, http::StatusCode, routing::{get, post}, Json, Router};
use shared::{RegisterUserRequest, RegisterUserResponse, User};

use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::extract::ApiJson;
use crate::backend::io::rest::mappers::user_mapper::UserMapper;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<RegisterUserResponse>)> {
    let registered = state
        .user_service
        .register(UserMapper::to_register_command(request))
        .await?;
    Ok((StatusCode::CREATED, Json(UserMapper::to_register_response(registered))))
}

pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(UserMapper::to_dto(user))
}

#[cfg(test)]
mod tests {
    use crate::backend::io::rest::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_then_me() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send("POST", "/api/register", None, Some(json!({"name": "Olena", "email": "Olena@Example.com"})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["user"]["email"], "olena@example.com");
        assert!(body["user"].get("api_token_hash").is_none());
        let token = body["api_token"].as_str().unwrap().to_string();

        let (status, body) = app.send("GET", "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Olena");
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let app = TestApp::new().await;
        let request = json!({"name": "A", "email": "a@example.com"});
        app.send("POST", "/api/register", None, Some(request.clone())).await;

        let (status, body) = app.send("POST", "/api/register", None, Some(request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Email is already registered");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = TestApp::new().await;

        let (status, body) = app.send("GET", "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthenticated");

        let (status, _) = app.send("GET", "/api/me", Some("not-a-token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_unprocessable() {
        let app = TestApp::new().await;
        let (status, body) = app.send("POST", "/api/register", None, Some(json!({"name": "A"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }
}
