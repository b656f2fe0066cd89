//! # REST API for Notifications

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shared::{MarkAllReadResponse, Notification, NotificationListResponse};

use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::extract::ApiQuery;
use crate::backend::io::rest::mappers::notification_mapper::NotificationMapper;
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListParams {
    #[serde(default)]
    pub unread_only: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(params): ApiQuery<NotificationListParams>,
) -> AppResult<Json<NotificationListResponse>> {
    let (notifications, unread) = state
        .notification_service
        .list_notifications(&user.id, params.unread_only)
        .await?;
    Ok(Json(NotificationMapper::to_list_response(notifications, unread)))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Notification>> {
    let notification = state.notification_service.mark_read(&user.id, &id).await?;
    Ok(Json(NotificationMapper::to_dto(notification)))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let updated = state.notification_service.mark_all_read(&user.id).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

#[cfg(test)]
mod tests {
    use crate::backend::io::rest::test_support::*;
    use axum::http::StatusCode;
    use chrono::Local;
    use serde_json::json;

    #[tokio::test]
    async fn test_alerts_can_be_listed_and_read() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let food = app.create_category(&token, "Food", "expense").await;
        let fun = app.create_category(&token, "Fun", "expense").await;

        for (category, spent) in [(&food, 90), (&fun, 150)] {
            app.send(
                "POST",
                "/api/budgets",
                Some(&token),
                Some(json!({"category_id": category, "amount": 100, "period": "monthly"})),
            )
            .await;
            app.send(
                "POST",
                "/api/transactions",
                Some(&token),
                Some(json!({"category_id": category, "amount": spent})),
            )
            .await;
        }
        app.state.budget_service.check_limits(Local::now().date_naive()).await.unwrap();

        let (status, list) = app.send("GET", "/api/notifications", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["notifications"].as_array().unwrap().len(), 2);
        assert_eq!(list["unread_count"], 2);
        assert_eq!(app.mailer.sent().len(), 2);

        let id = list["notifications"][0]["id"].as_str().unwrap().to_string();
        let (status, read) = app
            .send("POST", &format!("/api/notifications/{}/read", id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(read["read_at"].is_string());

        let (_, unread) = app.send("GET", "/api/notifications?unread_only=true", Some(&token), None).await;
        assert_eq!(unread["notifications"].as_array().unwrap().len(), 1);
        assert_eq!(unread["unread_count"], 1);

        let (status, body) = app.send("POST", "/api/notifications/read-all", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 1);
    }

    #[tokio::test]
    async fn test_unknown_notification_is_not_found() {
        let app = TestApp::new().await;
        let token = app.register("a@example.com").await;
        let (status, _) = app.send("POST", "/api/notifications/missing/read", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
