//! # REST API for Spreadsheet Exports

use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;
use serde::Deserialize;

use crate::backend::domain::commands::exports::ExportFile;
use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::extract::ApiQuery;
use crate::backend::io::rest::mappers::parse_optional_date;
use crate::backend::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportRangeParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/budgets", get(export_budgets))
        .route("/transactions", get(export_transactions))
}

fn download(file: ExportFile) -> Response {
    let headers = [
        (CONTENT_TYPE, file.content_type.to_string()),
        (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", file.filename)),
    ];
    (headers, file.content).into_response()
}

pub async fn export_budgets(State(state): State<AppState>, AuthUser(user): AuthUser) -> AppResult<Response> {
    let today = Local::now().date_naive();
    let file = state.export_service.export_budgets(&user.id, today).await?;
    Ok(download(file))
}

pub async fn export_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(params): ApiQuery<ExportRangeParams>,
) -> AppResult<Response> {
    let start_date = parse_optional_date("start_date", params.start_date.as_deref())?;
    let end_date = parse_optional_date("end_date", params.end_date.as_deref())?;
    let today = Local::now().date_naive();

    let file = state
        .export_service
        .export_transactions(&user.id, start_date, end_date, today)
        .await?;
    Ok(download(file))
}
