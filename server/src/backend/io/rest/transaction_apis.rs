//! # REST API for Transactions
//!
//! Listing is cursor paginated: pass the `next_cursor` of one page as `after`
//! to get the next one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use shared::{CreateTransactionRequest, Transaction, TransactionListRequest, TransactionListResponse, UpdateTransactionRequest};
use tracing::info;

use crate::backend::error::AppResult;
use crate::backend::io::rest::auth::AuthUser;
use crate::backend::io::rest::extract::{ApiJson, ApiQuery};
use crate::backend::io::rest::mappers::transaction_mapper::TransactionMapper;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/:id", get(get_transaction).put(update_transaction).delete(delete_transaction))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(request): ApiQuery<TransactionListRequest>,
) -> AppResult<Json<TransactionListResponse>> {
    let query = TransactionMapper::to_list_query(request)?;
    let result = state.transaction_service.list_transactions(&user.id, query).await?;
    Ok(Json(TransactionMapper::to_list_response(result)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.transaction_service.get_transaction(&user.id, &id).await?;
    Ok(Json(TransactionMapper::to_dto(transaction)))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(request): ApiJson<CreateTransactionRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let command = TransactionMapper::to_create_command(request)?;
    let transaction = state.transaction_service.create_transaction(&user.id, command).await?;
    info!(target: "app", user_id = %user.id, transaction_id = %transaction.id, "Transaction created");
    Ok((StatusCode::CREATED, Json(TransactionMapper::to_dto(transaction))))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTransactionRequest>,
) -> AppResult<Json<Transaction>> {
    let command = TransactionMapper::to_update_command(request)?;
    let transaction = state.transaction_service.update_transaction(&user.id, &id, command).await?;
    Ok(Json(TransactionMapper::to_dto(transaction)))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.transaction_service.delete_transaction(&user.id, &id).await?;
    info!(target: "app", user_id = %user.id, transaction_id = %id, "Transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}
