//! Checkout transaction endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::transaction::{
        FineQuote, IssueRequest, ReturnRequest, Transaction, TransactionQuery, TransactionView,
    },
};

use super::ValidatedJson;

/// Overdue sweep result
#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    /// Number of transactions moved to overdue
    pub swept: u64,
}

/// List transactions with their book and member
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(TransactionQuery),
    responses(
        (status = 200, description = "Transactions in ledger order", body = Vec<TransactionView>)
    )
)]
pub async fn list_transactions(
    State(state): State<crate::AppState>,
    Query(query): Query<TransactionQuery>,
) -> AppResult<Json<Vec<TransactionView>>> {
    let transactions = state.services.transactions.list(&query).await?;
    Ok(Json(transactions))
}

/// Get transaction by ID
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction details", body = TransactionView),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_transaction(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransactionView>> {
    let transaction = state.services.transactions.get(id).await?;
    Ok(Json(transaction))
}

/// Fine owed on a transaction as of now
#[utoipa::path(
    get,
    path = "/transactions/{id}/fine",
    tag = "transactions",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Fine quote", body = FineQuote),
        (status = 404, description = "Transaction not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_fine(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FineQuote>> {
    let quote = state.services.transactions.quote_fine(id, Utc::now()).await?;
    Ok(Json(quote))
}

/// Issue a book to a member
#[utoipa::path(
    post,
    path = "/transactions/issue",
    tag = "transactions",
    request_body = IssueRequest,
    responses(
        (status = 201, description = "Book issued", body = Transaction),
        (status = 400, description = "Unknown book or member, inactive member, or no copy available", body = crate::error::ErrorResponse)
    )
)]
pub async fn issue_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<IssueRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    let transaction = state.services.transactions.issue(&request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Return an issued book
#[utoipa::path(
    post,
    path = "/transactions/return",
    tag = "transactions",
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = Transaction),
        (status = 400, description = "Unknown or already returned transaction", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<crate::AppState>,
    ValidatedJson(request): ValidatedJson<ReturnRequest>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.services.transactions.return_book(&request).await?;
    Ok(Json(transaction))
}

/// Mark late transactions as overdue
#[utoipa::path(
    post,
    path = "/transactions/sweep-overdue",
    tag = "transactions",
    responses(
        (status = 200, description = "Sweep completed", body = SweepResponse)
    )
)]
pub async fn sweep_overdue(State(state): State<crate::AppState>) -> AppResult<Json<SweepResponse>> {
    let swept = state.services.transactions.sweep_overdue(Utc::now()).await?;
    Ok(Json(SweepResponse { swept }))
}
