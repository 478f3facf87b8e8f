//! Ledger transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::{
    NewTransaction, Transaction, TransactionFilter, TransactionSummary, TransactionType,
};

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Query parameters for the period summary (defaults to the current month)
#[derive(Debug, Deserialize)]
pub struct SummaryRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/transactions - List the caller's transactions with filters
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let filter = TransactionFilter {
        transaction_type: query.transaction_type,
        category_id: query.category_id,
        from: query.from,
        to: query.to,
    };

    Ok(Json(state.db.list_transactions(user.id, filter)?))
}

/// POST /api/transactions - Record a transaction
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.db.create_transaction(user.id, &req)?))
}

/// GET /api/transactions/summary - Income/expense summary for a date range
pub async fn transaction_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SummaryRangeQuery>,
) -> Result<Json<TransactionSummary>, AppError> {
    let today = Utc::now().date_naive();
    let from = query.from.unwrap_or_else(|| today.with_day(1).unwrap_or(today));
    let to = query.to.unwrap_or(today);

    if to < from {
        return Err(AppError::bad_request("to must not precede from"));
    }

    Ok(Json(state.db.transaction_summary(user.id, from, to)?))
}

/// GET /api/transactions/:id - Get a single transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.db.get_transaction(user.id, id)?))
}

/// PUT /api/transactions/:id - Update a transaction
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    Ok(Json(state.db.update_transaction(user.id, id, &req)?))
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_transaction(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}
