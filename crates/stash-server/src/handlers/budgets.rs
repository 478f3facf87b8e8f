//! Budget handlers
//!
//! Budget reads always carry usage derived from the ledger.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::BudgetWithUsage;

/// Request body for creating or updating a budget
#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub category_id: i64,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// GET /api/budgets - List the caller's budgets with usage
pub async fn list_budgets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BudgetWithUsage>>, AppError> {
    let budgets = state.db.list_budgets(user.id)?;

    let mut with_usage = Vec::with_capacity(budgets.len());
    for budget in budgets {
        with_usage.push(state.db.budget_usage(budget)?);
    }

    Ok(Json(with_usage))
}

/// POST /api/budgets - Create a budget
pub async fn create_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<BudgetRequest>,
) -> Result<Json<BudgetWithUsage>, AppError> {
    let budget = state.db.create_budget(
        user.id,
        req.category_id,
        req.amount,
        req.start_date,
        req.end_date,
    )?;

    Ok(Json(state.db.budget_usage(budget)?))
}

/// GET /api/budgets/:id - Get a budget with usage
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<BudgetWithUsage>, AppError> {
    let budget = state.db.get_budget(user.id, id)?;
    Ok(Json(state.db.budget_usage(budget)?))
}

/// PUT /api/budgets/:id - Update a budget
pub async fn update_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<BudgetRequest>,
) -> Result<Json<BudgetWithUsage>, AppError> {
    let budget = state
        .db
        .update_budget(user.id, id, req.amount, req.start_date, req.end_date)?;

    Ok(Json(state.db.budget_usage(budget)?))
}

/// DELETE /api/budgets/:id - Delete a budget
pub async fn delete_budget(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_budget(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}
