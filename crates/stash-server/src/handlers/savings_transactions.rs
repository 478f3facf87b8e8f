//! Savings ledger handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState};
use stash_core::db::AuthUser;
use stash_core::models::{SavingsEffect, SavingsTransaction};
use stash_core::PostedSavings;

/// Query parameters for listing savings transactions
#[derive(Debug, Deserialize)]
pub struct SavingsListQuery {
    pub goal_id: Option<i64>,
}

/// Request body for posting a savings transaction
#[derive(Debug, Deserialize)]
pub struct PostSavingsRequest {
    pub goal_id: i64,
    pub effect: SavingsEffect,
    pub amount: f64,
    /// Defaults to today
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// Goal-scoped variant of [`PostSavingsRequest`]; the goal comes from the path
#[derive(Debug, Deserialize)]
pub struct PostGoalSavingsRequest {
    pub effect: SavingsEffect,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

/// GET /api/savings/transactions - List the savings ledger
pub async fn list_savings_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SavingsListQuery>,
) -> Result<Json<Vec<SavingsTransaction>>, AppError> {
    Ok(Json(
        state.db.list_savings_transactions(user.id, query.goal_id)?,
    ))
}

/// POST /api/savings/transactions - Post a savings transaction
///
/// Moves the goal balance and may complete the goal; the response carries
/// both the new ledger entry and the updated goal.
pub async fn post_savings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PostSavingsRequest>,
) -> Result<Json<PostedSavings>, AppError> {
    let posted = state.db.post_savings(
        user.id,
        req.goal_id,
        req.effect,
        req.amount,
        req.date,
        &req.description,
    )?;

    Ok(Json(posted))
}

/// GET /api/savings/goals/:id/transactions - Ledger entries for one goal
pub async fn list_goal_transactions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(goal_id): Path<i64>,
) -> Result<Json<Vec<SavingsTransaction>>, AppError> {
    Ok(Json(
        state.db.list_savings_transactions(user.id, Some(goal_id))?,
    ))
}

/// POST /api/savings/goals/:id/transactions - Post against one goal
pub async fn post_goal_savings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(goal_id): Path<i64>,
    Json(req): Json<PostGoalSavingsRequest>,
) -> Result<Json<PostedSavings>, AppError> {
    let posted = state.db.post_savings(
        user.id,
        goal_id,
        req.effect,
        req.amount,
        req.date,
        &req.description,
    )?;

    Ok(Json(posted))
}
