//! Savings goal handlers
//!
//! Every goal representation carries the derived metrics; clients never see
//! a bare stored row.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::{GoalPriority, GoalStatus, NewSavingsGoal, SavingsDashboard};
use stash_core::GoalWithMetrics;

/// Query parameters for listing goals
#[derive(Debug, Deserialize)]
pub struct GoalListQuery {
    pub status: Option<GoalStatus>,
}

/// Request body for updating a goal
#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub priority: Option<GoalPriority>,
    pub auto_save_percentage: Option<f64>,
    pub auto_save_amount: Option<f64>,
    pub auto_save_enabled: Option<bool>,
}

/// GET /api/savings/goals - List goals with metrics
pub async fn list_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<GoalListQuery>,
) -> Result<Json<Vec<GoalWithMetrics>>, AppError> {
    let goals = state.db.list_goals(user.id, query.status)?;

    let mut with_metrics = Vec::with_capacity(goals.len());
    for goal in goals {
        with_metrics.push(state.db.goal_with_metrics(goal)?);
    }

    Ok(Json(with_metrics))
}

/// POST /api/savings/goals - Create a goal
pub async fn create_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewSavingsGoal>,
) -> Result<Json<GoalWithMetrics>, AppError> {
    let goal = state.db.create_goal(user.id, &req)?;
    Ok(Json(state.db.goal_with_metrics(goal)?))
}

/// GET /api/savings/goals/:id - Get a goal with metrics
pub async fn get_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<GoalWithMetrics>, AppError> {
    let goal = state.db.get_goal(user.id, id)?;
    Ok(Json(state.db.goal_with_metrics(goal)?))
}

/// PUT /api/savings/goals/:id - Update a goal's definition
pub async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateGoalRequest>,
) -> Result<Json<GoalWithMetrics>, AppError> {
    let goal = state.db.update_goal(
        user.id,
        id,
        req.name.as_deref(),
        req.description.as_deref(),
        req.target_amount,
        req.target_date,
        req.priority,
        req.auto_save_percentage,
        req.auto_save_amount,
        req.auto_save_enabled,
    )?;

    Ok(Json(state.db.goal_with_metrics(goal)?))
}

/// DELETE /api/savings/goals/:id - Delete a goal and its ledger
pub async fn delete_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_goal(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/savings/goals/:id/pause - Pause an active goal
pub async fn pause_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<GoalWithMetrics>, AppError> {
    let goal = state.db.set_goal_status(user.id, id, GoalStatus::Paused)?;
    Ok(Json(state.db.goal_with_metrics(goal)?))
}

/// POST /api/savings/goals/:id/resume - Reactivate a paused or cancelled goal
pub async fn resume_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<GoalWithMetrics>, AppError> {
    let goal = state.db.set_goal_status(user.id, id, GoalStatus::Active)?;
    Ok(Json(state.db.goal_with_metrics(goal)?))
}

/// POST /api/savings/goals/:id/cancel - Cancel a goal
pub async fn cancel_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<GoalWithMetrics>, AppError> {
    let goal = state.db.set_goal_status(user.id, id, GoalStatus::Cancelled)?;
    Ok(Json(state.db.goal_with_metrics(goal)?))
}

/// GET /api/savings/dashboard - Cross-goal savings dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SavingsDashboard>, AppError> {
    Ok(Json(state.db.savings_dashboard(user.id)?))
}
