//! Recommendation, insight, achievement, reminder, and simulation handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::{
    ReminderFrequency, SavingsAchievement, SavingsInsight, SavingsRecommendation, SavingsReminder,
    SavingsSimulation,
};

// ===== Recommendations =====

/// Count of records produced by an analysis refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub created: usize,
}

/// GET /api/savings/recommendations
pub async fn list_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SavingsRecommendation>>, AppError> {
    Ok(Json(state.db.list_recommendations(user.id)?))
}

/// POST /api/savings/recommendations/refresh - Rebuild unread recommendations
pub async fn refresh_recommendations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RefreshResponse>, AppError> {
    let created = state.db.refresh_recommendations(user.id)?;
    Ok(Json(RefreshResponse { created }))
}

/// POST /api/savings/recommendations/:id/read
pub async fn mark_recommendation_read(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.mark_recommendation_read(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

// ===== Insights =====

/// Query parameters for listing insights
#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// GET /api/savings/insights
pub async fn list_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<InsightQuery>,
) -> Result<Json<Vec<SavingsInsight>>, AppError> {
    Ok(Json(
        state.db.list_insights(user.id, query.include_archived)?,
    ))
}

/// POST /api/savings/insights/refresh - Write fresh insights
pub async fn refresh_insights(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RefreshResponse>, AppError> {
    let created = state.db.refresh_insights(user.id)?;
    Ok(Json(RefreshResponse { created }))
}

/// POST /api/savings/insights/:id/archive
pub async fn archive_insight(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.archive_insight(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

// ===== Achievements =====

/// Achievements with the user's running point total
#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub achievements: Vec<SavingsAchievement>,
    pub total_points: i64,
}

/// GET /api/savings/achievements
pub async fn list_achievements(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AchievementsResponse>, AppError> {
    Ok(Json(AchievementsResponse {
        achievements: state.db.list_achievements(user.id)?,
        total_points: state.db.achievement_points(user.id)?,
    }))
}

// ===== Reminders =====

/// Request body for creating a reminder
#[derive(Debug, Deserialize)]
pub struct CreateReminderRequest {
    pub goal_id: i64,
    pub message: String,
    pub remind_on: NaiveDate,
    #[serde(default)]
    pub frequency: ReminderFrequency,
}

/// GET /api/savings/reminders
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SavingsReminder>>, AppError> {
    Ok(Json(state.db.list_reminders(user.id)?))
}

/// POST /api/savings/reminders
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateReminderRequest>,
) -> Result<Json<SavingsReminder>, AppError> {
    let reminder = state.db.create_reminder(
        user.id,
        req.goal_id,
        &req.message,
        req.remind_on,
        req.frequency,
    )?;

    Ok(Json(reminder))
}

/// POST /api/savings/reminders/:id/deactivate
pub async fn deactivate_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.deactivate_reminder(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/savings/reminders/:id
pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_reminder(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

// ===== Simulations =====

/// Request body for a what-if projection
#[derive(Debug, Deserialize)]
pub struct SimulationRequest {
    pub goal_id: i64,
    pub monthly_amount: f64,
}

/// GET /api/savings/simulations - List stored runs
pub async fn list_simulations(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<SavingsSimulation>>, AppError> {
    Ok(Json(state.db.list_simulations(user.id)?))
}

/// POST /api/savings/simulations - Project and store a run
pub async fn run_simulation(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SimulationRequest>,
) -> Result<Json<SavingsSimulation>, AppError> {
    Ok(Json(state.db.simulate_goal(
        user.id,
        req.goal_id,
        req.monthly_amount,
    )?))
}
