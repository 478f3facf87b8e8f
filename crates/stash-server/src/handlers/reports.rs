//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::{Report, ReportType};

/// Request body for generating a report
#[derive(Debug, Deserialize)]
pub struct GenerateReportRequest {
    pub name: String,
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// GET /api/reports - List stored reports
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Report>>, AppError> {
    Ok(Json(state.db.list_reports(user.id)?))
}

/// POST /api/reports - Generate and store a report
pub async fn generate_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<GenerateReportRequest>,
) -> Result<Json<Report>, AppError> {
    let report = state.db.generate_report(
        user.id,
        &req.name,
        req.report_type,
        req.start_date,
        req.end_date,
    )?;

    Ok(Json(report))
}

/// GET /api/reports/:id - Get a stored report
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Report>, AppError> {
    Ok(Json(state.db.get_report(user.id, id)?))
}

/// DELETE /api/reports/:id - Delete a stored report
pub async fn delete_report(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_report(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}
