//! Category handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::{Category, CategorySummary, TransactionFilter, TransactionType};

/// Request body for creating or updating a category
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// Query parameters for a category summary
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    #[serde(rename = "type")]
    pub transaction_type: Option<TransactionType>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// GET /api/categories - List the caller's categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.db.list_categories(user.id)?))
}

/// POST /api/categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let name = req
        .name
        .as_deref()
        .ok_or_else(|| AppError::bad_request("name is required"))?;

    let category = state
        .db
        .create_category(user.id, name, req.color.as_deref(), req.icon.as_deref())
        .map_err(|e| match e {
            stash_core::Error::Database(db_err) if db_err.to_string().contains("UNIQUE") => {
                AppError::conflict("A category with that name already exists")
            }
            e => e.into(),
        })?;

    Ok(Json(category))
}

/// GET /api/categories/:id - Get a single category
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.db.get_category(user.id, id)?))
}

/// PUT /api/categories/:id - Update a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    let category = state.db.update_category(
        user.id,
        id,
        req.name.as_deref(),
        req.color.as_deref(),
        req.icon.as_deref(),
    )?;

    Ok(Json(category))
}

/// DELETE /api/categories/:id - Delete a category
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_category(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/categories/:id/summary - Aggregates over the category's
/// transactions, optionally filtered by type and date range
pub async fn category_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<CategorySummary>, AppError> {
    let filter = TransactionFilter {
        transaction_type: query.transaction_type,
        category_id: None,
        from: query.from,
        to: query.to,
    };

    Ok(Json(state.db.category_summary(user.id, id, filter)?))
}
