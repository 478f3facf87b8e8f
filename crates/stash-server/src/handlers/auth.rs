//! Authentication handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::User;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response carrying the raw session token
///
/// The token is shown exactly once; only its digest is stored.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// POST /api/auth/register - Create an account and log in
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    state
        .db
        .create_user(&req.username, &req.email, &req.password)
        .map_err(|e| match e {
            stash_core::Error::Database(rusqlite_err)
                if rusqlite_err.to_string().contains("UNIQUE") =>
            {
                AppError::conflict("Username already taken")
            }
            e => e.into(),
        })?;

    let (user, token) = state
        .db
        .login(&req.username, &req.password, state.config.session_ttl_days)?;

    Ok(Json(LoginResponse { user, token }))
}

/// POST /api/auth/login - Verify credentials and mint a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, token) = state
        .db
        .login(&req.username, &req.password, state.config.session_ttl_days)?;

    Ok(Json(LoginResponse { user, token }))
}

/// POST /api/auth/logout - Revoke the presented session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, AppError> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
    {
        state.db.logout(token)?;
    }

    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/auth/me - The authenticated user
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.db.get_user(user.id)?))
}
