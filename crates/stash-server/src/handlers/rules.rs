//! Auto-save rule handlers
//!
//! There is no in-process scheduler. `POST /rules/run` is the hook an
//! external job (cron, the CLI) calls to execute whatever is due.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState, SuccessResponse};
use stash_core::db::AuthUser;
use stash_core::models::{AutoSaveRule, NewAutoSaveRule};
use stash_core::ExecutionOutcome;

/// Outcome of a rule-run sweep
#[derive(Debug, Serialize)]
pub struct RunRulesResponse {
    pub due: usize,
    pub executed: usize,
    pub skipped: usize,
}

/// GET /api/savings/rules - List the caller's rules
pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<AutoSaveRule>>, AppError> {
    Ok(Json(state.db.list_rules(user.id)?))
}

/// POST /api/savings/rules - Create a rule
pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<NewAutoSaveRule>,
) -> Result<Json<AutoSaveRule>, AppError> {
    Ok(Json(state.db.create_rule(user.id, &req)?))
}

/// GET /api/savings/rules/:id - Get a rule
pub async fn get_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<AutoSaveRule>, AppError> {
    Ok(Json(state.db.get_rule(user.id, id)?))
}

/// PUT /api/savings/rules/:id - Replace a rule's definition
pub async fn update_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<NewAutoSaveRule>,
) -> Result<Json<AutoSaveRule>, AppError> {
    Ok(Json(state.db.update_rule(user.id, id, &req)?))
}

/// DELETE /api/savings/rules/:id - Delete a rule
pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.db.delete_rule(user.id, id)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/savings/rules/:id/activate
pub async fn activate_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<AutoSaveRule>, AppError> {
    Ok(Json(state.db.set_rule_active(user.id, id, true)?))
}

/// POST /api/savings/rules/:id/deactivate
pub async fn deactivate_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<AutoSaveRule>, AppError> {
    Ok(Json(state.db.set_rule_active(user.id, id, false)?))
}

/// Optional overrides for a single rule execution
#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRuleRequest {
    pub income_amount: Option<f64>,
    pub budget_excess: Option<f64>,
}

/// POST /api/savings/rules/:id/execute - Execute one rule now
///
/// Ledger inputs are derived from the caller's transactions at execution
/// time; the body may pin income_amount/budget_excess instead. Due-ness is
/// not checked here, only the active flag.
pub async fn execute_rule(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Option<Json<ExecuteRuleRequest>>,
) -> Result<Json<ExecutionOutcome>, AppError> {
    let rule = state.db.get_rule(user.id, id)?;
    let mut inputs = state.db.rule_inputs(user.id)?;

    let req = body.map(|Json(r)| r).unwrap_or_default();
    if let Some(income) = req.income_amount {
        inputs.income_amount = income;
    }
    if let Some(excess) = req.budget_excess {
        inputs.budget_excess = excess;
    }

    Ok(Json(state.db.execute_rule(user.id, &rule, inputs)?))
}

/// POST /api/savings/rules/run - Execute all of the caller's due rules
pub async fn run_due_rules(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RunRulesResponse>, AppError> {
    let due = state.db.list_due_rules(user.id, Utc::now())?;
    let inputs = state.db.rule_inputs(user.id)?;

    let mut executed = 0;
    let mut skipped = 0;
    for rule in &due {
        match state.db.execute_rule(user.id, rule, inputs)? {
            ExecutionOutcome::Posted(_) => executed += 1,
            ExecutionOutcome::Skipped => skipped += 1,
        }
    }

    Ok(Json(RunRulesResponse {
        due: due.len(),
        executed,
        skipped,
    }))
}
