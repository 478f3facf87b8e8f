//! Stash Core Library
//!
//! Shared functionality for the Stash personal finance backend:
//! - Database access and migrations
//! - Ledger transactions, categories, budgets, and reports
//! - Savings goals with derived progress and risk metrics
//! - Auto-save rule engine (contribution formulas and execution)
//! - Recommendations, insights, achievements, reminders, simulations

pub mod db;
pub mod error;
pub mod models;
pub mod savings;

pub use db::{AuthUser, Database};
pub use error::{Error, Result};
pub use savings::{
    calculate_contribution, goal_metrics, ContributionInputs, ExecutionOutcome, GoalMetrics,
    GoalWithMetrics, PostedSavings,
};
