//! Savings engine
//!
//! - `metrics` - Derived goal metrics, pure functions recomputed on read
//! - `contribution` - Auto-save contribution formulas per rule type
//! - `engine` - Posting, rule execution, analysis, and simulations

mod contribution;
mod engine;
mod metrics;

pub use contribution::{calculate_contribution, ContributionInputs};
pub use engine::{ExecutionOutcome, PostedSavings};
pub use metrics::{goal_metrics, GoalMetrics, GoalWithMetrics};
