//! Derived goal metrics
//!
//! Pure functions over stored goal fields. Nothing is cached; every read
//! recomputes from source fields, so there is no invalidation to get wrong.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{RiskLevel, SavingsGoal};

/// Read-only metrics attached to every goal representation
#[derive(Debug, Clone, Serialize)]
pub struct GoalMetrics {
    /// clamp(current / target * 100, 0..=100); 0 when target <= 0
    pub progress_percentage: f64,
    /// max(target - current, 0)
    pub remaining_amount: f64,
    /// Whole days until target_date, floored at 0
    pub days_remaining: i64,
    /// Monthly pace required to close the gap by target_date
    pub monthly_savings_needed: f64,
    pub is_on_track: bool,
    pub risk_level: RiskLevel,
}

/// A goal together with its derived metrics
#[derive(Debug, Clone, Serialize)]
pub struct GoalWithMetrics {
    #[serde(flatten)]
    pub goal: SavingsGoal,
    pub metrics: GoalMetrics,
}

/// Average month length in days, used to convert a daily gap into a
/// monthly pace
const DAYS_PER_MONTH: f64 = 30.44;

/// Compute metrics for a goal as of `today`
///
/// `trailing_30_day_credits` is the sum of credit-effect savings
/// transactions posted to this goal over the trailing 30 days.
pub fn goal_metrics(
    goal: &SavingsGoal,
    today: NaiveDate,
    trailing_30_day_credits: f64,
) -> GoalMetrics {
    let progress_percentage = if goal.target_amount > 0.0 {
        (goal.current_amount / goal.target_amount * 100.0).min(100.0)
    } else {
        0.0
    };

    let remaining_amount = (goal.target_amount - goal.current_amount).max(0.0);
    let days_remaining = (goal.target_date - today).num_days().max(0);

    let monthly_savings_needed = if days_remaining <= 0 {
        // Past the deadline the whole remainder is due now
        remaining_amount
    } else {
        remaining_amount / (days_remaining as f64 / DAYS_PER_MONTH)
    };

    let is_on_track = if days_remaining <= 0 {
        progress_percentage >= 100.0
    } else {
        let needed_rate = remaining_amount / days_remaining as f64;
        let current_rate = trailing_30_day_credits / 30.0;
        current_rate >= needed_rate
    };

    // First matching branch wins
    let risk_level = if progress_percentage >= 100.0 {
        RiskLevel::Completed
    } else if days_remaining <= 30 && progress_percentage < 80.0 {
        RiskLevel::Critical
    } else if days_remaining <= 90 && progress_percentage < 60.0 {
        RiskLevel::High
    } else if !is_on_track {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    GoalMetrics {
        progress_percentage,
        remaining_amount,
        days_remaining,
        monthly_savings_needed,
        is_on_track,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::models::{GoalPriority, GoalStatus};

    fn goal(target: f64, current: f64, days_out: i64) -> SavingsGoal {
        let today = Utc::now().date_naive();
        SavingsGoal {
            id: 1,
            user_id: 1,
            name: "Emergency fund".to_string(),
            description: None,
            target_amount: target,
            current_amount: current,
            target_date: today + Duration::days(days_out),
            priority: GoalPriority::Medium,
            status: GoalStatus::Active,
            auto_save_percentage: 0.0,
            auto_save_amount: 0.0,
            auto_save_enabled: false,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn progress_clamps_to_100() {
        let today = Utc::now().date_naive();
        let m = goal_metrics(&goal(1000.0, 1500.0, 100), today, 0.0);
        assert_eq!(m.progress_percentage, 100.0);
        assert_eq!(m.remaining_amount, 0.0);
    }

    #[test]
    fn zero_target_yields_zero_progress() {
        let today = Utc::now().date_naive();
        let m = goal_metrics(&goal(0.0, 50.0, 100), today, 0.0);
        assert_eq!(m.progress_percentage, 0.0);
    }

    #[test]
    fn remaining_never_negative() {
        let today = Utc::now().date_naive();
        let m = goal_metrics(&goal(100.0, 250.0, 10), today, 0.0);
        assert_eq!(m.remaining_amount, 0.0);
    }

    #[test]
    fn past_deadline_needs_full_remainder() {
        let today = Utc::now().date_naive();
        let m = goal_metrics(&goal(1000.0, 400.0, -5), today, 0.0);
        assert_eq!(m.days_remaining, 0);
        assert_eq!(m.monthly_savings_needed, 600.0);
        assert!(!m.is_on_track);
    }

    #[test]
    fn monthly_needed_uses_average_month() {
        let today = Utc::now().date_naive();
        let m = goal_metrics(&goal(1000.0, 0.0, 3044), today, 0.0);
        // 3044 days = 100 average months
        assert!((m.monthly_savings_needed - 10.0).abs() < 1e-9);
    }

    #[test]
    fn on_track_compares_daily_rates() {
        let today = Utc::now().date_naive();
        // Needs 300 over 30 days = 10/day; saved 360 in the last 30 = 12/day
        let m = goal_metrics(&goal(1000.0, 700.0, 30), today, 360.0);
        assert!(m.is_on_track);

        let m = goal_metrics(&goal(1000.0, 700.0, 30), today, 150.0);
        assert!(!m.is_on_track);
    }

    #[test]
    fn risk_branch_order() {
        let today = Utc::now().date_naive();

        // Completed wins over everything
        let m = goal_metrics(&goal(1000.0, 1000.0, 5), today, 0.0);
        assert_eq!(m.risk_level, RiskLevel::Completed);

        // <= 30 days and < 80% progress
        let m = goal_metrics(&goal(1000.0, 500.0, 20), today, 10_000.0);
        assert_eq!(m.risk_level, RiskLevel::Critical);

        // <= 90 days and < 60% progress
        let m = goal_metrics(&goal(1000.0, 500.0, 60), today, 10_000.0);
        assert_eq!(m.risk_level, RiskLevel::High);

        // Off pace but not near deadline
        let m = goal_metrics(&goal(1000.0, 500.0, 200), today, 0.0);
        assert_eq!(m.risk_level, RiskLevel::Medium);

        // Comfortably on pace
        let m = goal_metrics(&goal(1000.0, 900.0, 200), today, 1_000.0);
        assert_eq!(m.risk_level, RiskLevel::Low);
    }

    #[test]
    fn critical_outranks_high_near_deadline() {
        let today = Utc::now().date_naive();
        // 25 days out, 50% progress matches both branches
        let m = goal_metrics(&goal(1000.0, 500.0, 25), today, 0.0);
        assert_eq!(m.risk_level, RiskLevel::Critical);
    }
}
