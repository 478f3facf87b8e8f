//! Posting, rule execution, analysis, and simulations
//!
//! Everything here is request-scoped. There is no in-process scheduler;
//! rule execution is driven by an external caller (the CLI's `rules run`,
//! or whatever cron-like job an operator wires up).

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::params;
use serde::Serialize;
use tracing::{debug, info};

use super::contribution::{calculate_contribution, ContributionInputs};
use super::metrics::{goal_metrics, GoalWithMetrics};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    AutoSaveRule, GoalStatus, SavingsEffect, SavingsGoal, SavingsSimulation, SavingsTransaction,
};

/// Points granted for completing a goal
const GOAL_COMPLETED_POINTS: i64 = 100;

/// Result of posting a savings transaction
#[derive(Debug, Clone, Serialize)]
pub struct PostedSavings {
    pub transaction: SavingsTransaction,
    pub goal: SavingsGoal,
}

/// Result of executing an auto-save rule
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// A contribution was posted and the rule rescheduled
    Posted(PostedSavings),
    /// Inactive rule, or the computed amount was 0
    Skipped,
}

impl Database {
    /// Attach derived metrics to a goal
    pub fn goal_with_metrics(&self, goal: SavingsGoal) -> Result<GoalWithMetrics> {
        let credits = self.goal_credit_total(goal.id, 30)?;
        let metrics = goal_metrics(&goal, Utc::now().date_naive(), credits);
        Ok(GoalWithMetrics { goal, metrics })
    }

    /// Post a savings transaction and move the goal balance with it
    ///
    /// Ledger insert, balance update, and any completion transition commit
    /// as one store transaction. Credits add to the balance; withdrawals
    /// subtract and floor at 0. The first time the balance reaches the
    /// target on an active goal, the goal completes and exactly one
    /// goal_completed achievement is written.
    pub fn post_savings(
        &self,
        user_id: i64,
        goal_id: i64,
        effect: SavingsEffect,
        amount: f64,
        date: Option<NaiveDate>,
        description: &str,
    ) -> Result<PostedSavings> {
        if amount <= 0.0 {
            return Err(Error::Validation("Amount must be positive".to_string()));
        }

        let date = date.unwrap_or_else(|| Utc::now().date_naive());

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let (current_amount, target_amount, status, goal_name): (f64, f64, String, String) = tx
            .query_row(
                "SELECT current_amount, target_amount, status, name
                 FROM savings_goals WHERE id = ? AND user_id = ?",
                params![goal_id, user_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Error::NotFound(format!("Goal {}", goal_id))
                }
                e => Error::from(e),
            })?;

        tx.execute(
            "INSERT INTO savings_transactions (goal_id, effect, amount, date, description)
             VALUES (?, ?, ?, ?, ?)",
            params![goal_id, effect.as_str(), amount, date.to_string(), description],
        )?;
        let tx_id = tx.last_insert_rowid();

        let new_balance = if effect.is_credit() {
            current_amount + amount
        } else {
            (current_amount - amount).max(0.0)
        };

        tx.execute(
            "UPDATE savings_goals SET current_amount = ? WHERE id = ?",
            params![new_balance, goal_id],
        )?;

        // One-way completion edge, fired at most once per goal
        if new_balance >= target_amount && status == GoalStatus::Active.as_str() {
            tx.execute(
                "UPDATE savings_goals SET status = 'completed', completed_at = datetime('now') WHERE id = ?",
                params![goal_id],
            )?;

            let payload = serde_json::json!({
                "goal_id": goal_id,
                "goal_name": goal_name,
                "target_amount": target_amount,
            });
            tx.execute(
                "INSERT INTO savings_achievements (user_id, achievement_type, points, payload)
                 VALUES (?, 'goal_completed', ?, ?)",
                params![user_id, GOAL_COMPLETED_POINTS, payload.to_string()],
            )?;

            info!(goal_id, "Goal completed");
        }

        tx.commit()?;

        Ok(PostedSavings {
            transaction: self.get_savings_transaction(user_id, tx_id)?,
            goal: self.get_goal(user_id, goal_id)?,
        })
    }

    /// Execute one auto-save rule with caller-supplied ledger figures
    ///
    /// Inactive rules and zero-amount computations skip silently; execution
    /// timestamps move only when a contribution is actually posted.
    pub fn execute_rule(
        &self,
        user_id: i64,
        rule: &AutoSaveRule,
        inputs: ContributionInputs,
    ) -> Result<ExecutionOutcome> {
        if !rule.active {
            return Ok(ExecutionOutcome::Skipped);
        }

        let amount = calculate_contribution(rule, inputs);
        if amount <= 0.0 {
            debug!(rule_id = rule.id, "Rule computed no contribution");
            return Ok(ExecutionOutcome::Skipped);
        }

        let posted = self.post_savings(
            user_id,
            rule.goal_id,
            SavingsEffect::AutoSave,
            amount,
            None,
            &format!("Auto-save: {}", rule.name),
        )?;

        self.mark_rule_executed(rule, Utc::now())?;
        info!(rule_id = rule.id, amount, "Auto-save rule executed");

        Ok(ExecutionOutcome::Posted(posted))
    }

    /// Derive rule inputs from the user's ledger
    ///
    /// Income is the trailing 30 days; the smart_savings expense average is
    /// the trailing 90-day expense total spread over three months; budget
    /// excess covers budgets whose period includes today.
    pub fn rule_inputs(&self, user_id: i64) -> Result<ContributionInputs> {
        let income_amount = self.trailing_income(user_id, 30)?;
        let avg_monthly_expense = self.trailing_expenses(user_id, 90)? / 3.0;
        let budget_excess = self.budget_excess(user_id, Utc::now().date_naive())?;

        Ok(ContributionInputs {
            income_amount,
            budget_excess,
            avg_monthly_expense,
        })
    }

    /// Rebuild the user's unread recommendations from current goal state
    ///
    /// Read recommendations survive; unread ones are replaced wholesale so
    /// stale advice never lingers.
    pub fn refresh_recommendations(&self, user_id: i64) -> Result<usize> {
        self.clear_unread_recommendations(user_id)?;

        let goals = self.list_goals(user_id, Some(GoalStatus::Active))?;
        let mut created = 0;

        if goals.is_empty() {
            self.create_recommendation(
                user_id,
                None,
                "create_goal",
                "Start a savings goal",
                "You have no active savings goals. Setting a target is the first step.",
                None,
            )?;
            return Ok(1);
        }

        for goal in goals {
            let with_metrics = self.goal_with_metrics(goal)?;
            let m = &with_metrics.metrics;
            let g = &with_metrics.goal;

            if m.progress_percentage >= 90.0 {
                self.create_recommendation(
                    user_id,
                    Some(g.id),
                    "final_push",
                    &format!("{} is almost there", g.name),
                    &format!(
                        "Only {:.2} left to reach {}. One more contribution closes it out.",
                        m.remaining_amount, g.name
                    ),
                    Some(m.remaining_amount),
                )?;
                created += 1;
            } else if !m.is_on_track {
                self.create_recommendation(
                    user_id,
                    Some(g.id),
                    "increase_contribution",
                    &format!("{} is behind pace", g.name),
                    &format!(
                        "Saving {:.2} per month would hit the target by {}.",
                        m.monthly_savings_needed, g.target_date
                    ),
                    Some(m.monthly_savings_needed),
                )?;
                created += 1;
            }
        }

        Ok(created)
    }

    /// Write fresh insights from the dashboard and goal state
    pub fn refresh_insights(&self, user_id: i64) -> Result<usize> {
        let dashboard = self.savings_dashboard(user_id)?;
        let mut created = 0;

        if dashboard.monthly_savings_rate >= 20.0 {
            self.create_insight(
                user_id,
                "strong_savings_rate",
                "Strong savings rate",
                &format!(
                    "You saved {:.1}% of this month's income.",
                    dashboard.monthly_savings_rate
                ),
            )?;
            created += 1;
        }

        if dashboard.completed_goals > 0 && dashboard.active_goals == 0 {
            self.create_insight(
                user_id,
                "all_goals_done",
                "All goals completed",
                "Every goal is closed out. Time to set the next target.",
            )?;
            created += 1;
        }

        for goal in self.list_goals(user_id, Some(GoalStatus::Active))? {
            let with_metrics = self.goal_with_metrics(goal)?;
            if with_metrics.metrics.risk_level == crate::models::RiskLevel::Critical {
                self.create_insight(
                    user_id,
                    "goal_at_risk",
                    &format!("{} is at risk", with_metrics.goal.name),
                    &format!(
                        "Less than a month to the deadline with {:.1}% saved.",
                        with_metrics.metrics.progress_percentage
                    ),
                )?;
                created += 1;
            }
        }

        Ok(created)
    }

    /// Project when a goal would complete at a fixed monthly contribution
    /// and store the run
    pub fn simulate_goal(
        &self,
        user_id: i64,
        goal_id: i64,
        monthly_amount: f64,
    ) -> Result<SavingsSimulation> {
        if monthly_amount <= 0.0 {
            return Err(Error::Validation(
                "Monthly amount must be positive".to_string(),
            ));
        }

        let goal = self.get_goal(user_id, goal_id)?;
        let remaining = (goal.target_amount - goal.current_amount).max(0.0);

        let months_to_target = (remaining / monthly_amount).ceil() as i64;
        let projected_completion =
            Utc::now().date_naive() + Duration::days((months_to_target as f64 * 30.44) as i64);

        self.insert_simulation(
            user_id,
            goal_id,
            monthly_amount,
            months_to_target,
            projected_completion,
        )
    }
}
