//! Savings goal operations

use chrono::{Datelike, Duration, NaiveDate, Utc};
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    GoalPriority, GoalStatus, NewSavingsGoal, SavingsDashboard, SavingsGoal, TransactionType,
};

pub(super) fn map_goal(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavingsGoal> {
    let target_date: String = row.get(6)?;
    let priority: String = row.get(7)?;
    let status: String = row.get(8)?;
    let completed_at: Option<String> = row.get(12)?;
    let created_at: String = row.get(13)?;

    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        target_amount: row.get(4)?,
        current_amount: row.get(5)?,
        target_date: NaiveDate::parse_from_str(&target_date, "%Y-%m-%d")
            .unwrap_or_else(|_| Utc::now().date_naive()),
        priority: priority.parse().unwrap_or(GoalPriority::Medium),
        status: status.parse().unwrap_or(GoalStatus::Active),
        auto_save_percentage: row.get(9)?,
        auto_save_amount: row.get(10)?,
        auto_save_enabled: row.get(11)?,
        completed_at: completed_at.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&created_at),
    })
}

pub(super) const GOAL_COLUMNS: &str = "id, user_id, name, description, target_amount, current_amount, target_date, priority, status, auto_save_percentage, auto_save_amount, auto_save_enabled, completed_at, created_at";

impl Database {
    /// Create a savings goal
    pub fn create_goal(&self, user_id: i64, new: &NewSavingsGoal) -> Result<SavingsGoal> {
        if new.name.trim().is_empty() {
            return Err(Error::Validation("Goal name must not be empty".to_string()));
        }
        if new.target_amount <= 0.0 {
            return Err(Error::Validation(
                "Target amount must be positive".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&new.auto_save_percentage) {
            return Err(Error::Validation(
                "Auto-save percentage must be between 0 and 100".to_string(),
            ));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO savings_goals
                (user_id, name, description, target_amount, target_date, priority,
                 auto_save_percentage, auto_save_amount, auto_save_enabled)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.name,
                new.description,
                new.target_amount,
                new.target_date.to_string(),
                new.priority.as_str(),
                new.auto_save_percentage,
                new.auto_save_amount,
                new.auto_save_enabled,
            ],
        )?;

        self.get_goal(user_id, conn.last_insert_rowid())
    }

    /// Get a goal by id, scoped to its owner
    pub fn get_goal(&self, user_id: i64, id: i64) -> Result<SavingsGoal> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {GOAL_COLUMNS} FROM savings_goals WHERE id = ? AND user_id = ?"),
            params![id, user_id],
            map_goal,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Goal {}", id)),
            e => e.into(),
        })
    }

    /// List the user's goals, optionally filtered by status
    pub fn list_goals(&self, user_id: i64, status: Option<GoalStatus>) -> Result<Vec<SavingsGoal>> {
        let conn = self.conn()?;

        let goals = if let Some(status) = status {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GOAL_COLUMNS} FROM savings_goals WHERE user_id = ? AND status = ? ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map(params![user_id, status.as_str()], map_goal)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GOAL_COLUMNS} FROM savings_goals WHERE user_id = ? ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map(params![user_id], map_goal)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(goals)
    }

    /// Update a goal's definition
    ///
    /// current_amount, status, and completed_at are not touched here; the
    /// balance moves only through posted savings transactions.
    #[allow(clippy::too_many_arguments)]
    pub fn update_goal(
        &self,
        user_id: i64,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
        target_amount: Option<f64>,
        target_date: Option<NaiveDate>,
        priority: Option<GoalPriority>,
        auto_save_percentage: Option<f64>,
        auto_save_amount: Option<f64>,
        auto_save_enabled: Option<bool>,
    ) -> Result<SavingsGoal> {
        let existing = self.get_goal(user_id, id)?;

        let target_amount = target_amount.unwrap_or(existing.target_amount);
        if target_amount <= 0.0 {
            return Err(Error::Validation(
                "Target amount must be positive".to_string(),
            ));
        }
        let auto_save_percentage = auto_save_percentage.unwrap_or(existing.auto_save_percentage);
        if !(0.0..=100.0).contains(&auto_save_percentage) {
            return Err(Error::Validation(
                "Auto-save percentage must be between 0 and 100".to_string(),
            ));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE savings_goals
            SET name = ?, description = ?, target_amount = ?, target_date = ?, priority = ?,
                auto_save_percentage = ?, auto_save_amount = ?, auto_save_enabled = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                name.unwrap_or(&existing.name),
                description.or(existing.description.as_deref()),
                target_amount,
                target_date.unwrap_or(existing.target_date).to_string(),
                priority.unwrap_or(existing.priority).as_str(),
                auto_save_percentage,
                auto_save_amount.unwrap_or(existing.auto_save_amount),
                auto_save_enabled.unwrap_or(existing.auto_save_enabled),
                id,
                user_id,
            ],
        )?;

        self.get_goal(user_id, id)
    }

    /// Delete a goal and its savings ledger (cascades)
    pub fn delete_goal(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM savings_goals WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Goal {}", id)));
        }
        Ok(())
    }

    /// Move a goal to a new lifecycle status
    ///
    /// Allowed edges: active <-> paused, active/paused -> cancelled,
    /// cancelled -> active. Completed goals stay completed.
    pub fn set_goal_status(
        &self,
        user_id: i64,
        id: i64,
        status: GoalStatus,
    ) -> Result<SavingsGoal> {
        let goal = self.get_goal(user_id, id)?;

        let allowed = match (goal.status, status) {
            (GoalStatus::Active, GoalStatus::Paused) => true,
            (GoalStatus::Paused, GoalStatus::Active) => true,
            (GoalStatus::Active | GoalStatus::Paused, GoalStatus::Cancelled) => true,
            (GoalStatus::Cancelled, GoalStatus::Active) => true,
            _ => false,
        };
        if !allowed {
            return Err(Error::Validation(format!(
                "Cannot move goal from {} to {}",
                goal.status, status
            )));
        }

        let conn = self.conn()?;
        conn.execute(
            "UPDATE savings_goals SET status = ? WHERE id = ? AND user_id = ?",
            params![status.as_str(), id, user_id],
        )?;

        self.get_goal(user_id, id)
    }

    /// Sum of credits posted to a goal over the trailing `days` days
    pub fn goal_credit_total(&self, goal_id: i64, days: i64) -> Result<f64> {
        let from = Utc::now().date_naive() - Duration::days(days);

        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM savings_transactions
            WHERE goal_id = ? AND effect != 'withdrawal' AND date >= ?
            "#,
            params![goal_id, from.to_string()],
            |row| row.get(0),
        )?;

        Ok(total)
    }

    /// Cross-goal savings dashboard for a user
    pub fn savings_dashboard(&self, user_id: i64) -> Result<SavingsDashboard> {
        let conn = self.conn()?;

        let (total_saved, active, paused, completed, cancelled) = conn.query_row(
            r#"
            SELECT
                COALESCE(SUM(current_amount), 0),
                COALESCE(SUM(status = 'active'), 0),
                COALESCE(SUM(status = 'paused'), 0),
                COALESCE(SUM(status = 'completed'), 0),
                COALESCE(SUM(status = 'cancelled'), 0)
            FROM savings_goals WHERE user_id = ?
            "#,
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        )?;

        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).unwrap_or(today);

        let month_credits: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(st.amount), 0)
            FROM savings_transactions st
            JOIN savings_goals g ON g.id = st.goal_id
            WHERE g.user_id = ? AND st.effect != 'withdrawal' AND st.date >= ?
            "#,
            params![user_id, month_start.to_string()],
            |row| row.get(0),
        )?;

        let month_income =
            self.transaction_total(user_id, TransactionType::Income, month_start, today)?;

        let monthly_savings_rate = if month_income > 0.0 {
            month_credits / month_income * 100.0
        } else {
            0.0
        };

        let unread_recommendations: i64 = conn.query_row(
            "SELECT COUNT(*) FROM savings_recommendations WHERE user_id = ? AND is_read = 0",
            params![user_id],
            |row| row.get(0),
        )?;

        let active_insights: i64 = conn.query_row(
            "SELECT COUNT(*) FROM savings_insights WHERE user_id = ? AND archived = 0",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(SavingsDashboard {
            total_saved,
            active_goals: active,
            paused_goals: paused,
            completed_goals: completed,
            cancelled_goals: cancelled,
            monthly_savings_rate,
            unread_recommendations,
            active_insights,
        })
    }
}
