//! Recommendations, insights, achievements, reminders, and simulations
//!
//! These are inert records around the savings engine. Recommendations and
//! insights are produced by analysis passes, achievements by qualifying
//! events, reminders and simulations by the user.

use chrono::NaiveDate;
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    ReminderFrequency, SavingsAchievement, SavingsInsight, SavingsRecommendation, SavingsReminder,
    SavingsSimulation,
};

fn map_recommendation(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavingsRecommendation> {
    let created_at: String = row.get(8)?;
    Ok(SavingsRecommendation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        goal_id: row.get(2)?,
        recommendation_type: row.get(3)?,
        title: row.get(4)?,
        message: row.get(5)?,
        suggested_amount: row.get(6)?,
        is_read: row.get(7)?,
        created_at: parse_datetime(&created_at),
    })
}

fn map_insight(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavingsInsight> {
    let created_at: String = row.get(6)?;
    Ok(SavingsInsight {
        id: row.get(0)?,
        user_id: row.get(1)?,
        insight_type: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        archived: row.get(5)?,
        created_at: parse_datetime(&created_at),
    })
}

fn map_reminder(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavingsReminder> {
    let remind_on: String = row.get(4)?;
    let frequency: String = row.get(5)?;
    let created_at: String = row.get(7)?;

    Ok(SavingsReminder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        goal_id: row.get(2)?,
        message: row.get(3)?,
        remind_on: NaiveDate::parse_from_str(&remind_on, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        frequency: frequency.parse().unwrap_or(ReminderFrequency::Once),
        active: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    // ===== Recommendations =====

    /// Insert a recommendation, unread
    pub fn create_recommendation(
        &self,
        user_id: i64,
        goal_id: Option<i64>,
        recommendation_type: &str,
        title: &str,
        message: &str,
        suggested_amount: Option<f64>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO savings_recommendations
                (user_id, goal_id, recommendation_type, title, message, suggested_amount)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                goal_id,
                recommendation_type,
                title,
                message,
                suggested_amount
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List the user's recommendations, newest first
    pub fn list_recommendations(&self, user_id: i64) -> Result<Vec<SavingsRecommendation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, goal_id, recommendation_type, title, message, suggested_amount, is_read, created_at
            FROM savings_recommendations WHERE user_id = ? ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let recommendations = stmt
            .query_map(params![user_id], map_recommendation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recommendations)
    }

    /// Mark a recommendation as read
    pub fn mark_recommendation_read(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE savings_recommendations SET is_read = 1 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Recommendation {}", id)));
        }
        Ok(())
    }

    /// Drop unread recommendations so an analysis pass can replace them
    pub(crate) fn clear_unread_recommendations(&self, user_id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM savings_recommendations WHERE user_id = ? AND is_read = 0",
            params![user_id],
        )?;
        Ok(())
    }

    // ===== Insights =====

    /// Insert an insight
    pub fn create_insight(
        &self,
        user_id: i64,
        insight_type: &str,
        title: &str,
        message: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO savings_insights (user_id, insight_type, title, message) VALUES (?, ?, ?, ?)",
            params![user_id, insight_type, title, message],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List the user's insights, newest first
    ///
    /// Archived insights are included only when `include_archived` is set.
    pub fn list_insights(
        &self,
        user_id: i64,
        include_archived: bool,
    ) -> Result<Vec<SavingsInsight>> {
        let conn = self.conn()?;
        let query = if include_archived {
            "SELECT id, user_id, insight_type, title, message, archived, created_at
             FROM savings_insights WHERE user_id = ? ORDER BY created_at DESC, id DESC"
        } else {
            "SELECT id, user_id, insight_type, title, message, archived, created_at
             FROM savings_insights WHERE user_id = ? AND archived = 0 ORDER BY created_at DESC, id DESC"
        };

        let mut stmt = conn.prepare(query)?;
        let insights = stmt
            .query_map(params![user_id], map_insight)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(insights)
    }

    /// Archive an insight
    pub fn archive_insight(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE savings_insights SET archived = 1 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Insight {}", id)));
        }
        Ok(())
    }

    // ===== Achievements =====

    /// List the user's achievements, newest first
    pub fn list_achievements(&self, user_id: i64) -> Result<Vec<SavingsAchievement>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, achievement_type, points, payload, created_at
             FROM savings_achievements WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )?;

        let achievements = stmt
            .query_map(params![user_id], |row| {
                let payload: String = row.get(4)?;
                let created_at: String = row.get(5)?;
                Ok(SavingsAchievement {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    achievement_type: row.get(2)?,
                    points: row.get(3)?,
                    payload: serde_json::from_str(&payload)
                        .unwrap_or(serde_json::Value::Null),
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(achievements)
    }

    /// Total achievement points for a user
    pub fn achievement_points(&self, user_id: i64) -> Result<i64> {
        let conn = self.conn()?;
        let points: i64 = conn.query_row(
            "SELECT COALESCE(SUM(points), 0) FROM savings_achievements WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(points)
    }

    // ===== Reminders =====

    /// Create a reminder on one of the user's goals
    pub fn create_reminder(
        &self,
        user_id: i64,
        goal_id: i64,
        message: &str,
        remind_on: NaiveDate,
        frequency: ReminderFrequency,
    ) -> Result<SavingsReminder> {
        self.get_goal(user_id, goal_id)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO savings_reminders (user_id, goal_id, message, remind_on, frequency) VALUES (?, ?, ?, ?, ?)",
            params![
                user_id,
                goal_id,
                message,
                remind_on.to_string(),
                frequency.as_str()
            ],
        )?;

        self.get_reminder(user_id, conn.last_insert_rowid())
    }

    /// Get a reminder by id, scoped to its owner
    pub fn get_reminder(&self, user_id: i64, id: i64) -> Result<SavingsReminder> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, user_id, goal_id, message, remind_on, frequency, active, created_at
             FROM savings_reminders WHERE id = ? AND user_id = ?",
            params![id, user_id],
            map_reminder,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Reminder {}", id)),
            e => e.into(),
        })
    }

    /// List the user's reminders, soonest first
    pub fn list_reminders(&self, user_id: i64) -> Result<Vec<SavingsReminder>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, goal_id, message, remind_on, frequency, active, created_at
             FROM savings_reminders WHERE user_id = ? ORDER BY remind_on, id",
        )?;

        let reminders = stmt
            .query_map(params![user_id], map_reminder)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(reminders)
    }

    /// Deactivate a reminder
    pub fn deactivate_reminder(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE savings_reminders SET active = 0 WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Reminder {}", id)));
        }
        Ok(())
    }

    /// Delete a reminder
    pub fn delete_reminder(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM savings_reminders WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Reminder {}", id)));
        }
        Ok(())
    }

    // ===== Simulations =====

    /// Store a simulation run
    pub(crate) fn insert_simulation(
        &self,
        user_id: i64,
        goal_id: i64,
        monthly_amount: f64,
        months_to_target: i64,
        projected_completion: NaiveDate,
    ) -> Result<SavingsSimulation> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO savings_simulations
                (user_id, goal_id, monthly_amount, months_to_target, projected_completion)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                goal_id,
                monthly_amount,
                months_to_target,
                projected_completion.to_string()
            ],
        )?;

        self.get_simulation(user_id, conn.last_insert_rowid())
    }

    /// Get a simulation by id, scoped to its owner
    pub fn get_simulation(&self, user_id: i64, id: i64) -> Result<SavingsSimulation> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, user_id, goal_id, monthly_amount, months_to_target, projected_completion, created_at
             FROM savings_simulations WHERE id = ? AND user_id = ?",
            params![id, user_id],
            |row| {
                let projected: String = row.get(5)?;
                let created_at: String = row.get(6)?;
                Ok(SavingsSimulation {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    goal_id: row.get(2)?,
                    monthly_amount: row.get(3)?,
                    months_to_target: row.get(4)?,
                    projected_completion: NaiveDate::parse_from_str(&projected, "%Y-%m-%d")
                        .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
                    created_at: parse_datetime(&created_at),
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Simulation {}", id)),
            e => e.into(),
        })
    }

    /// List the user's stored simulations, newest first
    pub fn list_simulations(&self, user_id: i64) -> Result<Vec<SavingsSimulation>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, goal_id, monthly_amount, months_to_target, projected_completion, created_at
             FROM savings_simulations WHERE user_id = ? ORDER BY created_at DESC, id DESC",
        )?;

        let simulations = stmt
            .query_map(params![user_id], |row| {
                let projected: String = row.get(5)?;
                let created_at: String = row.get(6)?;
                Ok(SavingsSimulation {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    goal_id: row.get(2)?,
                    monthly_amount: row.get(3)?,
                    months_to_target: row.get(4)?,
                    projected_completion: NaiveDate::parse_from_str(&projected, "%Y-%m-%d")
                        .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
                    created_at: parse_datetime(&created_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(simulations)
    }
}
