//! Auto-save rule operations

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{AutoSaveRule, NewAutoSaveRule, RuleFrequency, RuleType};

fn map_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<AutoSaveRule> {
    let rule_type: String = row.get(4)?;
    let frequency: String = row.get(5)?;
    let last_executed: Option<String> = row.get(12)?;
    let next_execution: Option<String> = row.get(13)?;
    let created_at: String = row.get(14)?;

    Ok(AutoSaveRule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        goal_id: row.get(2)?,
        name: row.get(3)?,
        rule_type: rule_type.parse().unwrap_or(RuleType::FixedAmount),
        frequency: frequency.parse().unwrap_or(RuleFrequency::Monthly),
        percentage: row.get(6)?,
        fixed_amount: row.get(7)?,
        max_amount: row.get(8)?,
        excess_threshold: row.get(9)?,
        excess_percentage: row.get(10)?,
        active: row.get(11)?,
        last_executed: last_executed.map(|s| parse_datetime(&s)),
        next_execution: next_execution.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&created_at),
    })
}

const RULE_COLUMNS: &str = "id, user_id, goal_id, name, rule_type, frequency, percentage, fixed_amount, max_amount, excess_threshold, excess_percentage, active, last_executed, next_execution, created_at";

impl Database {
    /// Create an auto-save rule on one of the user's goals
    pub fn create_rule(&self, user_id: i64, new: &NewAutoSaveRule) -> Result<AutoSaveRule> {
        if new.name.trim().is_empty() {
            return Err(Error::Validation("Rule name must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&new.percentage) {
            return Err(Error::Validation(
                "Percentage must be between 0 and 100".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&new.excess_percentage) {
            return Err(Error::Validation(
                "Excess percentage must be between 0 and 100".to_string(),
            ));
        }
        // Goal must exist and belong to the same user
        self.get_goal(user_id, new.goal_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO auto_save_rules
                (user_id, goal_id, name, rule_type, frequency, percentage, fixed_amount,
                 max_amount, excess_threshold, excess_percentage, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.goal_id,
                new.name,
                new.rule_type.as_str(),
                new.frequency.as_str(),
                new.percentage,
                new.fixed_amount,
                new.max_amount,
                new.excess_threshold,
                new.excess_percentage,
                new.active,
            ],
        )?;

        self.get_rule(user_id, conn.last_insert_rowid())
    }

    /// Get a rule by id, scoped to its owner
    pub fn get_rule(&self, user_id: i64, id: i64) -> Result<AutoSaveRule> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {RULE_COLUMNS} FROM auto_save_rules WHERE id = ? AND user_id = ?"),
            params![id, user_id],
            map_rule,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Rule {}", id)),
            e => e.into(),
        })
    }

    /// List the user's rules
    pub fn list_rules(&self, user_id: i64) -> Result<Vec<AutoSaveRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RULE_COLUMNS} FROM auto_save_rules WHERE user_id = ? ORDER BY created_at DESC"
        ))?;

        let rules = stmt
            .query_map(params![user_id], map_rule)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Update a rule's definition
    pub fn update_rule(
        &self,
        user_id: i64,
        id: i64,
        new: &NewAutoSaveRule,
    ) -> Result<AutoSaveRule> {
        self.get_rule(user_id, id)?;
        self.get_goal(user_id, new.goal_id)?;

        if new.name.trim().is_empty() {
            return Err(Error::Validation("Rule name must not be empty".to_string()));
        }
        if !(0.0..=100.0).contains(&new.percentage) {
            return Err(Error::Validation(
                "Percentage must be between 0 and 100".to_string(),
            ));
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE auto_save_rules
            SET goal_id = ?, name = ?, rule_type = ?, frequency = ?, percentage = ?,
                fixed_amount = ?, max_amount = ?, excess_threshold = ?, excess_percentage = ?,
                active = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                new.goal_id,
                new.name,
                new.rule_type.as_str(),
                new.frequency.as_str(),
                new.percentage,
                new.fixed_amount,
                new.max_amount,
                new.excess_threshold,
                new.excess_percentage,
                new.active,
                id,
                user_id,
            ],
        )?;

        self.get_rule(user_id, id)
    }

    /// Delete a rule
    pub fn delete_rule(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM auto_save_rules WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Rule {}", id)));
        }
        Ok(())
    }

    /// Toggle a rule's active flag
    pub fn set_rule_active(&self, user_id: i64, id: i64, active: bool) -> Result<AutoSaveRule> {
        self.get_rule(user_id, id)?;

        let conn = self.conn()?;
        conn.execute(
            "UPDATE auto_save_rules SET active = ? WHERE id = ? AND user_id = ?",
            params![active, id, user_id],
        )?;

        self.get_rule(user_id, id)
    }

    /// Active rules whose next execution is due at `now`
    ///
    /// A rule that has never been scheduled (next_execution NULL) is due.
    pub fn list_due_rules(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<AutoSaveRule>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {RULE_COLUMNS}
            FROM auto_save_rules
            WHERE user_id = ? AND active = 1
              AND (next_execution IS NULL OR next_execution <= ?)
            ORDER BY id
            "#
        ))?;

        let rules = stmt
            .query_map(
                params![user_id, now.format("%Y-%m-%d %H:%M:%S").to_string()],
                map_rule,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rules)
    }

    /// Record a successful execution and schedule the next one
    pub(crate) fn mark_rule_executed(&self, rule: &AutoSaveRule, now: DateTime<Utc>) -> Result<()> {
        let next = now + rule.frequency.interval();

        let conn = self.conn()?;
        conn.execute(
            "UPDATE auto_save_rules SET last_executed = ?, next_execution = ? WHERE id = ?",
            params![
                now.format("%Y-%m-%d %H:%M:%S").to_string(),
                next.format("%Y-%m-%d %H:%M:%S").to_string(),
                rule.id
            ],
        )?;

        Ok(())
    }
}
