//! Savings transaction reads
//!
//! The savings ledger is append-only. Inserts happen inside
//! [`Database::post_savings`](crate::savings) so the goal balance and the
//! ledger move together; this module only reads.

use chrono::NaiveDate;
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{SavingsEffect, SavingsTransaction};

pub(super) fn map_savings_tx(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavingsTransaction> {
    let effect: String = row.get(2)?;
    let date: String = row.get(4)?;
    let created_at: String = row.get(6)?;

    Ok(SavingsTransaction {
        id: row.get(0)?,
        goal_id: row.get(1)?,
        effect: effect.parse().unwrap_or(SavingsEffect::Deposit),
        amount: row.get(3)?,
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        description: row.get(5)?,
        created_at: parse_datetime(&created_at),
    })
}

const SAVINGS_TX_COLUMNS: &str = "id, goal_id, effect, amount, date, description, created_at";

impl Database {
    /// Get a savings transaction, scoped to the goal's owner
    pub fn get_savings_transaction(&self, user_id: i64, id: i64) -> Result<SavingsTransaction> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                r#"
                SELECT st.{cols}
                FROM savings_transactions st
                JOIN savings_goals g ON g.id = st.goal_id
                WHERE st.id = ? AND g.user_id = ?
                "#,
                cols = SAVINGS_TX_COLUMNS.replace(", ", ", st.")
            ),
            params![id, user_id],
            map_savings_tx,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                Error::NotFound(format!("Savings transaction {}", id))
            }
            e => e.into(),
        })
    }

    /// List savings transactions, newest first, across the user's goals or
    /// for one goal
    pub fn list_savings_transactions(
        &self,
        user_id: i64,
        goal_id: Option<i64>,
    ) -> Result<Vec<SavingsTransaction>> {
        if let Some(goal_id) = goal_id {
            // 404 for a missing or foreign goal
            self.get_goal(user_id, goal_id)?;
        }

        let conn = self.conn()?;
        let cols = SAVINGS_TX_COLUMNS.replace(", ", ", st.");

        let transactions = if let Some(goal_id) = goal_id {
            let mut stmt = conn.prepare(&format!(
                r#"
                SELECT st.{cols}
                FROM savings_transactions st
                JOIN savings_goals g ON g.id = st.goal_id
                WHERE g.user_id = ? AND st.goal_id = ?
                ORDER BY st.date DESC, st.id DESC
                "#
            ))?;
            let rows = stmt
                .query_map(params![user_id, goal_id], map_savings_tx)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let mut stmt = conn.prepare(&format!(
                r#"
                SELECT st.{cols}
                FROM savings_transactions st
                JOIN savings_goals g ON g.id = st.goal_id
                WHERE g.user_id = ?
                ORDER BY st.date DESC, st.id DESC
                "#
            ))?;
            let rows = stmt
                .query_map(params![user_id], map_savings_tx)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        Ok(transactions)
    }
}
