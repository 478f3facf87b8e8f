//! Budget operations

use chrono::NaiveDate;
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Budget, BudgetWithUsage, TransactionType};

fn map_budget(row: &rusqlite::Row<'_>) -> rusqlite::Result<Budget> {
    let start_str: String = row.get(4)?;
    let end_str: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(Budget {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        start_date: NaiveDate::parse_from_str(&start_str, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        end_date: NaiveDate::parse_from_str(&end_str, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        created_at: parse_datetime(&created_at),
    })
}

const BUDGET_COLUMNS: &str = "id, user_id, category_id, amount, start_date, end_date, created_at";

impl Database {
    /// Create a budget for a category over a date range
    pub fn create_budget(
        &self,
        user_id: i64,
        category_id: i64,
        amount: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Budget> {
        if amount <= 0.0 {
            return Err(Error::Validation(
                "Budget amount must be positive".to_string(),
            ));
        }
        if end_date < start_date {
            return Err(Error::Validation(
                "Budget end date must not precede start date".to_string(),
            ));
        }
        self.get_category(user_id, category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO budgets (user_id, category_id, amount, start_date, end_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                category_id,
                amount,
                start_date.to_string(),
                end_date.to_string()
            ],
        )?;

        self.get_budget(user_id, conn.last_insert_rowid())
    }

    /// Get a budget by id, scoped to its owner
    pub fn get_budget(&self, user_id: i64, id: i64) -> Result<Budget> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {BUDGET_COLUMNS} FROM budgets WHERE id = ? AND user_id = ?"),
            params![id, user_id],
            map_budget,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Budget {}", id)),
            e => e.into(),
        })
    }

    /// List the user's budgets
    pub fn list_budgets(&self, user_id: i64) -> Result<Vec<Budget>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BUDGET_COLUMNS} FROM budgets WHERE user_id = ? ORDER BY start_date DESC"
        ))?;

        let budgets = stmt
            .query_map(params![user_id], map_budget)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(budgets)
    }

    /// Update a budget
    pub fn update_budget(
        &self,
        user_id: i64,
        id: i64,
        amount: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Budget> {
        self.get_budget(user_id, id)?;

        if amount <= 0.0 {
            return Err(Error::Validation(
                "Budget amount must be positive".to_string(),
            ));
        }
        if end_date < start_date {
            return Err(Error::Validation(
                "Budget end date must not precede start date".to_string(),
            ));
        }

        let conn = self.conn()?;
        conn.execute(
            "UPDATE budgets SET amount = ?, start_date = ?, end_date = ? WHERE id = ? AND user_id = ?",
            params![
                amount,
                start_date.to_string(),
                end_date.to_string(),
                id,
                user_id
            ],
        )?;

        self.get_budget(user_id, id)
    }

    /// Delete a budget
    pub fn delete_budget(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM budgets WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Budget {}", id)));
        }
        Ok(())
    }

    /// Attach usage figures derived from the ledger
    pub fn budget_usage(&self, budget: Budget) -> Result<BudgetWithUsage> {
        let conn = self.conn()?;
        let spent: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = ? AND category_id = ? AND transaction_type = ?
              AND date >= ? AND date <= ?
            "#,
            params![
                budget.user_id,
                budget.category_id,
                TransactionType::Expense.as_str(),
                budget.start_date.to_string(),
                budget.end_date.to_string()
            ],
            |row| row.get(0),
        )?;

        let percent_used = if budget.amount > 0.0 {
            (spent / budget.amount * 100.0).min(100.0)
        } else {
            0.0
        };

        Ok(BudgetWithUsage {
            remaining: (budget.amount - spent).max(0.0),
            percent_used,
            spent,
            budget,
        })
    }

    /// Total unspent budget across budgets whose period covers `on`
    ///
    /// Overspent budgets contribute 0, never a negative.
    pub fn budget_excess(&self, user_id: i64, on: NaiveDate) -> Result<f64> {
        let mut excess = 0.0;
        for budget in self.list_budgets(user_id)? {
            if budget.start_date <= on && on <= budget.end_date {
                let usage = self.budget_usage(budget)?;
                excess += usage.remaining;
            }
        }
        Ok(excess)
    }
}
