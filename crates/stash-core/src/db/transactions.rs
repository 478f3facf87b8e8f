//! Ledger transaction operations and period aggregates

use chrono::{Duration, NaiveDate};
use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{
    CategoryBreakdown, NewTransaction, Transaction, TransactionFilter, TransactionSummary,
    TransactionType,
};

fn map_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let type_str: String = row.get(3)?;
    let date_str: String = row.get(5)?;
    let created_at: String = row.get(7)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        transaction_type: type_str.parse().unwrap_or(TransactionType::Expense),
        amount: row.get(4)?,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .unwrap_or_else(|_| chrono::Utc::now().date_naive()),
        description: row.get(6)?,
        created_at: parse_datetime(&created_at),
    })
}

const TX_COLUMNS: &str =
    "id, user_id, category_id, transaction_type, amount, date, description, created_at";

impl Database {
    /// Create a ledger transaction
    pub fn create_transaction(&self, user_id: i64, new: &NewTransaction) -> Result<Transaction> {
        if new.amount <= 0.0 {
            return Err(Error::Validation("Amount must be positive".to_string()));
        }
        if let Some(cat_id) = new.category_id {
            // Rejects categories owned by someone else
            self.get_category(user_id, cat_id)?;
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO transactions (user_id, category_id, transaction_type, amount, date, description)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                new.category_id,
                new.transaction_type.as_str(),
                new.amount,
                new.date.to_string(),
                new.description,
            ],
        )?;

        self.get_transaction(user_id, conn.last_insert_rowid())
    }

    /// Get a transaction by id, scoped to its owner
    pub fn get_transaction(&self, user_id: i64, id: i64) -> Result<Transaction> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {TX_COLUMNS} FROM transactions WHERE id = ? AND user_id = ?"),
            params![id, user_id],
            map_transaction,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Transaction {}", id)),
            e => e.into(),
        })
    }

    /// List the user's transactions, newest first, with optional filters
    pub fn list_transactions(
        &self,
        user_id: i64,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let mut query =
            format!("SELECT {TX_COLUMNS} FROM transactions WHERE user_id = ?");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(tt) = filter.transaction_type {
            query.push_str(" AND transaction_type = ?");
            params_vec.push(Box::new(tt.as_str()));
        }
        if let Some(cat_id) = filter.category_id {
            query.push_str(" AND category_id = ?");
            params_vec.push(Box::new(cat_id));
        }
        if let Some(from) = filter.from {
            query.push_str(" AND date >= ?");
            params_vec.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            query.push_str(" AND date <= ?");
            params_vec.push(Box::new(to.to_string()));
        }
        query.push_str(" ORDER BY date DESC, id DESC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&query)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let transactions = stmt
            .query_map(params_refs.as_slice(), map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Update a transaction's mutable fields
    pub fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        new: &NewTransaction,
    ) -> Result<Transaction> {
        self.get_transaction(user_id, id)?;

        if new.amount <= 0.0 {
            return Err(Error::Validation("Amount must be positive".to_string()));
        }
        if let Some(cat_id) = new.category_id {
            self.get_category(user_id, cat_id)?;
        }

        let conn = self.conn()?;
        conn.execute(
            r#"
            UPDATE transactions
            SET category_id = ?, transaction_type = ?, amount = ?, date = ?, description = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                new.category_id,
                new.transaction_type.as_str(),
                new.amount,
                new.date.to_string(),
                new.description,
                id,
                user_id,
            ],
        )?;

        self.get_transaction(user_id, id)
    }

    /// Delete a transaction
    pub fn delete_transaction(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    /// Sum amounts of one transaction type within a date range (inclusive)
    pub fn transaction_total(
        &self,
        user_id: i64,
        transaction_type: TransactionType,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<f64> {
        let conn = self.conn()?;
        let total: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(amount), 0)
            FROM transactions
            WHERE user_id = ? AND transaction_type = ? AND date >= ? AND date <= ?
            "#,
            params![
                user_id,
                transaction_type.as_str(),
                from.to_string(),
                to.to_string()
            ],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// Total ledger income over the trailing `days` days, ending today
    pub fn trailing_income(&self, user_id: i64, days: i64) -> Result<f64> {
        let today = chrono::Utc::now().date_naive();
        self.transaction_total(user_id, TransactionType::Income, today - Duration::days(days), today)
    }

    /// Total ledger expenses over the trailing `days` days, ending today
    pub fn trailing_expenses(&self, user_id: i64, days: i64) -> Result<f64> {
        let today = chrono::Utc::now().date_naive();
        self.transaction_total(
            user_id,
            TransactionType::Expense,
            today - Duration::days(days),
            today,
        )
    }

    /// Income, expenses, net, and per-category expense breakdown for a range
    ///
    /// Breakdown percentages are shares of the expense total, 0 when the
    /// total is 0. Uncategorized expenses appear under "Uncategorized".
    pub fn transaction_summary(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<TransactionSummary> {
        let income = self.transaction_total(user_id, TransactionType::Income, from, to)?;
        let expenses = self.transaction_total(user_id, TransactionType::Expense, from, to)?;

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT t.category_id, COALESCE(c.name, 'Uncategorized'), SUM(t.amount), COUNT(*)
            FROM transactions t
            LEFT JOIN categories c ON c.id = t.category_id
            WHERE t.user_id = ? AND t.transaction_type = 'expense' AND t.date >= ? AND t.date <= ?
            GROUP BY t.category_id
            ORDER BY SUM(t.amount) DESC
            "#,
        )?;

        let by_category = stmt
            .query_map(
                params![user_id, from.to_string(), to.to_string()],
                |row| {
                    let amount: f64 = row.get(2)?;
                    Ok(CategoryBreakdown {
                        category_id: row.get(0)?,
                        category_name: row.get(1)?,
                        amount,
                        percentage: if expenses > 0.0 {
                            amount / expenses * 100.0
                        } else {
                            0.0
                        },
                        transaction_count: row.get(3)?,
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(TransactionSummary {
            from,
            to,
            income,
            expenses,
            net: income - expenses,
            by_category,
        })
    }
}
