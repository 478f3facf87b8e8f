//! Category operations

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, CategorySummary, TransactionFilter};

fn map_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let created_at: String = row.get(5)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
        icon: row.get(4)?,
        created_at: parse_datetime(&created_at),
    })
}

impl Database {
    /// Create a category
    ///
    /// Names are unique per user.
    pub fn create_category(
        &self,
        user_id: i64,
        name: &str,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(Error::Validation(
                "Category name must not be empty".to_string(),
            ));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, color, icon) VALUES (?, ?, COALESCE(?, '#3B82F6'), ?)",
            params![user_id, name, color, icon],
        )?;

        self.get_category(user_id, conn.last_insert_rowid())
    }

    /// Get a category by id, scoped to its owner
    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Category> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT id, user_id, name, color, icon, created_at FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
            map_category,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound(format!("Category {}", id)),
            e => e.into(),
        })
    }

    /// List the user's categories
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, color, icon, created_at FROM categories WHERE user_id = ? ORDER BY name",
        )?;

        let categories = stmt
            .query_map(params![user_id], map_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// Update a category's mutable fields
    pub fn update_category(
        &self,
        user_id: i64,
        id: i64,
        name: Option<&str>,
        color: Option<&str>,
        icon: Option<&str>,
    ) -> Result<Category> {
        // Ownership check doubles as an existence check
        let existing = self.get_category(user_id, id)?;

        if let Some(n) = name {
            if n.trim().is_empty() {
                return Err(Error::Validation(
                    "Category name must not be empty".to_string(),
                ));
            }
        }

        let conn = self.conn()?;
        conn.execute(
            "UPDATE categories SET name = ?, color = ?, icon = ? WHERE id = ? AND user_id = ?",
            params![
                name.unwrap_or(&existing.name),
                color.unwrap_or(&existing.color),
                icon.or(existing.icon.as_deref()),
                id,
                user_id
            ],
        )?;

        self.get_category(user_id, id)
    }

    /// Delete a category
    ///
    /// Ledger transactions keep their rows with category_id set to NULL;
    /// budgets on the category are removed.
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound(format!("Category {}", id)));
        }
        Ok(())
    }

    /// Aggregates over a category's transactions, optionally filtered
    ///
    /// All three aggregates are 0 when nothing matches.
    pub fn category_summary(
        &self,
        user_id: i64,
        id: i64,
        filter: TransactionFilter,
    ) -> Result<CategorySummary> {
        // 404 for a missing or foreign category, not an empty summary
        self.get_category(user_id, id)?;

        let mut query = String::from(
            "SELECT COALESCE(SUM(amount), 0), COUNT(*), COALESCE(AVG(amount), 0)
             FROM transactions WHERE category_id = ? AND user_id = ?",
        );
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(id), Box::new(user_id)];

        if let Some(tt) = filter.transaction_type {
            query.push_str(" AND transaction_type = ?");
            params_vec.push(Box::new(tt.as_str()));
        }
        if let Some(from) = filter.from {
            query.push_str(" AND date >= ?");
            params_vec.push(Box::new(from.to_string()));
        }
        if let Some(to) = filter.to {
            query.push_str(" AND date <= ?");
            params_vec.push(Box::new(to.to_string()));
        }

        let conn = self.conn()?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let (total, count, average) = conn.query_row(&query, params_refs.as_slice(), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;

        Ok(CategorySummary {
            category_id: id,
            total,
            count,
            average,
        })
    }
}
