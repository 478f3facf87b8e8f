//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `users` - User accounts, password hashing, session tokens
//! - `categories` - Category CRUD and per-category aggregates
//! - `transactions` - Ledger CRUD, filtering, and period summaries
//! - `budgets` - Budget CRUD with derived usage
//! - `reports` - Stored report records and report generation
//! - `goals` - Savings goal CRUD and dashboard aggregates
//! - `savings_transactions` - Append-only savings ledger
//! - `rules` - Auto-save rule CRUD and execution bookkeeping
//! - `engagement` - Recommendations, insights, achievements, reminders,
//!   simulations

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tracing::info;

use crate::error::Result;

mod budgets;
mod categories;
mod engagement;
mod goals;
mod reports;
mod rules;
mod savings_transactions;
mod transactions;
mod users;

pub use users::AuthUser;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Row counts across all users
#[derive(Debug, Clone, Copy)]
pub struct DatabaseStats {
    pub users: i64,
    pub transactions: i64,
    pub active_goals: i64,
    pub active_rules: i64,
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool, running migrations on open
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create an in-memory database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` so every pooled
    /// connection sees the same database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = format!(
            "{}/stash_test_{}_{}.db",
            std::env::temp_dir().display(),
            std::process::id(),
            id
        );

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Whole-database row counts, for the CLI status command
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM transactions),
                (SELECT COUNT(*) FROM savings_goals WHERE status = 'active'),
                (SELECT COUNT(*) FROM auto_save_rules WHERE active = 1)",
            [],
            |row| {
                Ok(DatabaseStats {
                    users: row.get(0)?,
                    transactions: row.get(1)?,
                    active_goals: row.get(2)?,
                    active_rules: row.get(3)?,
                })
            },
        )
        .map_err(Into::into)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- Performance pragmas for local storage
            -- WAL mode: better concurrency, readers don't block writers
            PRAGMA journal_mode = WAL;

            -- Cache size: ~8MB (2000 pages * 4KB default page size)
            PRAGMA cache_size = 2000;

            -- Synchronous NORMAL: good balance of safety and performance
            PRAGMA synchronous = NORMAL;

            -- Store temp tables in memory (faster for aggregate queries)
            PRAGMA temp_store = MEMORY;

            -- Users
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Sessions (opaque bearer tokens, stored as SHA-256 digests)
            CREATE TABLE IF NOT EXISTS sessions (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                expires_at DATETIME NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_expires ON sessions(expires_at);

            -- Categories (user-defined transaction buckets)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT '#3B82F6',
                icon TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);

            -- Ledger transactions
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                transaction_type TEXT NOT NULL,            -- income, expense
                amount REAL NOT NULL,                      -- always positive
                date DATE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_category ON transactions(category_id);
            CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
            CREATE INDEX IF NOT EXISTS idx_transactions_type ON transactions(transaction_type);

            -- Budgets (per-category spending limits over a period)
            CREATE TABLE IF NOT EXISTS budgets (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                amount REAL NOT NULL,
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_budgets_user ON budgets(user_id);
            CREATE INDEX IF NOT EXISTS idx_budgets_category ON budgets(category_id);
            CREATE INDEX IF NOT EXISTS idx_budgets_dates ON budgets(start_date, end_date);

            -- Reports (generated data stored as JSON)
            CREATE TABLE IF NOT EXISTS reports (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                report_type TEXT NOT NULL,                 -- monthly_summary, spending_by_category
                start_date DATE NOT NULL,
                end_date DATE NOT NULL,
                generated_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                data TEXT NOT NULL                         -- JSON payload
            );

            CREATE INDEX IF NOT EXISTS idx_reports_user ON reports(user_id);
            CREATE INDEX IF NOT EXISTS idx_reports_type ON reports(report_type);

            -- Savings goals
            CREATE TABLE IF NOT EXISTS savings_goals (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT,
                target_amount REAL NOT NULL,
                current_amount REAL NOT NULL DEFAULT 0,    -- mutated only via posted savings transactions
                target_date DATE NOT NULL,
                priority TEXT NOT NULL DEFAULT 'medium',   -- low, medium, high, critical
                status TEXT NOT NULL DEFAULT 'active',     -- active, paused, completed, cancelled
                auto_save_percentage REAL NOT NULL DEFAULT 0,
                auto_save_amount REAL NOT NULL DEFAULT 0,
                auto_save_enabled BOOLEAN NOT NULL DEFAULT 0,
                completed_at DATETIME,                     -- stamped exactly once
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_goals_user ON savings_goals(user_id);
            CREATE INDEX IF NOT EXISTS idx_goals_status ON savings_goals(status);

            -- Savings transactions (append-only ledger per goal)
            CREATE TABLE IF NOT EXISTS savings_transactions (
                id INTEGER PRIMARY KEY,
                goal_id INTEGER NOT NULL REFERENCES savings_goals(id) ON DELETE CASCADE,
                effect TEXT NOT NULL,                      -- deposit, withdrawal, adjustment, auto_save, excess_savings
                amount REAL NOT NULL,                      -- always positive
                date DATE NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_savings_tx_goal ON savings_transactions(goal_id);
            CREATE INDEX IF NOT EXISTS idx_savings_tx_date ON savings_transactions(date);

            -- Auto-save rules
            CREATE TABLE IF NOT EXISTS auto_save_rules (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                goal_id INTEGER NOT NULL REFERENCES savings_goals(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                rule_type TEXT NOT NULL,                   -- percentage_income, fixed_amount, excess_budget, round_up, smart_savings
                frequency TEXT NOT NULL DEFAULT 'monthly', -- daily, weekly, biweekly, monthly
                percentage REAL NOT NULL DEFAULT 0,
                fixed_amount REAL NOT NULL DEFAULT 0,
                max_amount REAL,                           -- optional cap
                excess_threshold REAL NOT NULL DEFAULT 0,
                excess_percentage REAL NOT NULL DEFAULT 0,
                active BOOLEAN NOT NULL DEFAULT 1,
                last_executed DATETIME,                    -- updated only by successful execution
                next_execution DATETIME,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_rules_user ON auto_save_rules(user_id);
            CREATE INDEX IF NOT EXISTS idx_rules_goal ON auto_save_rules(goal_id);
            CREATE INDEX IF NOT EXISTS idx_rules_active ON auto_save_rules(active);

            -- Savings recommendations
            CREATE TABLE IF NOT EXISTS savings_recommendations (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                goal_id INTEGER REFERENCES savings_goals(id) ON DELETE CASCADE,
                recommendation_type TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                suggested_amount REAL,
                is_read BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_recommendations_user ON savings_recommendations(user_id);
            CREATE INDEX IF NOT EXISTS idx_recommendations_read ON savings_recommendations(is_read);

            -- Savings insights
            CREATE TABLE IF NOT EXISTS savings_insights (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                insight_type TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                archived BOOLEAN NOT NULL DEFAULT 0,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_insights_user ON savings_insights(user_id);
            CREATE INDEX IF NOT EXISTS idx_insights_archived ON savings_insights(archived);

            -- Savings achievements (write-once)
            CREATE TABLE IF NOT EXISTS savings_achievements (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                achievement_type TEXT NOT NULL,
                points INTEGER NOT NULL DEFAULT 0,
                payload TEXT NOT NULL DEFAULT '{}',        -- JSON event context
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_achievements_user ON savings_achievements(user_id);
            CREATE INDEX IF NOT EXISTS idx_achievements_type ON savings_achievements(achievement_type);

            -- Savings reminders
            CREATE TABLE IF NOT EXISTS savings_reminders (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                goal_id INTEGER NOT NULL REFERENCES savings_goals(id) ON DELETE CASCADE,
                message TEXT NOT NULL,
                remind_on DATE NOT NULL,
                frequency TEXT NOT NULL DEFAULT 'once',    -- once, weekly, monthly
                active BOOLEAN NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_reminders_user ON savings_reminders(user_id);
            CREATE INDEX IF NOT EXISTS idx_reminders_goal ON savings_reminders(goal_id);

            -- Savings simulations (stored what-if projections)
            CREATE TABLE IF NOT EXISTS savings_simulations (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                goal_id INTEGER NOT NULL REFERENCES savings_goals(id) ON DELETE CASCADE,
                monthly_amount REAL NOT NULL,
                months_to_target INTEGER NOT NULL,
                projected_completion DATE NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_simulations_user ON savings_simulations(user_id);
            CREATE INDEX IF NOT EXISTS idx_simulations_goal ON savings_simulations(goal_id);
            "#,
        )?;

        info!("Database schema initialized");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
