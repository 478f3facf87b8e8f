//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `resolve_user` - Pick the account a command operates on
//! - `cmd_init` - Initialize the database
//! - `cmd_status` - Show database status

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use stash_core::models::User;
use stash_core::Database;

/// Open the database, creating its parent directory if needed
pub fn open_db(db_path: &Path) -> Result<Database> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path must be valid UTF-8"))?;
    Database::new(path_str).context("Failed to open database")
}

/// Resolve the account a command operates on
///
/// With --user the name must match an existing account. Without it the
/// single existing account is used; anything else is an error.
pub fn resolve_user(db: &Database, username: Option<&str>) -> Result<User> {
    let mut users = db.list_users()?;

    match username {
        Some(name) => users
            .into_iter()
            .find(|u| u.username == name)
            .ok_or_else(|| anyhow!("No such user: {}", name)),
        None => match users.len() {
            0 => Err(anyhow!(
                "No accounts yet. Create one with: stash users add <name>"
            )),
            1 => Ok(users.remove(0)),
            _ => {
                let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
                Err(anyhow!(
                    "Multiple accounts ({}). Pick one with --user",
                    names.join(", ")
                ))
            }
        },
    }
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path)?;

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create an account: stash users add <name>");
    println!("  2. Start the web UI: stash serve");

    Ok(())
}

pub fn cmd_status(db_path: &Path) -> Result<()> {
    println!();
    println!("📊 Stash Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }

        match open_db(db_path) {
            Ok(db) => {
                let stats = db.stats()?;
                println!();
                println!("   Users: {}", stats.users);
                println!("   Transactions: {}", stats.transactions);
                println!("   Active goals: {}", stats.active_goals);
                println!("   Active rules: {}", stats.active_rules);
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    println!();
    Ok(())
}
