//! User account command implementations

use anyhow::{Context, Result};
use stash_core::Database;

pub fn cmd_users_add(
    db: &Database,
    username: &str,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    let (password, generated) = match password {
        Some(p) => (p.to_string(), false),
        None => (Database::random_password(), true),
    };

    let user = db
        .create_user(username, email.unwrap_or_default(), &password)
        .context("Failed to create user")?;

    println!("✅ Created user '{}' (ID: {})", user.username, user.id);
    if email.is_none() {
        println!("   No email set; add one later if you want reminders");
    }
    if generated {
        println!("   Generated password: {}", password);
        println!("   (Store it somewhere safe; it is not shown again)");
    }

    Ok(())
}

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    if users.is_empty() {
        println!("No accounts yet. Create one with:");
        println!("  stash users add <name>");
        return Ok(());
    }

    println!();
    println!("👤 Users");
    println!("   ─────────────────────────────────────────────────────────────");

    for user in users {
        let email = if user.email.is_empty() {
            "-".to_string()
        } else {
            user.email
        };
        println!(
            "   {:>4} │ {:20} │ {:30} │ since {}",
            user.id,
            user.username,
            email,
            user.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}
