//! Auto-save rule command implementations
//!
//! `cmd_rules_run` is the scheduler entry point: there is no in-process
//! timer, so a cron job or systemd timer calling `stash rules run` drives
//! recurring auto-saves.

use anyhow::Result;
use chrono::Utc;
use stash_core::models::User;
use stash_core::{Database, ExecutionOutcome};
use tracing::debug;

use super::{resolve_user, truncate};

pub fn cmd_rules_list(db: &Database, user: &User) -> Result<()> {
    let rules = db.list_rules(user.id)?;

    if rules.is_empty() {
        println!("No auto-save rules yet for '{}'.", user.username);
        println!("Create one via the API: POST /api/savings/rules");
        return Ok(());
    }

    println!();
    println!("⚙️  Auto-Save Rules ({})", user.username);
    println!("   ─────────────────────────────────────────────────────────────");

    for rule in rules {
        let status_icon = if rule.active { "✅" } else { "⏸️" };
        let next = rule
            .next_execution
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "(due now)".to_string());

        println!(
            "   {} {:20} │ {:16} │ {:8} │ next {}",
            status_icon,
            truncate(&rule.name, 20),
            rule.rule_type.as_str(),
            rule.frequency.as_str(),
            next,
        );
    }

    Ok(())
}

pub fn cmd_rules_run(db: &Database, username: Option<&str>) -> Result<()> {
    let users = match username {
        Some(_) => vec![resolve_user(db, username)?],
        None => db.list_users()?,
    };

    let now = Utc::now();
    let mut posted = 0;
    let mut skipped = 0;
    let mut total_amount = 0.0;

    for user in &users {
        let due = db.list_due_rules(user.id, now)?;
        if due.is_empty() {
            continue;
        }

        debug!(user = %user.username, due = due.len(), "Executing due rules");
        let inputs = db.rule_inputs(user.id)?;
        for rule in &due {
            match db.execute_rule(user.id, rule, inputs)? {
                ExecutionOutcome::Posted(result) => {
                    println!(
                        "   💸 {} → {:.2} to '{}' ({})",
                        rule.name,
                        result.transaction.amount,
                        result.goal.name,
                        user.username
                    );
                    total_amount += result.transaction.amount;
                    posted += 1;
                }
                ExecutionOutcome::Skipped => skipped += 1,
            }
        }
    }

    if posted == 0 && skipped == 0 {
        println!("No rules due.");
    } else {
        println!();
        println!(
            "✅ {} rule(s) posted {:.2} total, {} skipped",
            posted, total_amount, skipped
        );
    }

    Ok(())
}
