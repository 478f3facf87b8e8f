//! Savings goal and dashboard command implementations

use anyhow::Result;
use stash_core::models::{RiskLevel, User};
use stash_core::Database;

use super::truncate;

pub fn cmd_goals_list(db: &Database, user: &User, json: bool) -> Result<()> {
    let goals = db.list_goals(user.id, None)?;

    let with_metrics: Vec<_> = goals
        .into_iter()
        .map(|g| db.goal_with_metrics(g))
        .collect::<stash_core::Result<_>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&with_metrics)?);
        return Ok(());
    }

    if with_metrics.is_empty() {
        println!("No savings goals yet for '{}'.", user.username);
        println!("Create one via the API: POST /api/savings/goals");
        return Ok(());
    }

    println!();
    println!("🎯 Savings Goals ({})", user.username);
    println!("   ─────────────────────────────────────────────────────────────");

    for g in with_metrics {
        let risk_icon = match g.metrics.risk_level {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
            RiskLevel::Completed => "🏁",
        };

        println!(
            "   {} {:20} │ {:>10.2} / {:<10.2} │ {:>5.1}% │ {:>4}d left │ {}",
            risk_icon,
            truncate(&g.goal.name, 20),
            g.goal.current_amount,
            g.goal.target_amount,
            g.metrics.progress_percentage,
            g.metrics.days_remaining,
            g.goal.status.as_str(),
        );
    }

    Ok(())
}

pub fn cmd_dashboard(db: &Database, user: &User) -> Result<()> {
    let dashboard = db.savings_dashboard(user.id)?;

    println!();
    println!("╭─────────────────────────────────────────╮");
    println!("│           💰 Stash Dashboard            │");
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  User:              {}", user.username);
    println!("  Total saved:       {:.2}", dashboard.total_saved);
    println!("  Active goals:      {}", dashboard.active_goals);
    println!("  Paused goals:      {}", dashboard.paused_goals);
    println!("  Completed goals:   {}", dashboard.completed_goals);
    println!("  Cancelled goals:   {}", dashboard.cancelled_goals);
    println!(
        "  Savings rate:      {:.1}% of this month's income",
        dashboard.monthly_savings_rate
    );
    println!();
    println!(
        "  Unread recommendations: {}",
        dashboard.unread_recommendations
    );
    println!("  Active insights:        {}", dashboard.active_insights);
    println!();

    Ok(())
}
