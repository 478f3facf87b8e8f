//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::{Duration, Utc};
use stash_core::models::{
    GoalPriority, NewAutoSaveRule, NewSavingsGoal, NewTransaction, RuleFrequency, RuleType,
    TransactionType,
};
use stash_core::Database;

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn create_test_user(db: &Database, username: &str) -> i64 {
    db.create_user(username, "", "correct horse").unwrap().id
}

fn create_test_goal(db: &Database, user_id: i64, target: f64) -> i64 {
    db.create_goal(
        user_id,
        &NewSavingsGoal {
            name: "Emergency Fund".to_string(),
            description: None,
            target_amount: target,
            target_date: Utc::now().date_naive() + Duration::days(180),
            priority: GoalPriority::Medium,
            auto_save_percentage: 0.0,
            auto_save_amount: 0.0,
            auto_save_enabled: false,
        },
    )
    .unwrap()
    .id
}

// ========== Shared Utilities ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 20), "short");
    assert_eq!(truncate("a very long goal name", 10), "a very ...");
}

#[test]
fn test_resolve_user_defaults_to_only_account() {
    let db = setup_test_db();
    create_test_user(&db, "alice");

    let user = commands::resolve_user(&db, None).unwrap();
    assert_eq!(user.username, "alice");
}

#[test]
fn test_resolve_user_requires_flag_when_ambiguous() {
    let db = setup_test_db();
    create_test_user(&db, "alice");
    create_test_user(&db, "bob");

    assert!(commands::resolve_user(&db, None).is_err());
    let user = commands::resolve_user(&db, Some("bob")).unwrap();
    assert_eq!(user.username, "bob");
}

#[test]
fn test_resolve_user_unknown_name() {
    let db = setup_test_db();
    create_test_user(&db, "alice");

    assert!(commands::resolve_user(&db, Some("mallory")).is_err());
}

// ========== Init / Status ==========

#[test]
fn test_cmd_init_creates_database_and_parents() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("stash.db");

    commands::cmd_init(&db_path).unwrap();
    assert!(db_path.exists());

    // Idempotent
    commands::cmd_init(&db_path).unwrap();
}

#[test]
fn test_cmd_status_on_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("absent.db");

    // Should report the missing file rather than fail
    commands::cmd_status(&db_path).unwrap();
}

// ========== Users ==========

#[test]
fn test_cmd_users_add_and_list() {
    let db = setup_test_db();

    commands::cmd_users_add(&db, "alice", Some("alice@example.com"), Some("hunter2hunter2"))
        .unwrap();

    let users = db.list_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email, "alice@example.com");

    commands::cmd_users_list(&db).unwrap();
}

#[test]
fn test_cmd_users_add_generates_password() {
    let db = setup_test_db();

    // No password given, a random one is generated and the login flow works
    commands::cmd_users_add(&db, "bob", None, None).unwrap();
    assert_eq!(db.list_users().unwrap().len(), 1);
}

#[test]
fn test_cmd_users_add_rejects_duplicate() {
    let db = setup_test_db();
    create_test_user(&db, "alice");

    assert!(commands::cmd_users_add(&db, "alice", None, Some("hunter2hunter2")).is_err());
}

// ========== Goals / Dashboard ==========

#[test]
fn test_cmd_goals_list_table_and_json() {
    let db = setup_test_db();
    let user_id = create_test_user(&db, "alice");
    create_test_goal(&db, user_id, 1000.0);
    let user = commands::resolve_user(&db, None).unwrap();

    commands::cmd_goals_list(&db, &user, false).unwrap();
    commands::cmd_goals_list(&db, &user, true).unwrap();
}

#[test]
fn test_cmd_dashboard() {
    let db = setup_test_db();
    let user_id = create_test_user(&db, "alice");
    create_test_goal(&db, user_id, 1000.0);
    let user = commands::resolve_user(&db, None).unwrap();

    commands::cmd_dashboard(&db, &user).unwrap();
}

// ========== Rules ==========

fn create_percentage_rule(db: &Database, user_id: i64, goal_id: i64) -> i64 {
    db.create_rule(
        user_id,
        &NewAutoSaveRule {
            goal_id,
            name: "Payday sweep".to_string(),
            rule_type: RuleType::PercentageIncome,
            frequency: RuleFrequency::Monthly,
            percentage: 10.0,
            fixed_amount: 0.0,
            max_amount: None,
            excess_threshold: 0.0,
            excess_percentage: 0.0,
            active: true,
        },
    )
    .unwrap()
    .id
}

#[test]
fn test_cmd_rules_run_posts_contributions() {
    let db = setup_test_db();
    let user_id = create_test_user(&db, "alice");
    let goal_id = create_test_goal(&db, user_id, 10_000.0);
    create_percentage_rule(&db, user_id, goal_id);

    db.create_transaction(
        user_id,
        &NewTransaction {
            category_id: None,
            transaction_type: TransactionType::Income,
            amount: 3000.0,
            date: Utc::now().date_naive(),
            description: "Salary".to_string(),
        },
    )
    .unwrap();

    commands::cmd_rules_run(&db, None).unwrap();

    let goal = db.get_goal(user_id, goal_id).unwrap();
    assert!((goal.current_amount - 300.0).abs() < 0.01);

    // Rescheduled, so a second sweep is a no-op
    commands::cmd_rules_run(&db, None).unwrap();
    let goal = db.get_goal(user_id, goal_id).unwrap();
    assert!((goal.current_amount - 300.0).abs() < 0.01);
}

#[test]
fn test_cmd_rules_run_skips_scheduled_out_rules() {
    let db = setup_test_db();
    let user_id = create_test_user(&db, "alice");
    let goal_id = create_test_goal(&db, user_id, 10_000.0);
    let rule_id = create_percentage_rule(&db, user_id, goal_id);

    let conn = db.conn().unwrap();
    conn.execute(
        "UPDATE auto_save_rules SET next_execution = datetime('now', '+7 days') WHERE id = ?1",
        rusqlite::params![rule_id],
    )
    .unwrap();

    commands::cmd_rules_run(&db, None).unwrap();

    let goal = db.get_goal(user_id, goal_id).unwrap();
    assert_eq!(goal.current_amount, 0.0);
}

#[test]
fn test_cmd_rules_run_unknown_user() {
    let db = setup_test_db();
    create_test_user(&db, "alice");

    assert!(commands::cmd_rules_run(&db, Some("mallory")).is_err());
}

#[test]
fn test_cmd_rules_list() {
    let db = setup_test_db();
    let user_id = create_test_user(&db, "alice");
    let goal_id = create_test_goal(&db, user_id, 10_000.0);
    create_percentage_rule(&db, user_id, goal_id);
    let user = commands::resolve_user(&db, None).unwrap();

    commands::cmd_rules_list(&db, &user).unwrap();
}
