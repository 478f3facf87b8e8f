//! Integration tests for stash-core
//!
//! These tests exercise the full ledger → rule → savings goal workflow.

use chrono::{Duration, Utc};
use stash_core::{
    db::Database,
    models::{
        GoalPriority, GoalStatus, NewAutoSaveRule, NewSavingsGoal, NewTransaction, RiskLevel,
        RuleFrequency, RuleType, SavingsEffect, TransactionType,
    },
    ContributionInputs, ExecutionOutcome,
};

fn seeded_db() -> (Database, i64) {
    let db = Database::in_memory().expect("Failed to create in-memory database");
    let user = db
        .create_user("alice", "alice@example.com", "correct horse")
        .expect("Failed to create user");
    (db, user.id)
}

fn goal(target: f64, days_out: i64) -> NewSavingsGoal {
    NewSavingsGoal {
        name: "Vacation".to_string(),
        description: Some("Two weeks off-grid".to_string()),
        target_amount: target,
        target_date: Utc::now().date_naive() + Duration::days(days_out),
        priority: GoalPriority::High,
        auto_save_percentage: 0.0,
        auto_save_amount: 0.0,
        auto_save_enabled: false,
    }
}

#[test]
fn test_goal_completion_end_to_end() {
    let (db, user_id) = seeded_db();

    let created = db.create_goal(user_id, &goal(1000.0, 180)).unwrap();
    assert_eq!(created.current_amount, 0.0);

    let posted = db
        .post_savings(
            user_id,
            created.id,
            SavingsEffect::Deposit,
            1000.0,
            None,
            "bonus",
        )
        .unwrap();

    assert_eq!(posted.goal.status, GoalStatus::Completed);
    assert!(posted.goal.completed_at.is_some());

    let with_metrics = db.goal_with_metrics(posted.goal).unwrap();
    assert_eq!(with_metrics.metrics.progress_percentage, 100.0);
    assert_eq!(with_metrics.metrics.risk_level, RiskLevel::Completed);

    let achievements = db.list_achievements(user_id).unwrap();
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0].achievement_type, "goal_completed");
}

#[test]
fn test_ledger_drives_rule_execution() {
    let (db, user_id) = seeded_db();

    // A month of income and spending
    db.create_transaction(
        user_id,
        &NewTransaction {
            category_id: None,
            transaction_type: TransactionType::Income,
            amount: 3000.0,
            date: Utc::now().date_naive() - Duration::days(10),
            description: "salary".to_string(),
        },
    )
    .unwrap();
    db.create_transaction(
        user_id,
        &NewTransaction {
            category_id: None,
            transaction_type: TransactionType::Expense,
            amount: 1200.0,
            date: Utc::now().date_naive() - Duration::days(5),
            description: "rent".to_string(),
        },
    )
    .unwrap();

    let created = db.create_goal(user_id, &goal(10_000.0, 720)).unwrap();
    let rule = db
        .create_rule(
            user_id,
            &NewAutoSaveRule {
                goal_id: created.id,
                name: "Ten percent of income".to_string(),
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
        .unwrap();

    let inputs = db.rule_inputs(user_id).unwrap();
    assert_eq!(inputs.income_amount, 3000.0);
    assert_eq!(inputs.avg_monthly_expense, 400.0);

    let outcome = db.execute_rule(user_id, &rule, inputs).unwrap();
    match outcome {
        ExecutionOutcome::Posted(posted) => {
            assert_eq!(posted.transaction.amount, 300.0);
            assert_eq!(posted.transaction.effect, SavingsEffect::AutoSave);
            assert_eq!(posted.goal.current_amount, 300.0);
        }
        ExecutionOutcome::Skipped => panic!("expected a posted contribution"),
    }

    let refreshed = db.get_rule(user_id, rule.id).unwrap();
    assert!(refreshed.last_executed.is_some());
    assert!(refreshed.next_execution.is_some());
}

#[test]
fn test_inactive_rule_is_a_no_op() {
    let (db, user_id) = seeded_db();
    let created = db.create_goal(user_id, &goal(1000.0, 90)).unwrap();

    let rule = db
        .create_rule(
            user_id,
            &NewAutoSaveRule {
                goal_id: created.id,
                name: "Dormant".to_string(),
                rule_type: RuleType::FixedAmount,
                frequency: RuleFrequency::Weekly,
                percentage: 0.0,
                fixed_amount: 100.0,
                max_amount: None,
                excess_threshold: 0.0,
                excess_percentage: 0.0,
                active: false,
            },
        )
        .unwrap();

    let outcome = db
        .execute_rule(user_id, &rule, ContributionInputs::default())
        .unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Skipped));

    let refreshed = db.get_rule(user_id, rule.id).unwrap();
    assert!(refreshed.last_executed.is_none());
    assert!(refreshed.next_execution.is_none());
    assert_eq!(
        db.get_goal(user_id, created.id).unwrap().current_amount,
        0.0
    );
}

#[test]
fn test_analysis_produces_recommendations_and_insights() {
    let (db, user_id) = seeded_db();

    // A goal with 20 days left and 10% saved lands in critical territory
    let created = db.create_goal(user_id, &goal(1000.0, 20)).unwrap();
    db.post_savings(user_id, created.id, SavingsEffect::Deposit, 100.0, None, "")
        .unwrap();

    let recs = db.refresh_recommendations(user_id).unwrap();
    assert!(recs >= 1);

    let insights = db.refresh_insights(user_id).unwrap();
    assert!(insights >= 1);
    assert!(db
        .list_insights(user_id, false)
        .unwrap()
        .iter()
        .any(|i| i.insight_type == "goal_at_risk"));
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stash.db");
    let path_str = path.to_str().unwrap();

    let goal_id;
    {
        let db = Database::new(path_str).unwrap();
        let user = db.create_user("alice", "", "correct horse").unwrap();
        let created = db.create_goal(user.id, &goal(1000.0, 180)).unwrap();
        db.post_savings(
            user.id,
            created.id,
            SavingsEffect::Deposit,
            250.0,
            None,
            "seed",
        )
        .unwrap();
        goal_id = created.id;
    }

    let db = Database::new(path_str).unwrap();
    let user = db.list_users().unwrap().remove(0);
    let reloaded = db.get_goal(user.id, goal_id).unwrap();
    assert_eq!(reloaded.current_amount, 250.0);
    assert_eq!(db.list_savings_transactions(user.id, None).unwrap().len(), 1);
}
