//! Database tests

use super::*;
use crate::models::*;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn test_db() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        let user = db
            .create_user("alice", "alice@example.com", "correct horse")
            .unwrap();
        (db, user.id)
    }

    fn new_tx(
        category_id: Option<i64>,
        transaction_type: TransactionType,
        amount: f64,
        days_ago: i64,
    ) -> NewTransaction {
        NewTransaction {
            category_id,
            transaction_type,
            amount,
            date: Utc::now().date_naive() - Duration::days(days_ago),
            description: String::new(),
        }
    }

    fn new_goal(target: f64, days_out: i64) -> NewSavingsGoal {
        NewSavingsGoal {
            name: "Emergency fund".to_string(),
            description: None,
            target_amount: target,
            target_date: Utc::now().date_naive() + Duration::days(days_out),
            priority: GoalPriority::Medium,
            auto_save_percentage: 0.0,
            auto_save_amount: 0.0,
            auto_save_enabled: false,
        }
    }

    #[test]
    fn test_in_memory_db() {
        let db = Database::in_memory().unwrap();
        let users = db.list_users().unwrap();
        assert!(users.is_empty());
    }

    #[test]
    fn test_user_login_and_sessions() {
        let (db, _) = test_db();

        let (user, token) = db.login("alice", "correct horse", 30).unwrap();
        assert_eq!(user.username, "alice");

        let auth = db.authenticate(&token).unwrap();
        assert_eq!(auth.unwrap().username, "alice");

        // Wrong password is InvalidCredentials, not NotFound
        assert!(matches!(
            db.login("alice", "wrong", 30),
            Err(crate::Error::InvalidCredentials)
        ));

        db.logout(&token).unwrap();
        assert!(db.authenticate(&token).unwrap().is_none());
    }

    #[test]
    fn test_short_password_rejected() {
        let db = Database::in_memory().unwrap();
        assert!(matches!(
            db.create_user("bob", "bob@example.com", "short"),
            Err(crate::Error::Validation(_))
        ));
    }

    #[test]
    fn test_category_crud() {
        let (db, user_id) = test_db();

        let cat = db
            .create_category(user_id, "Groceries", None, Some("shopping-cart"))
            .unwrap();
        assert_eq!(cat.color, "#3B82F6");

        let updated = db
            .update_category(user_id, cat.id, Some("Food"), Some("#FF0000"), None)
            .unwrap();
        assert_eq!(updated.name, "Food");
        assert_eq!(updated.icon.as_deref(), Some("shopping-cart"));

        db.delete_category(user_id, cat.id).unwrap();
        assert!(db.get_category(user_id, cat.id).is_err());
    }

    #[test]
    fn test_empty_category_summary_is_zero() {
        let (db, user_id) = test_db();
        let cat = db.create_category(user_id, "Dining", None, None).unwrap();

        let summary = db
            .category_summary(user_id, cat.id, TransactionFilter::default())
            .unwrap();
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, 0.0);
    }

    #[test]
    fn test_category_summary_aggregates() {
        let (db, user_id) = test_db();
        let cat = db.create_category(user_id, "Dining", None, None).unwrap();

        db.create_transaction(user_id, &new_tx(Some(cat.id), TransactionType::Expense, 30.0, 2))
            .unwrap();
        db.create_transaction(user_id, &new_tx(Some(cat.id), TransactionType::Expense, 50.0, 1))
            .unwrap();

        let summary = db
            .category_summary(user_id, cat.id, TransactionFilter::default())
            .unwrap();
        assert_eq!(summary.total, 80.0);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average, 40.0);
    }

    #[test]
    fn test_cross_user_category_is_not_found() {
        let (db, alice) = test_db();
        let bob = db.create_user("bob", "bob@example.com", "hunter2hunter2").unwrap();

        let cat = db.create_category(alice, "Secret", None, None).unwrap();
        assert!(matches!(
            db.get_category(bob.id, cat.id),
            Err(crate::Error::NotFound(_))
        ));
    }

    #[test]
    fn test_transaction_filtering() {
        let (db, user_id) = test_db();

        db.create_transaction(user_id, &new_tx(None, TransactionType::Income, 1000.0, 5))
            .unwrap();
        db.create_transaction(user_id, &new_tx(None, TransactionType::Expense, 200.0, 3))
            .unwrap();

        let incomes = db
            .list_transactions(
                user_id,
                TransactionFilter {
                    transaction_type: Some(TransactionType::Income),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(incomes.len(), 1);
        assert_eq!(incomes[0].amount, 1000.0);
    }

    #[test]
    fn test_transaction_summary_percentages() {
        let (db, user_id) = test_db();
        let food = db.create_category(user_id, "Food", None, None).unwrap();
        let rent = db.create_category(user_id, "Rent", None, None).unwrap();

        db.create_transaction(user_id, &new_tx(None, TransactionType::Income, 2000.0, 5))
            .unwrap();
        db.create_transaction(user_id, &new_tx(Some(food.id), TransactionType::Expense, 250.0, 4))
            .unwrap();
        db.create_transaction(user_id, &new_tx(Some(rent.id), TransactionType::Expense, 750.0, 3))
            .unwrap();

        let today = Utc::now().date_naive();
        let summary = db
            .transaction_summary(user_id, today - Duration::days(30), today)
            .unwrap();

        assert_eq!(summary.income, 2000.0);
        assert_eq!(summary.expenses, 1000.0);
        assert_eq!(summary.net, 1000.0);
        assert_eq!(summary.by_category.len(), 2);
        // Sorted by amount, rent first
        assert_eq!(summary.by_category[0].category_name, "Rent");
        assert_eq!(summary.by_category[0].percentage, 75.0);
        assert_eq!(summary.by_category[1].percentage, 25.0);
    }

    #[test]
    fn test_summary_with_no_expenses_has_no_division_error() {
        let (db, user_id) = test_db();
        let today = Utc::now().date_naive();

        let summary = db
            .transaction_summary(user_id, today - Duration::days(30), today)
            .unwrap();
        assert_eq!(summary.expenses, 0.0);
        assert!(summary.by_category.is_empty());
    }

    #[test]
    fn test_budget_usage_and_excess() {
        let (db, user_id) = test_db();
        let cat = db.create_category(user_id, "Food", None, None).unwrap();

        let today = Utc::now().date_naive();
        let budget = db
            .create_budget(
                user_id,
                cat.id,
                500.0,
                today - Duration::days(10),
                today + Duration::days(10),
            )
            .unwrap();

        db.create_transaction(user_id, &new_tx(Some(cat.id), TransactionType::Expense, 300.0, 2))
            .unwrap();

        let usage = db.budget_usage(budget).unwrap();
        assert_eq!(usage.spent, 300.0);
        assert_eq!(usage.remaining, 200.0);
        assert_eq!(usage.percent_used, 60.0);

        assert_eq!(db.budget_excess(user_id, today).unwrap(), 200.0);
    }

    #[test]
    fn test_overspent_budget_contributes_no_excess() {
        let (db, user_id) = test_db();
        let cat = db.create_category(user_id, "Food", None, None).unwrap();

        let today = Utc::now().date_naive();
        let budget = db
            .create_budget(
                user_id,
                cat.id,
                100.0,
                today - Duration::days(10),
                today + Duration::days(10),
            )
            .unwrap();

        db.create_transaction(user_id, &new_tx(Some(cat.id), TransactionType::Expense, 250.0, 2))
            .unwrap();

        let usage = db.budget_usage(budget).unwrap();
        assert_eq!(usage.remaining, 0.0);
        assert_eq!(usage.percent_used, 100.0);
        assert_eq!(db.budget_excess(user_id, today).unwrap(), 0.0);
    }

    #[test]
    fn test_monthly_summary_report() {
        let (db, user_id) = test_db();

        db.create_transaction(user_id, &new_tx(None, TransactionType::Income, 1500.0, 5))
            .unwrap();

        let today = Utc::now().date_naive();
        let report = db
            .generate_report(
                user_id,
                "This month",
                ReportType::MonthlySummary,
                today - Duration::days(30),
                today,
            )
            .unwrap();

        assert_eq!(report.report_type, ReportType::MonthlySummary);
        let data: MonthlySummaryData = serde_json::from_value(report.data.clone()).unwrap();
        assert_eq!(data.income, 1500.0);
        // No baseline, so change is 0 rather than a division error
        assert_eq!(data.income_change_pct, 0.0);

        assert_eq!(db.list_reports(user_id).unwrap().len(), 1);
    }

    #[test]
    fn test_goal_crud_and_status_transitions() {
        let (db, user_id) = test_db();

        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.current_amount, 0.0);

        let paused = db.set_goal_status(user_id, goal.id, GoalStatus::Paused).unwrap();
        assert_eq!(paused.status, GoalStatus::Paused);

        // Paused -> completed is not a legal user edge
        assert!(db
            .set_goal_status(user_id, goal.id, GoalStatus::Completed)
            .is_err());

        let resumed = db.set_goal_status(user_id, goal.id, GoalStatus::Active).unwrap();
        assert_eq!(resumed.status, GoalStatus::Active);
    }

    #[test]
    fn test_deposit_and_withdrawal_move_balance() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();

        let posted = db
            .post_savings(user_id, goal.id, SavingsEffect::Deposit, 200.0, None, "payday")
            .unwrap();
        assert_eq!(posted.goal.current_amount, 200.0);

        let posted = db
            .post_savings(user_id, goal.id, SavingsEffect::Withdrawal, 50.0, None, "")
            .unwrap();
        assert_eq!(posted.goal.current_amount, 150.0);
    }

    #[test]
    fn test_withdrawal_floors_at_zero() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();

        db.post_savings(user_id, goal.id, SavingsEffect::Deposit, 50.0, None, "")
            .unwrap();
        let posted = db
            .post_savings(user_id, goal.id, SavingsEffect::Withdrawal, 80.0, None, "")
            .unwrap();
        assert_eq!(posted.goal.current_amount, 0.0);
    }

    #[test]
    fn test_completion_fires_exactly_once() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();

        let posted = db
            .post_savings(user_id, goal.id, SavingsEffect::Deposit, 1000.0, None, "")
            .unwrap();
        assert_eq!(posted.goal.status, GoalStatus::Completed);
        assert!(posted.goal.completed_at.is_some());

        // Deposit after completion must not fire a second achievement
        db.post_savings(user_id, goal.id, SavingsEffect::Deposit, 100.0, None, "")
            .unwrap();

        let achievements = db.list_achievements(user_id).unwrap();
        assert_eq!(achievements.len(), 1);
        assert_eq!(achievements[0].achievement_type, "goal_completed");
        assert_eq!(achievements[0].payload["goal_name"], "Emergency fund");
    }

    #[test]
    fn test_savings_ledger_is_scoped_to_owner() {
        let (db, alice) = test_db();
        let bob = db.create_user("bob", "bob@example.com", "hunter2hunter2").unwrap();

        let goal = db.create_goal(alice, &new_goal(500.0, 30)).unwrap();
        db.post_savings(alice, goal.id, SavingsEffect::Deposit, 100.0, None, "")
            .unwrap();

        assert!(matches!(
            db.post_savings(bob.id, goal.id, SavingsEffect::Deposit, 100.0, None, ""),
            Err(crate::Error::NotFound(_))
        ));
        assert!(db.list_savings_transactions(bob.id, Some(goal.id)).is_err());
    }

    #[test]
    fn test_due_rules_include_never_scheduled() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();

        let rule = db
            .create_rule(
                user_id,
                &NewAutoSaveRule {
                    goal_id: goal.id,
                    name: "Monthly sweep".to_string(),
                    rule_type: RuleType::FixedAmount,
                    frequency: RuleFrequency::Monthly,
                    percentage: 0.0,
                    fixed_amount: 100.0,
                    max_amount: None,
                    excess_threshold: 0.0,
                    excess_percentage: 0.0,
                    active: true,
                },
            )
            .unwrap();
        assert!(rule.next_execution.is_none());

        let due = db.list_due_rules(user_id, Utc::now()).unwrap();
        assert_eq!(due.len(), 1);

        // After execution the rule is scheduled out and no longer due
        db.execute_rule(user_id, &due[0], crate::ContributionInputs::default())
            .unwrap();
        assert!(db.list_due_rules(user_id, Utc::now()).unwrap().is_empty());
    }

    #[test]
    fn test_dashboard_counts_and_rate() {
        let (db, user_id) = test_db();

        let g1 = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();
        let g2 = db.create_goal(user_id, &new_goal(500.0, 60)).unwrap();
        db.set_goal_status(user_id, g2.id, GoalStatus::Paused).unwrap();

        db.create_transaction(user_id, &new_tx(None, TransactionType::Income, 1000.0, 0))
            .unwrap();
        db.post_savings(user_id, g1.id, SavingsEffect::Deposit, 250.0, None, "")
            .unwrap();

        let dash = db.savings_dashboard(user_id).unwrap();
        assert_eq!(dash.active_goals, 1);
        assert_eq!(dash.paused_goals, 1);
        assert_eq!(dash.total_saved, 250.0);
        assert_eq!(dash.monthly_savings_rate, 25.0);
    }

    #[test]
    fn test_dashboard_rate_with_no_income_is_zero() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();
        db.post_savings(user_id, goal.id, SavingsEffect::Deposit, 100.0, None, "")
            .unwrap();

        let dash = db.savings_dashboard(user_id).unwrap();
        assert_eq!(dash.monthly_savings_rate, 0.0);
    }

    #[test]
    fn test_recommendation_read_flow() {
        let (db, user_id) = test_db();

        // No active goals: a create_goal nudge is produced
        let created = db.refresh_recommendations(user_id).unwrap();
        assert_eq!(created, 1);

        let recs = db.list_recommendations(user_id).unwrap();
        assert_eq!(recs[0].recommendation_type, "create_goal");
        assert!(!recs[0].is_read);

        db.mark_recommendation_read(user_id, recs[0].id).unwrap();

        // A refresh replaces unread only; the read one survives
        db.create_goal(user_id, &new_goal(1000.0, 365)).unwrap();
        db.refresh_recommendations(user_id).unwrap();
        let recs = db.list_recommendations(user_id).unwrap();
        assert!(recs.iter().any(|r| r.is_read));
    }

    #[test]
    fn test_insight_archiving() {
        let (db, user_id) = test_db();
        let id = db
            .create_insight(user_id, "test", "Title", "Message")
            .unwrap();

        assert_eq!(db.list_insights(user_id, false).unwrap().len(), 1);
        db.archive_insight(user_id, id).unwrap();
        assert!(db.list_insights(user_id, false).unwrap().is_empty());
        assert_eq!(db.list_insights(user_id, true).unwrap().len(), 1);
    }

    #[test]
    fn test_reminder_lifecycle() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 90)).unwrap();

        let reminder = db
            .create_reminder(
                user_id,
                goal.id,
                "Top up the fund",
                Utc::now().date_naive() + Duration::days(7),
                ReminderFrequency::Weekly,
            )
            .unwrap();
        assert!(reminder.active);

        db.deactivate_reminder(user_id, reminder.id).unwrap();
        assert!(!db.get_reminder(user_id, reminder.id).unwrap().active);

        db.delete_reminder(user_id, reminder.id).unwrap();
        assert!(db.get_reminder(user_id, reminder.id).is_err());
    }

    #[test]
    fn test_simulation_projection() {
        let (db, user_id) = test_db();
        let goal = db.create_goal(user_id, &new_goal(1000.0, 365)).unwrap();
        db.post_savings(user_id, goal.id, SavingsEffect::Deposit, 100.0, None, "")
            .unwrap();

        let sim = db.simulate_goal(user_id, goal.id, 300.0).unwrap();
        // 900 remaining at 300/month
        assert_eq!(sim.months_to_target, 3);
        assert!(sim.projected_completion > Utc::now().date_naive());

        assert!(db.simulate_goal(user_id, goal.id, 0.0).is_err());
        assert_eq!(db.list_simulations(user_id).unwrap().len(), 1);
    }
}
