//! Auto-save contribution formulas
//!
//! The rule-type set is small and closed, so dispatch is a plain match
//! rather than anything dynamic.

use crate::models::{AutoSaveRule, RuleType};

/// Ledger-derived figures supplied by the caller
///
/// The rule engine never queries the ledger itself; whoever invokes an
/// execution derives these and passes them in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContributionInputs {
    /// Income over the rule's reference window
    pub income_amount: f64,
    /// Unspent budget across currently-covering budgets
    pub budget_excess: f64,
    /// Trailing-90-day average monthly expense, for smart_savings
    pub avg_monthly_expense: f64,
}

/// Compute a rule's contribution amount
///
/// Always non-negative; clamped to `max_amount` when set.
pub fn calculate_contribution(rule: &AutoSaveRule, inputs: ContributionInputs) -> f64 {
    let amount = match rule.rule_type {
        RuleType::PercentageIncome => inputs.income_amount * rule.percentage / 100.0,
        RuleType::FixedAmount => rule.fixed_amount,
        RuleType::ExcessBudget => {
            if inputs.budget_excess > rule.excess_threshold {
                inputs.budget_excess * rule.excess_percentage / 100.0
            } else {
                0.0
            }
        }
        RuleType::RoundUp => {
            // Distance up to the next multiple of 10; 0 when already on one
            let remainder = inputs.income_amount.rem_euclid(10.0);
            if remainder == 0.0 {
                0.0
            } else {
                10.0 - remainder
            }
        }
        RuleType::SmartSavings => {
            // Save 20% of income, or 30% when spending runs hot
            let rate = if inputs.avg_monthly_expense > inputs.income_amount * 0.7 {
                0.30
            } else {
                0.20
            };
            inputs.income_amount * rate
        }
    };

    let amount = match rule.max_amount {
        Some(max) if amount > max => max,
        _ => amount,
    };

    amount.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::RuleFrequency;

    fn rule(rule_type: RuleType) -> AutoSaveRule {
        AutoSaveRule {
            id: 1,
            user_id: 1,
            goal_id: 1,
            name: "Test rule".to_string(),
            rule_type,
            frequency: RuleFrequency::Monthly,
            percentage: 0.0,
            fixed_amount: 0.0,
            max_amount: None,
            excess_threshold: 0.0,
            excess_percentage: 0.0,
            active: true,
            last_executed: None,
            next_execution: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_income() {
        let mut r = rule(RuleType::PercentageIncome);
        r.percentage = 10.0;
        let amount = calculate_contribution(
            &r,
            ContributionInputs {
                income_amount: 2500.0,
                ..Default::default()
            },
        );
        assert_eq!(amount, 250.0);
    }

    #[test]
    fn fixed_amount_clamps_to_max() {
        let mut r = rule(RuleType::FixedAmount);
        r.fixed_amount = 200.0;
        r.max_amount = Some(150.0);
        assert_eq!(calculate_contribution(&r, ContributionInputs::default()), 150.0);
    }

    #[test]
    fn excess_budget_respects_threshold() {
        let mut r = rule(RuleType::ExcessBudget);
        r.excess_threshold = 50.0;
        r.excess_percentage = 50.0;

        let above = ContributionInputs {
            budget_excess: 100.0,
            ..Default::default()
        };
        assert_eq!(calculate_contribution(&r, above), 50.0);

        let below = ContributionInputs {
            budget_excess: 40.0,
            ..Default::default()
        };
        assert_eq!(calculate_contribution(&r, below), 0.0);
    }

    #[test]
    fn round_up_to_next_ten() {
        let r = rule(RuleType::RoundUp);
        let amount = calculate_contribution(
            &r,
            ContributionInputs {
                income_amount: 23.0,
                ..Default::default()
            },
        );
        assert_eq!(amount, 7.0);
    }

    #[test]
    fn round_up_on_exact_multiple_is_zero() {
        let r = rule(RuleType::RoundUp);
        let amount = calculate_contribution(
            &r,
            ContributionInputs {
                income_amount: 30.0,
                ..Default::default()
            },
        );
        assert_eq!(amount, 0.0);
    }

    #[test]
    fn smart_savings_escalates_when_spending_runs_hot() {
        let r = rule(RuleType::SmartSavings);

        let calm = ContributionInputs {
            income_amount: 1000.0,
            avg_monthly_expense: 500.0,
            ..Default::default()
        };
        assert_eq!(calculate_contribution(&r, calm), 200.0);

        let hot = ContributionInputs {
            income_amount: 1000.0,
            avg_monthly_expense: 800.0,
            ..Default::default()
        };
        assert_eq!(calculate_contribution(&r, hot), 300.0);
    }

    #[test]
    fn negative_result_floors_at_zero() {
        let mut r = rule(RuleType::FixedAmount);
        r.fixed_amount = -50.0;
        assert_eq!(calculate_contribution(&r, ContributionInputs::default()), 0.0);
    }
}
