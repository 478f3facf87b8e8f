//! Domain models for Stash

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
///
/// The password hash never leaves the db layer; this struct is what the API
/// returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A user-defined transaction category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Hex color for UI display (e.g., "#3B82F6")
    pub color: String,
    /// Icon identifier (e.g., "shopping-cart")
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direction of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A ledger transaction (income or expense)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub category_id: Option<i64>,
    pub transaction_type: TransactionType,
    /// Always positive; direction comes from transaction_type
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A new ledger transaction (before DB insertion)
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub category_id: Option<i64>,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
}

/// Optional filters for listing/aggregating ledger transactions
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub category_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Point-in-time aggregates over a category's transactions
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category_id: i64,
    /// Sum of matching amounts, 0 if no matches
    pub total: f64,
    pub count: i64,
    /// Average of matching amounts, 0 if no matches
    pub average: f64,
}

/// Per-category slice of a period summary
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: Option<i64>,
    pub category_name: String,
    pub amount: f64,
    /// Share of the period's expense total; 0 when the total is 0
    pub percentage: f64,
    pub transaction_count: i64,
}

/// Ledger summary for a date range
#[derive(Debug, Clone, Serialize)]
pub struct TransactionSummary {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub by_category: Vec<CategoryBreakdown>,
}

/// A spending budget for a category over a date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Budget with usage derived from the ledger at read time
#[derive(Debug, Clone, Serialize)]
pub struct BudgetWithUsage {
    #[serde(flatten)]
    pub budget: Budget,
    /// Expense total for the category within the budget period
    pub spent: f64,
    /// max(amount - spent, 0)
    pub remaining: f64,
    /// clamp(spent / amount * 100, 100); 0 when amount <= 0
    pub percent_used: f64,
}

/// Report flavors the generator knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    MonthlySummary,
    SpendingByCategory,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthlySummary => "monthly_summary",
            Self::SpendingByCategory => "spending_by_category",
        }
    }
}

impl std::str::FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly_summary" => Ok(Self::MonthlySummary),
            "spending_by_category" => Ok(Self::SpendingByCategory),
            _ => Err(format!("Unknown report type: {}", s)),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored report with its generated payload
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    /// Generated report data (shape depends on report_type)
    pub data: serde_json::Value,
}

/// Income/expense totals with a comparison against the preceding period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySummaryData {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub previous_income: f64,
    pub previous_expenses: f64,
    /// Percent change vs. the preceding period; 0 when the baseline is 0
    pub income_change_pct: f64,
    pub expense_change_pct: f64,
}

// ========== Savings Goal Models ==========

/// Goal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl GoalPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::str::FromStr for GoalPriority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown goal priority: {}", s)),
        }
    }
}

impl std::fmt::Display for GoalPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Goal lifecycle status
///
/// Only active -> completed happens automatically (when the balance reaches
/// the target); every other edge is an explicit user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for GoalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown goal status: {}", s)),
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pacing risk for an active goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Completed,
    Critical,
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings goal
///
/// `current_amount` is a running total mutated only by posted
/// SavingsTransactions, never edited directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub current_amount: f64,
    pub target_date: NaiveDate,
    pub priority: GoalPriority,
    pub status: GoalStatus,
    /// Percentage of income to auto-save (0-100)
    pub auto_save_percentage: f64,
    /// Fixed amount to auto-save per execution
    pub auto_save_amount: f64,
    pub auto_save_enabled: bool,
    /// Set exactly once, when current_amount first reaches target_amount
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A new savings goal (before DB insertion)
#[derive(Debug, Clone, Deserialize)]
pub struct NewSavingsGoal {
    pub name: String,
    pub description: Option<String>,
    pub target_amount: f64,
    pub target_date: NaiveDate,
    #[serde(default)]
    pub priority: GoalPriority,
    #[serde(default)]
    pub auto_save_percentage: f64,
    #[serde(default)]
    pub auto_save_amount: f64,
    #[serde(default)]
    pub auto_save_enabled: bool,
}

/// Signed effect of a savings transaction on the goal balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavingsEffect {
    /// Manual contribution (credit)
    Deposit,
    /// Debit; the goal balance floors at 0
    Withdrawal,
    /// Balance correction, treated as a credit
    Adjustment,
    /// Posted by an auto-save rule execution (credit)
    AutoSave,
    /// Budget surplus swept into the goal (credit)
    ExcessSavings,
}

impl SavingsEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Adjustment => "adjustment",
            Self::AutoSave => "auto_save",
            Self::ExcessSavings => "excess_savings",
        }
    }

    /// Whether this effect adds to the goal balance
    pub fn is_credit(&self) -> bool {
        !matches!(self, Self::Withdrawal)
    }
}

impl std::str::FromStr for SavingsEffect {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "adjustment" => Ok(Self::Adjustment),
            "auto_save" => Ok(Self::AutoSave),
            "excess_savings" => Ok(Self::ExcessSavings),
            _ => Err(format!("Unknown savings effect: {}", s)),
        }
    }
}

impl std::fmt::Display for SavingsEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An entry in a goal's append-only savings ledger
///
/// Immutable once created; there is no update or delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsTransaction {
    pub id: i64,
    pub goal_id: i64,
    pub effect: SavingsEffect,
    /// Always positive; direction comes from the effect
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ========== Auto-Save Rule Models ==========

/// How an auto-save rule computes its contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    /// income * percentage / 100
    PercentageIncome,
    /// A constant amount
    FixedAmount,
    /// A cut of the budget surplus above a threshold
    ExcessBudget,
    /// Distance from income up to the next multiple of 10
    RoundUp,
    /// 20% of income, escalating to 30% when spending runs hot
    SmartSavings,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PercentageIncome => "percentage_income",
            Self::FixedAmount => "fixed_amount",
            Self::ExcessBudget => "excess_budget",
            Self::RoundUp => "round_up",
            Self::SmartSavings => "smart_savings",
        }
    }
}

impl std::str::FromStr for RuleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "percentage_income" => Ok(Self::PercentageIncome),
            "fixed_amount" => Ok(Self::FixedAmount),
            "excess_budget" => Ok(Self::ExcessBudget),
            "round_up" => Ok(Self::RoundUp),
            "smart_savings" => Ok(Self::SmartSavings),
            _ => Err(format!("Unknown rule type: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How often an auto-save rule is meant to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleFrequency {
    Daily,
    Weekly,
    Biweekly,
    #[default]
    Monthly,
}

impl RuleFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
        }
    }

    /// Fixed calendar-naive offset to the next execution
    pub fn interval(&self) -> chrono::Duration {
        match self {
            Self::Daily => chrono::Duration::days(1),
            Self::Weekly => chrono::Duration::weeks(1),
            Self::Biweekly => chrono::Duration::weeks(2),
            Self::Monthly => chrono::Duration::days(30),
        }
    }
}

impl std::str::FromStr for RuleFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Unknown rule frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for RuleFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A policy that computes and posts automatic contributions to a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSaveRule {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: i64,
    pub name: String,
    pub rule_type: RuleType,
    pub frequency: RuleFrequency,
    /// Percentage parameter (percentage_income)
    pub percentage: f64,
    /// Fixed amount parameter (fixed_amount)
    pub fixed_amount: f64,
    /// Optional cap applied after calculation
    pub max_amount: Option<f64>,
    /// Surplus must exceed this before excess_budget contributes
    pub excess_threshold: f64,
    /// Cut of the surplus taken by excess_budget
    pub excess_percentage: f64,
    pub active: bool,
    /// Updated only by successful execution
    pub last_executed: Option<DateTime<Utc>>,
    pub next_execution: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A new auto-save rule (before DB insertion)
#[derive(Debug, Clone, Deserialize)]
pub struct NewAutoSaveRule {
    pub goal_id: i64,
    pub name: String,
    pub rule_type: RuleType,
    #[serde(default)]
    pub frequency: RuleFrequency,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub fixed_amount: f64,
    pub max_amount: Option<f64>,
    #[serde(default)]
    pub excess_threshold: f64,
    #[serde(default)]
    pub excess_percentage: f64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

// ========== Engagement Models ==========

/// A savings recommendation (inert record produced by goal analysis)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsRecommendation {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: Option<i64>,
    pub recommendation_type: String,
    pub title: String,
    pub message: String,
    pub suggested_amount: Option<f64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// A savings insight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsInsight {
    pub id: i64,
    pub user_id: i64,
    pub insight_type: String,
    pub title: String,
    pub message: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

/// An achievement earned by the user
///
/// Created exactly once per qualifying event; never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsAchievement {
    pub id: i64,
    pub user_id: i64,
    pub achievement_type: String,
    pub points: i64,
    /// Event context (e.g., goal name and target for goal_completed)
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Reminder cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReminderFrequency {
    #[default]
    Once,
    Weekly,
    Monthly,
}

impl ReminderFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for ReminderFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Unknown reminder frequency: {}", s)),
        }
    }
}

/// A contribution reminder attached to a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsReminder {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: i64,
    pub message: String,
    pub remind_on: NaiveDate,
    pub frequency: ReminderFrequency,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A what-if projection for a goal at a given monthly contribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsSimulation {
    pub id: i64,
    pub user_id: i64,
    pub goal_id: i64,
    pub monthly_amount: f64,
    /// Whole months needed to close the remaining gap; 0 if already funded
    pub months_to_target: i64,
    pub projected_completion: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Savings dashboard aggregate
#[derive(Debug, Clone, Serialize)]
pub struct SavingsDashboard {
    /// Sum of current_amount across all goals
    pub total_saved: f64,
    pub active_goals: i64,
    pub paused_goals: i64,
    pub completed_goals: i64,
    pub cancelled_goals: i64,
    /// (this-month savings credits / this-month ledger income) * 100; 0 if no income
    pub monthly_savings_rate: f64,
    pub unread_recommendations: i64,
    pub active_insights: i64,
}
