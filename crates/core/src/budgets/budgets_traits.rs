use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::budgets::{
    Budget, BudgetAttention, BudgetCategory, BudgetEvaluation, BudgetStatus, BudgetSummary,
    NewBudget, NewBudgetCategory, SpentChange, SpentIncrement,
};
use crate::errors::Result;

/// Trait for budget repository operations
#[async_trait]
pub trait BudgetRepositoryTrait: Send + Sync {
    fn get_budget(&self, budget_id: &str) -> Result<Budget>;

    fn list_budgets_by_owner(&self, owner_id: &str) -> Result<Vec<Budget>>;

    fn list_budgets_by_status(&self, status: BudgetStatus) -> Result<Vec<Budget>>;

    fn get_budget_categories(&self, budget_id: &str) -> Result<Vec<BudgetCategory>>;

    /// Categories of the budget whose spent amount is above the limit.
    fn find_exceeded_categories(&self, budget_id: &str) -> Result<Vec<BudgetCategory>>;

    /// Budget categories for `category_id` on the owner's ACTIVE budgets whose
    /// window contains `date`.
    fn find_active_budget_categories(
        &self,
        owner_id: &str,
        category_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BudgetCategory>>;

    /// Inserts the budget and all of its category limits in one unit of work.
    async fn create_budget(&self, new_budget: NewBudget, status: BudgetStatus) -> Result<Budget>;

    /// Returns `Error::InvalidState` when the budget already has a limit for the category.
    async fn add_budget_category(
        &self,
        budget_id: &str,
        new_category: NewBudgetCategory,
    ) -> Result<BudgetCategory>;

    async fn update_budget_status(&self, budget_id: &str, status: BudgetStatus) -> Result<Budget>;

    /// Replaces a category's spent amount (floored at zero).
    async fn overwrite_spent_amount(
        &self,
        budget_id: &str,
        category_id: &str,
        total: Decimal,
    ) -> Result<SpentChange>;

    /// Applies every increment (each floored at zero) and records `event_key`
    /// in the same unit of work. Returns `None`, changing nothing, when the
    /// key was already recorded.
    async fn increment_spent_amounts(
        &self,
        event_key: Option<String>,
        increments: Vec<SpentIncrement>,
    ) -> Result<Option<Vec<SpentChange>>>;
}

/// Trait for budget service operations
#[async_trait]
pub trait BudgetServiceTrait: Send + Sync {
    fn get_budget(&self, budget_id: &str) -> Result<Budget>;

    fn list_budgets(&self, owner_id: &str) -> Result<Vec<Budget>>;

    fn get_budget_summary(&self, budget_id: &str) -> Result<BudgetSummary>;

    async fn create_budget(&self, new_budget: NewBudget) -> Result<Budget>;

    async fn add_category_limit(
        &self,
        budget_id: &str,
        category_id: &str,
        limit_amount: Decimal,
    ) -> Result<BudgetCategory>;

    async fn evaluate_budget(&self, budget_id: &str) -> Result<BudgetEvaluation>;

    async fn evaluate_user_budgets(&self, owner_id: &str) -> Result<Vec<BudgetEvaluation>>;

    async fn evaluate_all_active_budgets(&self) -> Result<Vec<BudgetEvaluation>>;

    async fn archive_budget(&self, budget_id: &str) -> Result<Budget>;

    fn needs_attention(&self, budget_id: &str) -> Result<Option<BudgetAttention>>;

    fn budgets_needing_attention(&self, owner_id: &str) -> Result<Vec<BudgetAttention>>;
}
