//! In-memory repositories for engine tests.
//!
//! One store implements every repository trait behind a single mutex, so each
//! write is atomic the same way a writer-actor job is in the SQLite backend.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::alerts::{Alert, AlertRepositoryTrait, AlertSourceType, NewAlert};
use crate::budgets::{
    Budget, BudgetCategory, BudgetRepositoryTrait, BudgetStatus, NewBudget, NewBudgetCategory,
    SpentChange, SpentIncrement,
};
use crate::categories::{Category, CategoryRepositoryTrait, CategoryType, NewCategory};
use crate::errors::{DatabaseError, Error, Result};
use crate::goals::{Goal, GoalProgress, GoalProgressReset, GoalRepositoryTrait, NewGoal};
use crate::rules::{NewRule, Rule, RuleRepositoryTrait};
use crate::transactions::{
    NewTransaction, Transaction, TransactionRepositoryTrait, TransactionUpdate,
};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Default)]
struct State {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    budgets: Vec<Budget>,
    budget_categories: Vec<BudgetCategory>,
    rules: Vec<Rule>,
    goals: Vec<Goal>,
    alerts: Vec<Alert>,
    spend_events: HashSet<String>,
    fail_alert_inserts: bool,
    failing_ids: HashSet<String>,
}

impl State {
    fn check_failing(&self, id: &str) -> Result<()> {
        if self.failing_ids.contains(id) {
            return Err(DatabaseError::QueryFailed(format!("injected failure for '{}'", id)).into());
        }
        Ok(())
    }

    fn budget_category_mut(
        &mut self,
        budget_id: &str,
        category_id: &str,
    ) -> Result<&mut BudgetCategory> {
        self.budget_categories
            .iter_mut()
            .find(|c| c.budget_id == budget_id && c.category_id == category_id)
            .ok_or_else(|| Error::not_found("budget category", category_id))
    }
}

#[derive(Default)]
pub(crate) struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn fail_alert_inserts(&self, fail: bool) {
        self.state().fail_alert_inserts = fail;
    }

    /// Makes lookups keyed by `id` (budget, rule owner, goal owner, category) fail.
    pub fn fail_lookups_for(&self, id: &str) {
        self.state().failing_ids.insert(id.to_string());
    }

    pub fn seed_category(&self, id: &str, owner_id: &str, name: &str) -> Category {
        let category = Category {
            id: id.to_string(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            category_type: CategoryType::Expense,
        };
        self.state().categories.push(category.clone());
        category
    }

    /// Inserts a rule without the service-level category checks.
    pub fn seed_rule(&self, rule: Rule) {
        self.state().rules.push(rule);
    }

    /// Forces a stored spent amount, simulating drift from the ledger.
    pub fn force_spent(&self, budget_id: &str, category_id: &str, spent: Decimal) {
        let mut state = self.state();
        if let Ok(row) = state.budget_category_mut(budget_id, category_id) {
            row.spent_amount = spent;
        }
    }

    pub fn spent(&self, budget_id: &str, category_id: &str) -> Decimal {
        self.state()
            .budget_categories
            .iter()
            .find(|c| c.budget_id == budget_id && c.category_id == category_id)
            .map(|c| c.spent_amount)
            .unwrap()
    }

    pub fn recorded_events(&self) -> usize {
        self.state().spend_events.len()
    }

    pub fn all_alerts(&self) -> Vec<Alert> {
        self.state().alerts.clone()
    }
}

#[async_trait]
impl CategoryRepositoryTrait for InMemoryStore {
    fn get_category(&self, category_id: &str) -> Result<Category> {
        let state = self.state();
        state.check_failing(category_id)?;
        state
            .categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| Error::not_found("category", category_id))
    }

    fn list_categories(&self, owner_id: &str) -> Result<Vec<Category>> {
        Ok(self
            .state()
            .categories
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category> {
        let category = Category {
            id: new_category.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: new_category.owner_id,
            name: new_category.name,
            category_type: new_category.category_type,
        };
        self.state().categories.push(category.clone());
        Ok(category)
    }
}

#[async_trait]
impl TransactionRepositoryTrait for InMemoryStore {
    fn get_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        self.state()
            .transactions
            .iter()
            .find(|t| t.id == transaction_id)
            .cloned()
            .ok_or_else(|| Error::not_found("transaction", transaction_id))
    }

    fn find_by_owner_id(&self, owner_id: &str) -> Result<Vec<Transaction>> {
        Ok(self
            .state()
            .transactions
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn sum_by_owner_category_date_range(
        &self,
        owner_id: &str,
        category_id: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        Ok(self
            .state()
            .transactions
            .iter()
            .filter(|t| t.owner_id == owner_id && t.date >= start && t.date <= end)
            .filter(|t| category_id.map_or(true, |c| t.has_category(c)))
            .map(|t| t.amount)
            .sum())
    }

    async fn insert_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let transaction = Transaction {
            id: new_transaction
                .id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: new_transaction.owner_id,
            category_id: new_transaction.category_id,
            date: new_transaction.date,
            amount: new_transaction.amount,
            currency: new_transaction.currency,
            description: new_transaction.description,
            revision: Uuid::new_v4().to_string(),
        };
        self.state().transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn update_transaction(&self, update: TransactionUpdate) -> Result<Transaction> {
        let mut state = self.state();
        let transaction = state
            .transactions
            .iter_mut()
            .find(|t| t.id == update.id)
            .ok_or_else(|| Error::not_found("transaction", &update.id))?;
        transaction.category_id = update.category_id;
        transaction.date = update.date;
        transaction.amount = update.amount;
        transaction.currency = update.currency;
        transaction.description = update.description;
        transaction.revision = Uuid::new_v4().to_string();
        Ok(transaction.clone())
    }

    async fn delete_transaction(&self, transaction_id: &str) -> Result<Transaction> {
        let mut state = self.state();
        let index = state
            .transactions
            .iter()
            .position(|t| t.id == transaction_id)
            .ok_or_else(|| Error::not_found("transaction", transaction_id))?;
        Ok(state.transactions.remove(index))
    }
}

#[async_trait]
impl BudgetRepositoryTrait for InMemoryStore {
    fn get_budget(&self, budget_id: &str) -> Result<Budget> {
        let state = self.state();
        state.check_failing(budget_id)?;
        state
            .budgets
            .iter()
            .find(|b| b.id == budget_id)
            .cloned()
            .ok_or_else(|| Error::not_found("budget", budget_id))
    }

    fn list_budgets_by_owner(&self, owner_id: &str) -> Result<Vec<Budget>> {
        Ok(self
            .state()
            .budgets
            .iter()
            .filter(|b| b.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn list_budgets_by_status(&self, status: BudgetStatus) -> Result<Vec<Budget>> {
        Ok(self
            .state()
            .budgets
            .iter()
            .filter(|b| b.status == status)
            .cloned()
            .collect())
    }

    fn get_budget_categories(&self, budget_id: &str) -> Result<Vec<BudgetCategory>> {
        Ok(self
            .state()
            .budget_categories
            .iter()
            .filter(|c| c.budget_id == budget_id)
            .cloned()
            .collect())
    }

    fn find_exceeded_categories(&self, budget_id: &str) -> Result<Vec<BudgetCategory>> {
        Ok(self
            .get_budget_categories(budget_id)?
            .into_iter()
            .filter(BudgetCategory::is_exceeded)
            .collect())
    }

    fn find_active_budget_categories(
        &self,
        owner_id: &str,
        category_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<BudgetCategory>> {
        let state = self.state();
        let budget_ids: HashSet<&str> = state
            .budgets
            .iter()
            .filter(|b| {
                b.owner_id == owner_id && b.status == BudgetStatus::Active && b.contains(date)
            })
            .map(|b| b.id.as_str())
            .collect();
        Ok(state
            .budget_categories
            .iter()
            .filter(|c| c.category_id == category_id && budget_ids.contains(c.budget_id.as_str()))
            .cloned()
            .collect())
    }

    async fn create_budget(&self, new_budget: NewBudget, status: BudgetStatus) -> Result<Budget> {
        let budget = Budget {
            id: new_budget.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: new_budget.owner_id,
            name: new_budget.name,
            start_date: new_budget.start_date,
            end_date: new_budget.end_date,
            status,
        };
        let mut state = self.state();
        for category in new_budget.categories {
            state.budget_categories.push(BudgetCategory {
                id: Uuid::new_v4().to_string(),
                budget_id: budget.id.clone(),
                category_id: category.category_id,
                limit_amount: category.limit_amount,
                spent_amount: Decimal::ZERO,
            });
        }
        state.budgets.push(budget.clone());
        Ok(budget)
    }

    async fn add_budget_category(
        &self,
        budget_id: &str,
        new_category: NewBudgetCategory,
    ) -> Result<BudgetCategory> {
        let mut state = self.state();
        if state.budget_category_mut(budget_id, &new_category.category_id).is_ok() {
            return Err(Error::InvalidState(format!(
                "Budget '{}' already has a limit for category '{}'",
                budget_id, new_category.category_id
            )));
        }
        let row = BudgetCategory {
            id: Uuid::new_v4().to_string(),
            budget_id: budget_id.to_string(),
            category_id: new_category.category_id,
            limit_amount: new_category.limit_amount,
            spent_amount: Decimal::ZERO,
        };
        state.budget_categories.push(row.clone());
        Ok(row)
    }

    async fn update_budget_status(&self, budget_id: &str, status: BudgetStatus) -> Result<Budget> {
        let mut state = self.state();
        let budget = state
            .budgets
            .iter_mut()
            .find(|b| b.id == budget_id)
            .ok_or_else(|| Error::not_found("budget", budget_id))?;
        budget.status = status;
        Ok(budget.clone())
    }

    async fn overwrite_spent_amount(
        &self,
        budget_id: &str,
        category_id: &str,
        total: Decimal,
    ) -> Result<SpentChange> {
        let mut state = self.state();
        Ok(state
            .budget_category_mut(budget_id, category_id)?
            .overwrite_spent(total))
    }

    async fn increment_spent_amounts(
        &self,
        event_key: Option<String>,
        increments: Vec<SpentIncrement>,
    ) -> Result<Option<Vec<SpentChange>>> {
        let mut state = self.state();
        if let Some(key) = &event_key {
            if state.spend_events.contains(key) {
                return Ok(None);
            }
        }
        // Validate every target before touching any, so the unit stays atomic.
        for increment in &increments {
            state.budget_category_mut(&increment.budget_id, &increment.category_id)?;
        }
        let mut changes = Vec::with_capacity(increments.len());
        for increment in increments {
            let row = state.budget_category_mut(&increment.budget_id, &increment.category_id)?;
            changes.push(row.apply_spent_delta(increment.amount));
        }
        if let Some(key) = event_key {
            state.spend_events.insert(key);
        }
        Ok(Some(changes))
    }
}

#[async_trait]
impl RuleRepositoryTrait for InMemoryStore {
    fn get_rule(&self, rule_id: &str) -> Result<Rule> {
        self.state()
            .rules
            .iter()
            .find(|r| r.id == rule_id)
            .cloned()
            .ok_or_else(|| Error::not_found("rule", rule_id))
    }

    fn list_rules_by_owner(&self, owner_id: &str) -> Result<Vec<Rule>> {
        Ok(self
            .state()
            .rules
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn list_active_rules_by_owner(&self, owner_id: &str) -> Result<Vec<Rule>> {
        let state = self.state();
        state.check_failing(owner_id)?;
        Ok(state
            .rules
            .iter()
            .filter(|r| r.owner_id == owner_id && r.active)
            .cloned()
            .collect())
    }

    fn list_owners_with_active_rules(&self) -> Result<Vec<String>> {
        let mut owners: Vec<String> = self
            .state()
            .rules
            .iter()
            .filter(|r| r.active)
            .map(|r| r.owner_id.clone())
            .collect();
        owners.sort();
        owners.dedup();
        Ok(owners)
    }

    async fn insert_rule(&self, new_rule: NewRule) -> Result<Rule> {
        let rule = Rule {
            id: new_rule.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: new_rule.owner_id,
            category_id: new_rule.category_id,
            condition_type: new_rule.condition_type,
            threshold: new_rule.threshold,
            period: new_rule.period,
            active: new_rule.active,
        };
        self.state().rules.push(rule.clone());
        Ok(rule)
    }

    async fn set_rule_active(&self, rule_id: &str, active: bool) -> Result<Rule> {
        let mut state = self.state();
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| Error::not_found("rule", rule_id))?;
        rule.active = active;
        Ok(rule.clone())
    }

    async fn delete_rule(&self, rule_id: &str) -> Result<()> {
        let mut state = self.state();
        let before = state.rules.len();
        state.rules.retain(|r| r.id != rule_id);
        if state.rules.len() == before {
            return Err(Error::not_found("rule", rule_id));
        }
        Ok(())
    }
}

#[async_trait]
impl GoalRepositoryTrait for InMemoryStore {
    fn get_goal(&self, goal_id: &str) -> Result<Goal> {
        self.state()
            .goals
            .iter()
            .find(|g| g.id == goal_id)
            .cloned()
            .ok_or_else(|| Error::not_found("goal", goal_id))
    }

    fn list_goals_by_owner(&self, owner_id: &str) -> Result<Vec<Goal>> {
        let state = self.state();
        state.check_failing(owner_id)?;
        Ok(state
            .goals
            .iter()
            .filter(|g| g.owner_id == owner_id)
            .cloned()
            .collect())
    }

    fn list_owners_with_open_goals(&self) -> Result<Vec<String>> {
        let mut owners: Vec<String> = self
            .state()
            .goals
            .iter()
            .filter(|g| !g.completed)
            .map(|g| g.owner_id.clone())
            .collect();
        owners.sort();
        owners.dedup();
        Ok(owners)
    }

    async fn insert_new_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        let goal = Goal {
            id: new_goal.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            owner_id: new_goal.owner_id,
            name: new_goal.name,
            category_id: new_goal.category_id,
            target_amount: new_goal.target_amount,
            current_amount: Decimal::ZERO,
            target_date: new_goal.target_date,
            currency: new_goal.currency,
            completed: false,
        };
        self.state().goals.push(goal.clone());
        Ok(goal)
    }

    async fn add_progress(&self, goal_id: &str, amount: Decimal) -> Result<GoalProgress> {
        let mut state = self.state();
        let goal = state
            .goals
            .iter_mut()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| Error::not_found("goal", goal_id))?;
        let newly_completed = goal.add_contribution(amount);
        Ok(GoalProgress {
            goal: goal.clone(),
            newly_completed,
        })
    }

    async fn replace_progress(
        &self,
        owner_id: &str,
        resets: Vec<GoalProgressReset>,
    ) -> Result<usize> {
        let mut state = self.state();
        let mut written = 0;
        for reset in resets {
            if let Some(goal) = state
                .goals
                .iter_mut()
                .find(|g| g.id == reset.goal_id && g.owner_id == owner_id)
            {
                goal.current_amount = reset.current_amount;
                goal.completed = reset.completed;
                written += 1;
            }
        }
        Ok(written)
    }

    async fn delete_goal(&self, goal_id: &str) -> Result<()> {
        self.state().goals.retain(|g| g.id != goal_id);
        Ok(())
    }
}

#[async_trait]
impl AlertRepositoryTrait for InMemoryStore {
    fn get_alert(&self, alert_id: &str) -> Result<Alert> {
        self.state()
            .alerts
            .iter()
            .find(|a| a.id == alert_id)
            .cloned()
            .ok_or_else(|| Error::not_found("alert", alert_id))
    }

    fn list_alerts(&self, owner_id: &str, unread_only: bool) -> Result<Vec<Alert>> {
        Ok(self
            .state()
            .alerts
            .iter()
            .filter(|a| a.owner_id == owner_id && (!unread_only || !a.read))
            .cloned()
            .collect())
    }

    fn find_unread_by_source(
        &self,
        source_type: AlertSourceType,
        source_id: &str,
    ) -> Result<Vec<Alert>> {
        Ok(self
            .state()
            .alerts
            .iter()
            .filter(|a| a.source_type == source_type && a.source_id == source_id && !a.read)
            .cloned()
            .collect())
    }

    async fn insert_alert(&self, new_alert: NewAlert) -> Result<Alert> {
        let mut state = self.state();
        if state.fail_alert_inserts {
            return Err(DatabaseError::QueryFailed("alert insert failed".to_string()).into());
        }
        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            owner_id: new_alert.owner_id.clone(),
            source_type: new_alert.source_type(),
            source_id: new_alert.source_id,
            kind: new_alert.kind,
            message: new_alert.message,
            read: false,
            created_at: Utc::now().naive_utc(),
        };
        state.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn mark_read(&self, alert_id: &str) -> Result<Alert> {
        let mut state = self.state();
        let alert = state
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id)
            .ok_or_else(|| Error::not_found("alert", alert_id))?;
        alert.read = true;
        Ok(alert.clone())
    }

    async fn delete_alert(&self, alert_id: &str) -> Result<()> {
        self.state().alerts.retain(|a| a.id != alert_id);
        Ok(())
    }
}
