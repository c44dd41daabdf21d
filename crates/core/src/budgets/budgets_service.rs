use std::sync::Arc;

use async_trait::async_trait;
use log::{error, info};
use rust_decimal::Decimal;

use crate::alerts::{budget_exceeded_message, AlertKind, AlertServiceTrait, NewAlert};
use crate::budgets::{
    AttentionReason, Budget, BudgetAttention, BudgetCategory, BudgetEvaluation,
    BudgetRepositoryTrait, BudgetServiceTrait, BudgetStatus, BudgetSummary, NewBudget,
    NewBudgetCategory,
};
use crate::categories::CategoryRepositoryTrait;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::settings::EvaluationSettings;
use crate::spending::SpendAggregatorTrait;
use crate::utils::time_utils::days_between;
use crate::utils::Clock;

/// Drives budget status over time and raises over-limit alerts.
pub struct BudgetService {
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
    category_repository: Arc<dyn CategoryRepositoryTrait>,
    spend_aggregator: Arc<dyn SpendAggregatorTrait>,
    alert_service: Arc<dyn AlertServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    clock: Arc<dyn Clock>,
    settings: EvaluationSettings,
}

impl BudgetService {
    pub fn new(
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
        category_repository: Arc<dyn CategoryRepositoryTrait>,
        spend_aggregator: Arc<dyn SpendAggregatorTrait>,
        alert_service: Arc<dyn AlertServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        clock: Arc<dyn Clock>,
        settings: EvaluationSettings,
    ) -> Self {
        BudgetService {
            budget_repository,
            category_repository,
            spend_aggregator,
            alert_service,
            event_sink,
            clock,
            settings,
        }
    }

    fn ensure_owned_category(&self, category_id: &str, owner_id: &str) -> Result<()> {
        let category = self.category_repository.get_category(category_id)?;
        if category.owner_id != owner_id {
            return Err(Error::not_found("category", category_id));
        }
        Ok(())
    }

    async fn transition(&self, budget: &Budget, to: BudgetStatus) -> Result<Budget> {
        let updated = self
            .budget_repository
            .update_budget_status(&budget.id, to)
            .await?;
        // Deltas skip upcoming budgets, so spend already dated in the window
        // is only picked up here.
        if budget.status == BudgetStatus::Upcoming {
            self.spend_aggregator.recompute(&budget.id).await?;
        }
        if to == BudgetStatus::Completed {
            self.log_completion_summary(budget);
        }
        info!(
            "Budget {} ('{}') moved {} -> {}",
            budget.id, budget.name, budget.status, to
        );
        self.event_sink.emit(DomainEvent::budget_status_changed(
            budget.id.clone(),
            budget.owner_id.clone(),
            budget.status,
            to,
        ));
        Ok(updated)
    }

    fn log_completion_summary(&self, budget: &Budget) {
        match self.spend_aggregator.summarize(&budget.id) {
            Ok(summary) => info!(
                "Budget {} ('{}') completed: totalBudgeted={}, totalSpent={}, remaining={}",
                budget.id,
                budget.name,
                summary.total_budgeted,
                summary.total_spent,
                summary.remaining
            ),
            Err(e) => error!(
                "Failed to summarize budget {} on completion: {}",
                budget.id, e
            ),
        }
    }

    /// Dispatches one alert per exceeded category; failures are logged per category.
    async fn alert_exceeded_categories(&self, budget: &Budget) -> Result<usize> {
        let exceeded = self.budget_repository.find_exceeded_categories(&budget.id)?;
        let mut created = 0;
        for budget_category in exceeded {
            let category_name = self
                .category_repository
                .get_category(&budget_category.category_id)
                .map(|c| c.name)
                .unwrap_or_else(|_| budget_category.category_id.clone());
            let message = budget_exceeded_message(
                &budget.name,
                &category_name,
                budget_category.limit_amount,
                budget_category.spent_amount,
            );
            match self
                .alert_service
                .dispatch(NewAlert::new(
                    &budget.owner_id,
                    AlertKind::BudgetExceeded,
                    &budget_category.id,
                    message,
                ))
                .await
            {
                Ok(outcome) if outcome.is_created() => created += 1,
                Ok(_) => {}
                Err(e) => error!(
                    "Failed to raise over-limit alert for budget {} category {}: {}",
                    budget.id, budget_category.category_id, e
                ),
            }
        }
        Ok(created)
    }

    fn attention_for(&self, budget: &Budget) -> Result<Option<BudgetAttention>> {
        if budget.status != BudgetStatus::Active {
            return Ok(None);
        }
        let threshold = self.settings.attention_threshold();
        let mut reasons: Vec<AttentionReason> = self
            .budget_repository
            .get_budget_categories(&budget.id)?
            .into_iter()
            .filter(|c| c.limit_amount > Decimal::ZERO && c.usage_percent() >= threshold)
            .map(|c| AttentionReason::CategoryNearLimit {
                percent_used: c.usage_percent(),
                category_id: c.category_id,
            })
            .collect();

        let days_remaining = days_between(self.clock.today(), budget.end_date);
        if (0..=self.settings.ending_soon_days).contains(&days_remaining) {
            reasons.push(AttentionReason::EndingSoon { days_remaining });
        }

        if reasons.is_empty() {
            return Ok(None);
        }
        Ok(Some(BudgetAttention {
            budget: budget.clone(),
            reasons,
        }))
    }

    async fn evaluate_each(&self, budgets: Vec<Budget>) -> Vec<BudgetEvaluation> {
        let mut evaluations = Vec::with_capacity(budgets.len());
        for budget in budgets {
            match self.evaluate_budget(&budget.id).await {
                Ok(evaluation) => evaluations.push(evaluation),
                Err(e) => error!("Failed to evaluate budget {}: {}", budget.id, e),
            }
        }
        evaluations
    }
}

#[async_trait]
impl BudgetServiceTrait for BudgetService {
    fn get_budget(&self, budget_id: &str) -> Result<Budget> {
        self.budget_repository.get_budget(budget_id)
    }

    fn list_budgets(&self, owner_id: &str) -> Result<Vec<Budget>> {
        self.budget_repository.list_budgets_by_owner(owner_id)
    }

    fn get_budget_summary(&self, budget_id: &str) -> Result<BudgetSummary> {
        self.spend_aggregator.summarize(budget_id)
    }

    async fn create_budget(&self, new_budget: NewBudget) -> Result<Budget> {
        new_budget.validate()?;
        for category in &new_budget.categories {
            self.ensure_owned_category(&category.category_id, &new_budget.owner_id)?;
        }

        let status = BudgetStatus::for_dates(
            new_budget.start_date,
            new_budget.end_date,
            self.clock.today(),
        );
        let budget = self
            .budget_repository
            .create_budget(new_budget, status)
            .await?;

        // Spending recorded before the budget existed is picked up here.
        self.spend_aggregator.recompute(&budget.id).await?;
        Ok(budget)
    }

    async fn add_category_limit(
        &self,
        budget_id: &str,
        category_id: &str,
        limit_amount: Decimal,
    ) -> Result<BudgetCategory> {
        let new_category = NewBudgetCategory {
            category_id: category_id.to_string(),
            limit_amount,
        };
        new_category.validate()?;

        let budget = self.budget_repository.get_budget(budget_id)?;
        self.ensure_owned_category(category_id, &budget.owner_id)?;
        if self
            .budget_repository
            .get_budget_categories(budget_id)?
            .iter()
            .any(|c| c.category_id == category_id)
        {
            return Err(Error::InvalidState(format!(
                "Budget '{}' already has a limit for category '{}'",
                budget_id, category_id
            )));
        }

        self.budget_repository
            .add_budget_category(budget_id, new_category)
            .await?;
        let recomputed = self.spend_aggregator.recompute(budget_id).await?;
        recomputed
            .into_iter()
            .find(|c| c.category_id == category_id)
            .ok_or_else(|| Error::not_found("budget category", category_id))
    }

    async fn evaluate_budget(&self, budget_id: &str) -> Result<BudgetEvaluation> {
        let mut budget = self.budget_repository.get_budget(budget_id)?;
        let from = budget.status;
        let target = budget.status_on(self.clock.today());

        let transition = if target != from {
            budget = self.transition(&budget, target).await?;
            Some((from, target))
        } else {
            None
        };

        let alerts_created = if budget.status == BudgetStatus::Active {
            self.alert_exceeded_categories(&budget).await?
        } else {
            0
        };

        Ok(BudgetEvaluation {
            budget_id: budget.id,
            status: budget.status,
            transition,
            alerts_created,
        })
    }

    async fn evaluate_user_budgets(&self, owner_id: &str) -> Result<Vec<BudgetEvaluation>> {
        let budgets: Vec<Budget> = self
            .budget_repository
            .list_budgets_by_owner(owner_id)?
            .into_iter()
            .filter(|b| b.status != BudgetStatus::Completed)
            .collect();
        Ok(self.evaluate_each(budgets).await)
    }

    async fn evaluate_all_active_budgets(&self) -> Result<Vec<BudgetEvaluation>> {
        let mut budgets = self
            .budget_repository
            .list_budgets_by_status(BudgetStatus::Upcoming)?;
        budgets.extend(
            self.budget_repository
                .list_budgets_by_status(BudgetStatus::Active)?,
        );
        let evaluations = self.evaluate_each(budgets).await;
        info!("Evaluated {} budget(s)", evaluations.len());
        Ok(evaluations)
    }

    async fn archive_budget(&self, budget_id: &str) -> Result<Budget> {
        let budget = self.budget_repository.get_budget(budget_id)?;
        if budget.status == BudgetStatus::Completed {
            return Ok(budget);
        }
        self.transition(&budget, BudgetStatus::Completed).await
    }

    fn needs_attention(&self, budget_id: &str) -> Result<Option<BudgetAttention>> {
        let budget = self.budget_repository.get_budget(budget_id)?;
        self.attention_for(&budget)
    }

    fn budgets_needing_attention(&self, owner_id: &str) -> Result<Vec<BudgetAttention>> {
        let mut flagged = Vec::new();
        for budget in self.budget_repository.list_budgets_by_owner(owner_id)? {
            if let Some(attention) = self.attention_for(&budget)? {
                flagged.push(attention);
            }
        }
        Ok(flagged)
    }
}
