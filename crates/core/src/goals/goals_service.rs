use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};
use rust_decimal::Decimal;

use crate::alerts::{
    goal_at_risk_message, goal_completed_message, AlertKind, AlertServiceTrait, DispatchOutcome,
    NewAlert,
};
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::goals::{Goal, GoalProgressReset, GoalRepositoryTrait, GoalServiceTrait, NewGoal};
use crate::settings::EvaluationSettings;
use crate::transactions::{Transaction, TransactionRepositoryTrait};
use crate::utils::Clock;

/// Tracks goal progress, completion and risk.
pub struct GoalService {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    alert_service: Arc<dyn AlertServiceTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    clock: Arc<dyn Clock>,
    settings: EvaluationSettings,
}

impl GoalService {
    pub fn new(
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        alert_service: Arc<dyn AlertServiceTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        clock: Arc<dyn Clock>,
        settings: EvaluationSettings,
    ) -> Self {
        GoalService {
            goal_repository,
            transaction_repository,
            alert_service,
            event_sink,
            clock,
            settings,
        }
    }

    fn owned_goal(&self, goal_id: &str, owner_id: &str) -> Result<Goal> {
        let goal = self.goal_repository.get_goal(goal_id)?;
        if goal.owner_id != owner_id {
            return Err(Error::not_found("goal", goal_id));
        }
        Ok(goal)
    }

    /// Adds progress, then raises the completion alert (first completion only)
    /// and runs the risk check.
    async fn contribute(&self, goal_id: &str, amount: Decimal) -> Result<Goal> {
        let progress = self.goal_repository.add_progress(goal_id, amount).await?;
        let goal = progress.goal;

        if progress.newly_completed {
            info!("Goal {} reached its target of {}", goal.id, goal.target_amount);
            self.event_sink.emit(DomainEvent::goal_completed(
                goal.id.clone(),
                goal.owner_id.clone(),
            ));
            let message = goal_completed_message(&goal.name, goal.target_amount, &goal.currency);
            if let Err(e) = self
                .alert_service
                .dispatch(NewAlert::new(
                    &goal.owner_id,
                    AlertKind::GoalCompleted,
                    &goal.id,
                    message,
                ))
                .await
            {
                error!("Failed to raise completion alert for goal {}: {}", goal.id, e);
            }
        }

        if let Err(e) = self.check_risk(&goal).await {
            error!("Risk check failed for goal {}: {}", goal.id, e);
        }
        Ok(goal)
    }

    /// Dispatches a risk alert when the goal is at risk today.
    async fn check_risk(&self, goal: &Goal) -> Result<Option<DispatchOutcome>> {
        let Some(risk) = goal.risk(self.clock.today(), &self.settings) else {
            return Ok(None);
        };
        debug!(
            "Goal {} at risk: {} days left, {}% complete",
            goal.id, risk.days_remaining, risk.percent_complete
        );
        let message = goal_at_risk_message(
            &goal.name,
            risk.days_remaining,
            risk.percent_complete,
            risk.amount_remaining,
            &goal.currency,
        );
        let outcome = self
            .alert_service
            .dispatch(NewAlert::new(
                &goal.owner_id,
                AlertKind::GoalAtRisk,
                &goal.id,
                message,
            ))
            .await?;
        Ok(Some(outcome))
    }
}

/// Replays a ledger into fresh progress for `goals`, in ledger order.
fn replay_ledger(goals: &[Goal], transactions: &[Transaction]) -> Vec<GoalProgressReset> {
    let mut replayed: HashMap<&str, Goal> = goals
        .iter()
        .map(|goal| {
            let mut fresh = goal.clone();
            fresh.current_amount = Decimal::ZERO;
            fresh.completed = false;
            (goal.id.as_str(), fresh)
        })
        .collect();

    for transaction in transactions {
        for goal in replayed.values_mut() {
            if goal.matches_transaction(transaction) {
                goal.add_contribution(transaction.amount);
            }
        }
    }

    goals
        .iter()
        .filter_map(|goal| replayed.get(goal.id.as_str()))
        .map(|goal| GoalProgressReset {
            goal_id: goal.id.clone(),
            current_amount: goal.current_amount,
            completed: goal.completed,
        })
        .collect()
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    fn get_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
        self.goal_repository.list_goals_by_owner(owner_id)
    }

    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        new_goal.validate()?;
        self.goal_repository.insert_new_goal(new_goal).await
    }

    async fn delete_goal(&self, goal_id: &str, owner_id: &str) -> Result<()> {
        self.owned_goal(goal_id, owner_id)?;
        self.goal_repository.delete_goal(goal_id).await
    }

    async fn update_goal_progress(
        &self,
        goal_id: &str,
        owner_id: &str,
        amount: Decimal,
    ) -> Result<Goal> {
        if amount < Decimal::ZERO {
            return Err(ValidationError::InvalidInput(format!(
                "Goal contribution cannot be negative: {}",
                amount
            ))
            .into());
        }
        self.owned_goal(goal_id, owner_id)?;
        self.contribute(goal_id, amount).await
    }

    async fn process_transaction_for_goals(&self, transaction: &Transaction) -> Result<Vec<Goal>> {
        let matching: Vec<Goal> = self
            .goal_repository
            .list_goals_by_owner(&transaction.owner_id)?
            .into_iter()
            .filter(|goal| goal.matches_transaction(transaction))
            .collect();

        let mut updated = Vec::with_capacity(matching.len());
        for goal in matching {
            match self.contribute(&goal.id, transaction.amount).await {
                Ok(goal) => updated.push(goal),
                Err(e) => error!(
                    "Failed to apply transaction {} to goal {}: {}",
                    transaction.id, goal.id, e
                ),
            }
        }
        Ok(updated)
    }

    async fn evaluate_goals_for_user(&self, owner_id: &str) -> Result<usize> {
        let goals = self.goal_repository.list_goals_by_owner(owner_id)?;
        let mut raised = 0;
        for goal in goals.iter().filter(|goal| !goal.completed) {
            match self.check_risk(goal).await {
                Ok(Some(outcome)) if outcome.is_created() => raised += 1,
                Ok(_) => {}
                Err(e) => error!("Risk check failed for goal {}: {}", goal.id, e),
            }
        }
        Ok(raised)
    }

    async fn evaluate_all_goals(&self) -> Result<usize> {
        let owners = self.goal_repository.list_owners_with_open_goals()?;
        let mut raised = 0;
        for owner_id in &owners {
            match self.evaluate_goals_for_user(owner_id).await {
                Ok(count) => raised += count,
                Err(e) => error!("Failed to evaluate goals for user {}: {}", owner_id, e),
            }
        }
        info!(
            "Evaluated goals for {} user(s); {} new risk alert(s)",
            owners.len(),
            raised
        );
        Ok(raised)
    }

    async fn sync_all_transactions_with_goals(&self, owner_id: &str) -> Result<Vec<Goal>> {
        let goals = self.goal_repository.list_goals_by_owner(owner_id)?;
        if goals.is_empty() {
            return Ok(goals);
        }
        let transactions = self.transaction_repository.find_by_owner_id(owner_id)?;
        let resets = replay_ledger(&goals, &transactions);

        let written = self
            .goal_repository
            .replace_progress(owner_id, resets)
            .await?;
        info!(
            "Resynced {} goal(s) for user {} from {} transaction(s)",
            written,
            owner_id,
            transactions.len()
        );
        self.goal_repository.list_goals_by_owner(owner_id)
    }
}
