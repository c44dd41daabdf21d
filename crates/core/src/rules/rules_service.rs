use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info};

use crate::alerts::{rule_triggered_message, AlertKind, AlertServiceTrait, NewAlert};
use crate::categories::CategoryRepositoryTrait;
use crate::errors::{Error, Result};
use crate::rules::{
    NewRule, Rule, RuleEvaluation, RuleOutcome, RulePeriod, RuleRepositoryTrait, RuleServiceTrait,
    RuleSkipReason,
};
use crate::transactions::{Transaction, TransactionRepositoryTrait};
use crate::utils::Clock;

/// Evaluates threshold rules against rolling windows ending today.
pub struct RuleService {
    rule_repository: Arc<dyn RuleRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    category_repository: Arc<dyn CategoryRepositoryTrait>,
    alert_service: Arc<dyn AlertServiceTrait>,
    clock: Arc<dyn Clock>,
}

impl RuleService {
    pub fn new(
        rule_repository: Arc<dyn RuleRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        category_repository: Arc<dyn CategoryRepositoryTrait>,
        alert_service: Arc<dyn AlertServiceTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        RuleService {
            rule_repository,
            transaction_repository,
            category_repository,
            alert_service,
            clock,
        }
    }

    fn owned_rule(&self, rule_id: &str, owner_id: &str) -> Result<Rule> {
        let rule = self.rule_repository.get_rule(rule_id)?;
        if rule.owner_id != owner_id {
            return Err(Error::not_found("rule", rule_id));
        }
        Ok(rule)
    }

    async fn check_rule(&self, rule: &Rule) -> Result<RuleEvaluation> {
        if !rule.active {
            return Ok(RuleEvaluation {
                rule_id: rule.id.clone(),
                outcome: RuleOutcome::Skipped(RuleSkipReason::Inactive),
            });
        }

        // Resolve the category first so a dangling reference fails the rule
        // instead of silently summing nothing.
        let category_name = match rule.category_id.as_deref() {
            Some(category_id) => Some(self.category_repository.get_category(category_id)?.name),
            None => None,
        };

        let (start, end) = rule.period.window(self.clock.today());
        let sum = self.transaction_repository.sum_by_owner_category_date_range(
            &rule.owner_id,
            rule.category_id.as_deref(),
            start,
            end,
        )?;

        if !rule.condition_type.is_met(sum, rule.threshold) {
            debug!(
                "Rule {} satisfied: {} over {}..={} vs threshold {}",
                rule.id, sum, start, end, rule.threshold
            );
            return Ok(RuleEvaluation {
                rule_id: rule.id.clone(),
                outcome: RuleOutcome::Satisfied { sum },
            });
        }

        let message = rule_triggered_message(
            category_name.as_deref(),
            rule.condition_type,
            rule.threshold,
            rule.period,
            sum,
        );
        let alert = self
            .alert_service
            .dispatch(NewAlert::new(
                &rule.owner_id,
                AlertKind::RuleTriggered,
                &rule.id,
                message,
            ))
            .await?;

        Ok(RuleEvaluation {
            rule_id: rule.id.clone(),
            outcome: RuleOutcome::Triggered { sum, alert },
        })
    }

    /// Evaluates each rule independently; a failing rule is logged and skipped.
    async fn check_rules(&self, rules: Vec<Rule>) -> Vec<RuleEvaluation> {
        let mut evaluations = Vec::with_capacity(rules.len());
        for rule in rules {
            match self.check_rule(&rule).await {
                Ok(evaluation) => evaluations.push(evaluation),
                Err(e) => error!("Failed to evaluate rule {}: {}", rule.id, e),
            }
        }
        evaluations
    }
}

#[async_trait]
impl RuleServiceTrait for RuleService {
    async fn create_rule(&self, new_rule: NewRule) -> Result<Rule> {
        new_rule.validate()?;
        if let Some(category_id) = new_rule.category_id.as_deref() {
            let category = self.category_repository.get_category(category_id)?;
            if category.owner_id != new_rule.owner_id {
                return Err(Error::not_found("category", category_id));
            }
        }
        self.rule_repository.insert_rule(new_rule).await
    }

    async fn set_rule_active(&self, rule_id: &str, owner_id: &str, active: bool) -> Result<Rule> {
        self.owned_rule(rule_id, owner_id)?;
        self.rule_repository.set_rule_active(rule_id, active).await
    }

    async fn delete_rule(&self, rule_id: &str, owner_id: &str) -> Result<()> {
        self.owned_rule(rule_id, owner_id)?;
        self.rule_repository.delete_rule(rule_id).await
    }

    async fn evaluate_rule(&self, rule_id: &str) -> Result<RuleEvaluation> {
        let rule = self.rule_repository.get_rule(rule_id)?;
        self.check_rule(&rule).await
    }

    async fn evaluate_rules_for_user(&self, owner_id: &str) -> Result<Vec<RuleEvaluation>> {
        self.evaluate_rules_for_user_with_periods(owner_id, &RulePeriod::ALL)
            .await
    }

    async fn evaluate_rules_for_user_with_periods(
        &self,
        owner_id: &str,
        periods: &[RulePeriod],
    ) -> Result<Vec<RuleEvaluation>> {
        let rules: Vec<Rule> = self
            .rule_repository
            .list_active_rules_by_owner(owner_id)?
            .into_iter()
            .filter(|rule| periods.contains(&rule.period))
            .collect();
        Ok(self.check_rules(rules).await)
    }

    async fn evaluate_rules_for_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<RuleEvaluation>> {
        let rules: Vec<Rule> = self
            .rule_repository
            .list_active_rules_by_owner(&transaction.owner_id)?
            .into_iter()
            .filter(|rule| rule.applies_to_category(transaction.category_id.as_deref()))
            .collect();
        debug!(
            "Transaction {} affects {} active rule(s)",
            transaction.id,
            rules.len()
        );
        Ok(self.check_rules(rules).await)
    }

    async fn evaluate_all_rules(&self) -> Result<Vec<RuleEvaluation>> {
        let owners = self.rule_repository.list_owners_with_active_rules()?;
        let mut evaluations = Vec::new();
        for owner_id in &owners {
            match self.evaluate_rules_for_user(owner_id).await {
                Ok(mut found) => evaluations.append(&mut found),
                Err(e) => error!("Failed to evaluate rules for user {}: {}", owner_id, e),
            }
        }
        info!(
            "Evaluated {} rule(s) across {} user(s)",
            evaluations.len(),
            owners.len()
        );
        Ok(evaluations)
    }
}
