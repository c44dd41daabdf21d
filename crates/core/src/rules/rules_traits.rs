use async_trait::async_trait;

use crate::errors::Result;
use crate::rules::{NewRule, Rule, RuleEvaluation, RulePeriod};
use crate::transactions::Transaction;

/// Trait for rule repository operations
#[async_trait]
pub trait RuleRepositoryTrait: Send + Sync {
    fn get_rule(&self, rule_id: &str) -> Result<Rule>;

    fn list_rules_by_owner(&self, owner_id: &str) -> Result<Vec<Rule>>;

    fn list_active_rules_by_owner(&self, owner_id: &str) -> Result<Vec<Rule>>;

    /// Distinct owners with at least one active rule.
    fn list_owners_with_active_rules(&self) -> Result<Vec<String>>;

    async fn insert_rule(&self, new_rule: NewRule) -> Result<Rule>;

    async fn set_rule_active(&self, rule_id: &str, active: bool) -> Result<Rule>;

    async fn delete_rule(&self, rule_id: &str) -> Result<()>;
}

/// Trait for rule service operations
#[async_trait]
pub trait RuleServiceTrait: Send + Sync {
    async fn create_rule(&self, new_rule: NewRule) -> Result<Rule>;

    async fn set_rule_active(&self, rule_id: &str, owner_id: &str, active: bool) -> Result<Rule>;

    async fn delete_rule(&self, rule_id: &str, owner_id: &str) -> Result<()>;

    /// Evaluates one rule on demand. Errors surface to the caller.
    async fn evaluate_rule(&self, rule_id: &str) -> Result<RuleEvaluation>;

    /// Evaluates every active rule of the owner; per-rule failures are logged
    /// and left out of the result.
    async fn evaluate_rules_for_user(&self, owner_id: &str) -> Result<Vec<RuleEvaluation>>;

    /// Like [`evaluate_rules_for_user`](Self::evaluate_rules_for_user), limited to rules
    /// with one of the given periods.
    async fn evaluate_rules_for_user_with_periods(
        &self,
        owner_id: &str,
        periods: &[RulePeriod],
    ) -> Result<Vec<RuleEvaluation>>;

    /// Evaluates the owner's active rules that a new transaction can affect.
    async fn evaluate_rules_for_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<RuleEvaluation>>;

    /// Evaluates every active rule of every owner.
    async fn evaluate_all_rules(&self) -> Result<Vec<RuleEvaluation>>;
}
