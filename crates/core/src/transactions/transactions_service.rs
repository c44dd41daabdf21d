use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};

use crate::errors::Result;
use crate::goals::GoalServiceTrait;
use crate::rules::RuleServiceTrait;
use crate::spending::SpendAggregatorTrait;
use crate::transactions::{
    NewTransaction, Transaction, TransactionServiceTrait, TransactionUpdate,
};

/// Records ledger mutations through the spend aggregator, which applies the
/// matching spend delta in the same critical section.
///
/// New transactions are also checked against the owner's rules and goals.
/// Those follow-ups are best effort: the ledger write and spend delta have
/// already landed, so their failures are logged rather than returned.
pub struct TransactionService {
    spend_aggregator: Arc<dyn SpendAggregatorTrait>,
    rule_service: Arc<dyn RuleServiceTrait>,
    goal_service: Arc<dyn GoalServiceTrait>,
}

impl TransactionService {
    pub fn new(
        spend_aggregator: Arc<dyn SpendAggregatorTrait>,
        rule_service: Arc<dyn RuleServiceTrait>,
        goal_service: Arc<dyn GoalServiceTrait>,
    ) -> Self {
        TransactionService {
            spend_aggregator,
            rule_service,
            goal_service,
        }
    }
}

#[async_trait]
impl TransactionServiceTrait for TransactionService {
    async fn create_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        new_transaction.validate()?;
        let (transaction, outcome) = self
            .spend_aggregator
            .record_transaction(new_transaction)
            .await?;
        debug!(
            "Transaction {} touched {} budget categor(ies)",
            transaction.id,
            outcome.changes().len()
        );

        if let Err(e) = self
            .rule_service
            .evaluate_rules_for_transaction(&transaction)
            .await
        {
            error!(
                "Rule evaluation failed for transaction {}: {}",
                transaction.id, e
            );
        }
        if let Err(e) = self
            .goal_service
            .process_transaction_for_goals(&transaction)
            .await
        {
            error!(
                "Goal processing failed for transaction {}: {}",
                transaction.id, e
            );
        }
        Ok(transaction)
    }

    async fn update_transaction(
        &self,
        owner_id: &str,
        update: TransactionUpdate,
    ) -> Result<Transaction> {
        update.validate()?;
        let (after, _) = self
            .spend_aggregator
            .amend_transaction(owner_id, update)
            .await?;
        Ok(after)
    }

    async fn delete_transaction(
        &self,
        owner_id: &str,
        transaction_id: &str,
    ) -> Result<Transaction> {
        let (removed, _) = self
            .spend_aggregator
            .remove_transaction(owner_id, transaction_id)
            .await?;
        Ok(removed)
    }
}
