use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};

use crate::budgets::{BudgetCategory, BudgetRepositoryTrait, BudgetSummary, SpentChange, SpentIncrement};
use crate::categories::CategoryRepositoryTrait;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::spending::{DeltaOutcome, SpendAggregatorTrait, SpendDelta, SpendEventKey, SpendEventKind};
use crate::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait, TransactionUpdate};
use crate::utils::KeyedLocks;

/// Maintains per-category spent totals against the transaction ledger.
///
/// All spend state of one owner is guarded by a single lock keyed by owner
/// id. Ledger writes hold it until their delta has landed and recompute holds
/// it across its sum and overwrite, so neither can observe the other half way.
pub struct SpendAggregator {
    budget_repository: Arc<dyn BudgetRepositoryTrait>,
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    category_repository: Arc<dyn CategoryRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    owner_locks: KeyedLocks,
}

impl SpendAggregator {
    pub fn new(
        budget_repository: Arc<dyn BudgetRepositoryTrait>,
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        category_repository: Arc<dyn CategoryRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        SpendAggregator {
            budget_repository,
            transaction_repository,
            category_repository,
            event_sink,
            owner_locks: KeyedLocks::new(),
        }
    }

    /// Resolves a delta to the budget categories it touches.
    fn increments_for(&self, delta: &SpendDelta) -> Result<Vec<SpentIncrement>> {
        let targets = self.budget_repository.find_active_budget_categories(
            &delta.owner_id,
            &delta.category_id,
            delta.date,
        )?;
        Ok(targets
            .into_iter()
            .map(|target| SpentIncrement {
                budget_id: target.budget_id,
                category_id: target.category_id,
                amount: delta.amount,
            })
            .collect())
    }

    /// Writes the increments of one event. The caller holds the owner locks.
    async fn write_increments(
        &self,
        event_key: Option<String>,
        deltas: &[SpendDelta],
    ) -> Result<DeltaOutcome> {
        let mut increments = Vec::new();
        for delta in deltas {
            increments.extend(self.increments_for(delta)?);
        }
        // Keyed events are recorded even when nothing matches, so a
        // redelivered event stays a no-op after budgets are added later.
        if event_key.is_none() && increments.is_empty() {
            return Ok(DeltaOutcome::Applied(Vec::new()));
        }

        match self
            .budget_repository
            .increment_spent_amounts(event_key.clone(), increments)
            .await?
        {
            Some(changes) => {
                for change in &changes {
                    report_floor(change);
                }
                Ok(DeltaOutcome::Applied(changes))
            }
            None => {
                info!(
                    "Spend event {} was already applied; skipping",
                    event_key.unwrap_or_default()
                );
                Ok(DeltaOutcome::Duplicate)
            }
        }
    }

    fn owned_transaction(&self, transaction_id: &str, owner_id: &str) -> Result<Transaction> {
        let transaction = self.transaction_repository.get_transaction(transaction_id)?;
        if transaction.owner_id != owner_id {
            return Err(Error::not_found("transaction", transaction_id));
        }
        Ok(transaction)
    }
}

fn created_deltas(transaction: &Transaction) -> Vec<SpendDelta> {
    SpendDelta::added(transaction).into_iter().collect()
}

fn deleted_deltas(transaction: &Transaction) -> Vec<SpendDelta> {
    SpendDelta::removed(transaction).into_iter().collect()
}

fn modified_deltas(before: &Transaction, after: &Transaction) -> Vec<SpendDelta> {
    SpendDelta::removed(before)
        .into_iter()
        .chain(SpendDelta::added(after))
        .collect()
}

fn event_key(transaction: &Transaction, kind: SpendEventKind) -> Option<String> {
    Some(SpendEventKey::for_transaction(transaction, kind).to_string())
}

/// A floored write means the stored aggregate had drifted below what the
/// ledger removes from it.
fn report_floor(change: &SpentChange) {
    if change.hit_floor() {
        warn!(
            "Spent amount for budget {} category {} floored at 0 (was {}, computed {}); aggregate diverged from ledger",
            change.budget_id, change.category_id, change.previous, change.attempted
        );
    }
}

#[async_trait]
impl SpendAggregatorTrait for SpendAggregator {
    async fn recompute(&self, budget_id: &str) -> Result<Vec<BudgetCategory>> {
        let budget = self.budget_repository.get_budget(budget_id)?;
        let _guard = self.owner_locks.lock(&budget.owner_id).await;

        let categories = self.budget_repository.get_budget_categories(budget_id)?;
        if categories.is_empty() {
            debug!("Budget {} has no categories; nothing to recompute", budget_id);
            return Ok(categories);
        }

        let mut updated = Vec::with_capacity(categories.len());
        let mut corrected = 0;
        for mut category in categories {
            let total = self.transaction_repository.sum_by_owner_category_date_range(
                &budget.owner_id,
                Some(&category.category_id),
                budget.start_date,
                budget.end_date,
            )?;
            let change = self
                .budget_repository
                .overwrite_spent_amount(budget_id, &category.category_id, total)
                .await?;
            report_floor(&change);

            if change.previous != change.spent {
                corrected += 1;
                debug!(
                    "Recomputed budget {} category {}: {} -> {}",
                    budget_id, category.category_id, change.previous, change.spent
                );
            }
            category.spent_amount = change.spent;
            updated.push(category);
        }

        if corrected > 0 {
            self.event_sink.emit(DomainEvent::spend_reconciled(
                budget_id.to_string(),
                corrected,
            ));
        }
        Ok(updated)
    }

    async fn apply_delta(&self, delta: SpendDelta) -> Result<DeltaOutcome> {
        self.category_repository.get_category(&delta.category_id)?;
        let _guard = self.owner_locks.lock(&delta.owner_id).await;
        self.write_increments(None, std::slice::from_ref(&delta))
            .await
    }

    async fn apply_event(
        &self,
        key: SpendEventKey,
        deltas: Vec<SpendDelta>,
    ) -> Result<DeltaOutcome> {
        let owners: Vec<String> = deltas.iter().map(|d| d.owner_id.clone()).collect();
        let _guards = self.owner_locks.lock_all(&owners).await;
        self.write_increments(Some(key.to_string()), &deltas).await
    }

    async fn record_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<(Transaction, DeltaOutcome)> {
        let _guard = self.owner_locks.lock(&new_transaction.owner_id).await;
        let transaction = self
            .transaction_repository
            .insert_transaction(new_transaction)
            .await?;
        let outcome = self
            .write_increments(
                event_key(&transaction, SpendEventKind::Created),
                &created_deltas(&transaction),
            )
            .await?;
        Ok((transaction, outcome))
    }

    async fn amend_transaction(
        &self,
        owner_id: &str,
        update: TransactionUpdate,
    ) -> Result<(Transaction, DeltaOutcome)> {
        let _guard = self.owner_locks.lock(owner_id).await;
        let before = self.owned_transaction(&update.id, owner_id)?;
        let after = self.transaction_repository.update_transaction(update).await?;
        let outcome = self
            .write_increments(
                event_key(&after, SpendEventKind::Modified),
                &modified_deltas(&before, &after),
            )
            .await?;
        Ok((after, outcome))
    }

    async fn remove_transaction(
        &self,
        owner_id: &str,
        transaction_id: &str,
    ) -> Result<(Transaction, DeltaOutcome)> {
        let _guard = self.owner_locks.lock(owner_id).await;
        self.owned_transaction(transaction_id, owner_id)?;
        let removed = self
            .transaction_repository
            .delete_transaction(transaction_id)
            .await?;
        let outcome = self
            .write_increments(
                event_key(&removed, SpendEventKind::Deleted),
                &deleted_deltas(&removed),
            )
            .await?;
        Ok((removed, outcome))
    }

    async fn transaction_created(&self, transaction: &Transaction) -> Result<DeltaOutcome> {
        let _guard = self.owner_locks.lock(&transaction.owner_id).await;
        self.write_increments(
            event_key(transaction, SpendEventKind::Created),
            &created_deltas(transaction),
        )
        .await
    }

    async fn transaction_deleted(&self, transaction: &Transaction) -> Result<DeltaOutcome> {
        let _guard = self.owner_locks.lock(&transaction.owner_id).await;
        self.write_increments(
            event_key(transaction, SpendEventKind::Deleted),
            &deleted_deltas(transaction),
        )
        .await
    }

    async fn transaction_modified(
        &self,
        before: &Transaction,
        after: &Transaction,
    ) -> Result<DeltaOutcome> {
        let _guard = self.owner_locks.lock(&after.owner_id).await;
        self.write_increments(
            event_key(after, SpendEventKind::Modified),
            &modified_deltas(before, after),
        )
        .await
    }

    fn summarize(&self, budget_id: &str) -> Result<BudgetSummary> {
        self.budget_repository.get_budget(budget_id)?;
        let categories = self.budget_repository.get_budget_categories(budget_id)?;
        Ok(BudgetSummary::from_categories(budget_id, &categories))
    }
}
