use async_trait::async_trait;

use crate::budgets::{BudgetCategory, BudgetSummary};
use crate::errors::Result;
use crate::spending::{DeltaOutcome, SpendDelta, SpendEventKey};
use crate::transactions::{NewTransaction, Transaction, TransactionUpdate};

/// The only entry points allowed to mutate `BudgetCategory::spent_amount`.
#[async_trait]
pub trait SpendAggregatorTrait: Send + Sync {
    /// Re-sums the ledger for every category of the budget over the budget's
    /// window and overwrites the stored totals. Safe to retry.
    async fn recompute(&self, budget_id: &str) -> Result<Vec<BudgetCategory>>;

    /// Applies a single unkeyed delta. The caller guarantees exactly-once delivery.
    async fn apply_delta(&self, delta: SpendDelta) -> Result<DeltaOutcome>;

    /// Applies all deltas of one transaction event atomically, at most once per key.
    async fn apply_event(&self, key: SpendEventKey, deltas: Vec<SpendDelta>)
        -> Result<DeltaOutcome>;

    /// Inserts a ledger row and applies its delta without letting a recompute
    /// of the owner's budgets run in between.
    async fn record_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<(Transaction, DeltaOutcome)>;

    /// Replaces a ledger row owned by `owner_id` and moves its spend.
    async fn amend_transaction(
        &self,
        owner_id: &str,
        update: TransactionUpdate,
    ) -> Result<(Transaction, DeltaOutcome)>;

    /// Deletes a ledger row owned by `owner_id` and removes its spend.
    async fn remove_transaction(
        &self,
        owner_id: &str,
        transaction_id: &str,
    ) -> Result<(Transaction, DeltaOutcome)>;

    /// Redelivers the created event of a stored row. Keyed by the row's
    /// revision, so a repeat is a `Duplicate`.
    async fn transaction_created(&self, transaction: &Transaction) -> Result<DeltaOutcome>;

    async fn transaction_deleted(&self, transaction: &Transaction) -> Result<DeltaOutcome>;

    /// Removes `before` from the budgets covering its date and category and adds
    /// `after` to the budgets covering its own; the two sides are independent.
    async fn transaction_modified(
        &self,
        before: &Transaction,
        after: &Transaction,
    ) -> Result<DeltaOutcome>;

    fn summarize(&self, budget_id: &str) -> Result<BudgetSummary>;
}
