//! Spend delta models.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budgets::SpentChange;
use crate::transactions::Transaction;

/// The transaction mutation a delta stems from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpendEventKind {
    Created,
    Deleted,
    Modified,
}

impl SpendEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpendEventKind::Created => "CREATED",
            SpendEventKind::Deleted => "DELETED",
            SpendEventKind::Modified => "MODIFIED",
        }
    }
}

/// Idempotency key for one transaction event. A redelivered event with the
/// same key is not applied twice.
///
/// Ledger events always carry the revision of the row they produced or
/// removed, which is unique per write.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpendEventKey {
    pub transaction_id: String,
    pub kind: SpendEventKind,
    /// Distinguishes successive modifications of the same transaction.
    pub revision: Option<String>,
}

impl SpendEventKey {
    pub fn new(transaction_id: impl Into<String>, kind: SpendEventKind) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            kind,
            revision: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Key for an event on one stored state of a transaction. For
    /// modifications pass the state after the edit.
    pub fn for_transaction(transaction: &Transaction, kind: SpendEventKind) -> Self {
        Self::new(&transaction.id, kind).with_revision(&transaction.revision)
    }
}

impl fmt::Display for SpendEventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(revision) => write!(f, "{}:{}:{}", self.transaction_id, self.kind.as_str(), revision),
            None => write!(f, "{}:{}", self.transaction_id, self.kind.as_str()),
        }
    }
}

/// An amount to add to every matching budget category: ACTIVE budgets of
/// `owner_id` whose window contains `date` and that track `category_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendDelta {
    pub owner_id: String,
    pub category_id: String,
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl SpendDelta {
    /// `+amount` at the transaction's date; `None` for uncategorized transactions.
    pub fn added(transaction: &Transaction) -> Option<Self> {
        Self::signed(transaction, transaction.amount)
    }

    /// `-amount` at the transaction's date; `None` for uncategorized transactions.
    pub fn removed(transaction: &Transaction) -> Option<Self> {
        Self::signed(transaction, -transaction.amount)
    }

    fn signed(transaction: &Transaction, amount: Decimal) -> Option<Self> {
        transaction.category_id.as_ref().map(|category_id| SpendDelta {
            owner_id: transaction.owner_id.clone(),
            category_id: category_id.clone(),
            date: transaction.date,
            amount,
        })
    }
}

/// Result of applying a delta or an event's deltas.
#[derive(Debug, Clone, PartialEq)]
pub enum DeltaOutcome {
    Applied(Vec<SpentChange>),
    /// The event key had already been applied; nothing changed.
    Duplicate,
}

impl DeltaOutcome {
    pub fn changes(&self) -> &[SpentChange] {
        match self {
            DeltaOutcome::Applied(changes) => changes,
            DeltaOutcome::Duplicate => &[],
        }
    }
}
