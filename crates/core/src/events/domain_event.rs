//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::alerts::{Alert, AlertKind, AlertSourceType};
use crate::budgets::BudgetStatus;

/// Domain events emitted by engine services after successful mutations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new alert was stored.
    AlertCreated {
        alert_id: String,
        owner_id: String,
        source_type: AlertSourceType,
        source_id: String,
        kind: AlertKind,
    },

    /// A budget moved forward in its lifecycle.
    BudgetStatusChanged {
        budget_id: String,
        owner_id: String,
        from: BudgetStatus,
        to: BudgetStatus,
    },

    /// A goal reached its target for the first time.
    GoalCompleted { goal_id: String, owner_id: String },

    /// Spent amounts of a budget were recomputed from the ledger.
    /// `corrected` counts categories whose stored value changed.
    SpendReconciled { budget_id: String, corrected: usize },
}

impl DomainEvent {
    /// Creates an AlertCreated event.
    pub fn alert_created(alert: &Alert) -> Self {
        Self::AlertCreated {
            alert_id: alert.id.clone(),
            owner_id: alert.owner_id.clone(),
            source_type: alert.source_type,
            source_id: alert.source_id.clone(),
            kind: alert.kind,
        }
    }

    /// Creates a BudgetStatusChanged event.
    pub fn budget_status_changed(
        budget_id: String,
        owner_id: String,
        from: BudgetStatus,
        to: BudgetStatus,
    ) -> Self {
        Self::BudgetStatusChanged {
            budget_id,
            owner_id,
            from,
            to,
        }
    }

    /// Creates a GoalCompleted event.
    pub fn goal_completed(goal_id: String, owner_id: String) -> Self {
        Self::GoalCompleted { goal_id, owner_id }
    }

    /// Creates a SpendReconciled event.
    pub fn spend_reconciled(budget_id: String, corrected: usize) -> Self {
        Self::SpendReconciled {
            budget_id,
            corrected,
        }
    }
}
