//! Event queue worker: drains the sink's channel and logs each event.

use tokio::sync::mpsc;

use spendwatch_core::events::DomainEvent;

/// Runs until every sink handle is dropped.
pub async fn event_queue_worker(mut rx: mpsc::UnboundedReceiver<DomainEvent>) {
    tracing::info!("Domain event queue worker started");

    while let Some(event) = rx.recv().await {
        let payload = serde_json::to_string(&event).unwrap_or_else(|_| format!("{:?}", event));
        tracing::info!(target: "spendwatch::events", kind = event_kind(&event), "{}", payload);
    }

    tracing::info!("Domain event queue worker stopped");
}

fn event_kind(event: &DomainEvent) -> &'static str {
    match event {
        DomainEvent::AlertCreated { .. } => "alert_created",
        DomainEvent::BudgetStatusChanged { .. } => "budget_status_changed",
        DomainEvent::GoalCompleted { .. } => "goal_completed",
        DomainEvent::SpendReconciled { .. } => "spend_reconciled",
    }
}
