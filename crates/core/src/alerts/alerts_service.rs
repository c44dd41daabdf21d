use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error};

use crate::alerts::{
    Alert, AlertRepositoryTrait, AlertServiceTrait, DispatchOutcome, NewAlert, SkipReason,
};
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::utils::KeyedLocks;

/// Idempotent alert creation shared by the budget, rule and goal evaluators.
///
/// Dedup is uniform across source types: an alert is created only when no
/// unread alert with the same `(source_type, source_id, kind)` exists.
pub struct AlertService {
    alert_repository: Arc<dyn AlertRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    source_locks: KeyedLocks,
}

impl AlertService {
    pub fn new(
        alert_repository: Arc<dyn AlertRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            alert_repository,
            event_sink,
            source_locks: KeyedLocks::new(),
        }
    }

    fn owned_alert(&self, alert_id: &str, owner_id: &str) -> Result<Alert> {
        let alert = self.alert_repository.get_alert(alert_id)?;
        if alert.owner_id != owner_id {
            return Err(Error::not_found("alert", alert_id));
        }
        Ok(alert)
    }
}

#[async_trait]
impl AlertServiceTrait for AlertService {
    async fn dispatch(&self, new_alert: NewAlert) -> Result<DispatchOutcome> {
        let source_type = new_alert.source_type();
        let lock_key = format!("{}:{}:{}", source_type, new_alert.source_id, new_alert.kind);
        // Check-then-insert must not interleave for the same source.
        let _guard = self.source_locks.lock(&lock_key).await;

        let unread = self
            .alert_repository
            .find_unread_by_source(source_type, &new_alert.source_id)?;
        if let Some(existing) = unread.iter().find(|a| a.kind == new_alert.kind) {
            debug!(
                "Skipping duplicate {} alert for {} {} (unread alert {})",
                new_alert.kind, source_type, new_alert.source_id, existing.id
            );
            return Ok(DispatchOutcome::Skipped(SkipReason::Duplicate));
        }

        let alert = self
            .alert_repository
            .insert_alert(new_alert)
            .await
            .map_err(|e| {
                error!("Failed to store alert: {}", e);
                e
            })?;

        self.event_sink.emit(DomainEvent::alert_created(&alert));
        Ok(DispatchOutcome::Created(alert))
    }

    fn list_alerts(&self, owner_id: &str, unread_only: bool) -> Result<Vec<Alert>> {
        self.alert_repository.list_alerts(owner_id, unread_only)
    }

    async fn mark_alert_read(&self, alert_id: &str, owner_id: &str) -> Result<Alert> {
        let alert = self.owned_alert(alert_id, owner_id)?;
        if alert.read {
            return Ok(alert);
        }
        self.alert_repository.mark_read(alert_id).await
    }

    async fn delete_alert(&self, alert_id: &str, owner_id: &str) -> Result<()> {
        self.owned_alert(alert_id, owner_id)?;
        self.alert_repository.delete_alert(alert_id).await
    }
}
