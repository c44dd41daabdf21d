use async_trait::async_trait;

use crate::alerts::{Alert, AlertSourceType, DispatchOutcome, NewAlert};
use crate::errors::Result;

/// Trait for alert repository operations
#[async_trait]
pub trait AlertRepositoryTrait: Send + Sync {
    fn get_alert(&self, alert_id: &str) -> Result<Alert>;

    fn list_alerts(&self, owner_id: &str, unread_only: bool) -> Result<Vec<Alert>>;

    /// Unread alerts of any kind raised by the given source.
    fn find_unread_by_source(
        &self,
        source_type: AlertSourceType,
        source_id: &str,
    ) -> Result<Vec<Alert>>;

    async fn insert_alert(&self, new_alert: NewAlert) -> Result<Alert>;

    async fn mark_read(&self, alert_id: &str) -> Result<Alert>;

    async fn delete_alert(&self, alert_id: &str) -> Result<()>;
}

/// Trait for alert service operations
#[async_trait]
pub trait AlertServiceTrait: Send + Sync {
    /// Creates the alert unless an unread alert of the same kind already
    /// exists for the same source.
    async fn dispatch(&self, new_alert: NewAlert) -> Result<DispatchOutcome>;

    fn list_alerts(&self, owner_id: &str, unread_only: bool) -> Result<Vec<Alert>>;

    async fn mark_alert_read(&self, alert_id: &str, owner_id: &str) -> Result<Alert>;

    async fn delete_alert(&self, alert_id: &str, owner_id: &str) -> Result<()>;
}
