//! Alerts module - alert models, the deduplicating dispatcher, and message
//! formatting shared by the evaluators.

mod alert_messages;
mod alerts_model;
mod alerts_service;
mod alerts_traits;

pub use alert_messages::*;
pub use alerts_model::{Alert, AlertKind, AlertSourceType, DispatchOutcome, NewAlert, SkipReason};
pub use alerts_service::AlertService;
pub use alerts_traits::{AlertRepositoryTrait, AlertServiceTrait};
