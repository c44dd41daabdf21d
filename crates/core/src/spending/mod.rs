//! Spending module - keeps budget category spent amounts consistent with the
//! transaction ledger.
//!
//! Two write paths exist. Deltas are the hot path, applied once per
//! transaction event. Recompute re-sums the ledger and is the repair pass.
//! Both serialize on the same per-(budget, category) lock.

mod spending_model;
mod spending_service;
mod spending_traits;


pub use spending_model::{DeltaOutcome, SpendDelta, SpendEventKey, SpendEventKind};
pub use spending_service::SpendAggregator;
pub use spending_traits::SpendAggregatorTrait;
