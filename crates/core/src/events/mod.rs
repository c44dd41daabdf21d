//! Domain events module.
//!
//! Provides domain event types and the sink trait for emitting events
//! after successful engine mutations. Runtime adapters implement the sink to
//! forward events to notification channels or logs.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
