//! Domain events runtime bridge for the daemon.
//!
//! Services emit events through [`LoggingDomainEventSink`]; a queue worker
//! drains the channel and writes one structured log record per event.

mod queue_worker;
mod sink;

pub use queue_worker::event_queue_worker;
pub use sink::LoggingDomainEventSink;
