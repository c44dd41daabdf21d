use tokio::sync::mpsc;

use spendwatch_core::events::{DomainEvent, DomainEventSink};

/// Forwards events to the queue worker without blocking the emitting service.
#[derive(Clone)]
pub struct LoggingDomainEventSink {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl LoggingDomainEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DomainEventSink for LoggingDomainEventSink {
    fn emit(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Domain event dropped: queue worker is not running");
        }
    }
}
