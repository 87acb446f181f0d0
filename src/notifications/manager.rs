//! Event fan-out to sinks

use super::channels::EventSink;
use crate::scheduler::{EventStream, MonitorEvent};

/// Delivery counters returned when a notifier finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Events read from the stream
    pub events: u64,
    /// Successful sink deliveries
    pub delivered: u64,
    /// Failed sink deliveries
    pub failed: u64,
}

/// Drives an event stream into a list of sinks
#[derive(Default)]
pub struct Notifier {
    /// Registered sinks, called in registration order
    sinks: Vec<Box<dyn EventSink>>,
}

impl Notifier {
    /// Create a notifier without sinks
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Add a sink (builder style)
    pub fn with_sink(mut self, sink: Box<dyn EventSink>) -> Self {
        self.add_sink(sink);
        self
    }

    /// Add a sink
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Names of the registered sinks
    pub fn sink_names(&self) -> Vec<&str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Deliver one event to every sink
    pub async fn dispatch(&self, event: &MonitorEvent, stats: &mut DeliveryStats) {
        stats.events += 1;

        for sink in &self.sinks {
            match sink.deliver(event).await {
                Ok(()) => stats.delivered += 1,
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!(sink = sink.name(), event = event.name(), "Failed to deliver event: {}", e);
                }
            }
        }
    }

    /// Deliver events until the stream ends
    pub async fn run(self, mut events: EventStream) -> DeliveryStats {
        let mut stats = DeliveryStats::default();

        while let Some(event) = events.recv().await {
            self.dispatch(&event, &mut stats).await;
        }

        tracing::debug!(
            events = stats.events,
            delivered = stats.delivered,
            failed = stats.failed,
            "Event stream closed"
        );
        stats
    }
}
