//! ## funnelsim-telemetry::metrics
//! **Prometheus counters and histograms for generated events**

use std::collections::HashMap;

use funnelsim_core::{Event, EventType};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub events_total: IntCounterVec,
    pub journey_events: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let events_total = IntCounterVec::new(
            Opts::new("funnelsim_events_total", "Generated events by type"),
            &["event_type"],
        )?;
        let journey_events = Histogram::with_opts(
            HistogramOpts::new("funnelsim_journey_events", "Events emitted per user journey")
                .buckets(vec![2.0, 4.0, 8.0, 16.0, 32.0]),
        )?;

        registry.register(Box::new(events_total.clone()))?;
        registry.register(Box::new(journey_events.clone()))?;

        Ok(Self {
            registry,
            events_total,
            journey_events,
        })
    }

    /// Counts a run's events by type and observes each user's journey length.
    pub fn record_events(&self, events: &[Event]) {
        let mut per_user: HashMap<&str, u64> = HashMap::new();
        for event in events {
            self.inc_event(event.event_type);
            *per_user.entry(event.user_id.as_str()).or_insert(0) += 1;
        }
        for count in per_user.values() {
            self.journey_events.observe(*count as f64);
        }
    }

    pub fn inc_event(&self, event_type: EventType) {
        self.events_total
            .with_label_values(&[event_type.as_str()])
            .inc();
    }

    pub fn event_count(&self, event_type: EventType) -> u64 {
        self.events_total
            .with_label_values(&[event_type.as_str()])
            .get()
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
