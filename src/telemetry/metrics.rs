//! Prometheus metric definitions and text exposition.
//!
//! Definitions only — dashboards and alerting rules live outside this
//! crate. One [`Metrics`] instance is created once per process and shared
//! behind an `Arc` by both controllers and the host agent.

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    pub reconcile_total: IntCounterVec,
    pub reconcile_duration: HistogramVec,
    pub cache_hits: IntCounterVec,
    pub fetch_duration: Histogram,
    pub in_flight_downloads: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let reconcile_total = IntCounterVec::new(
            prometheus::Opts::new(
                "llmkube_reconcile_total",
                "Reconciles completed, labeled by controller and outcome",
            ),
            &["controller", "outcome"],
        )
        .expect("metric definition is well-formed");

        let reconcile_duration = HistogramVec::new(
            HistogramOpts::new(
                "llmkube_reconcile_duration_seconds",
                "Time spent in one reconcile, labeled by controller",
            ),
            &["controller"],
        )
        .expect("metric definition is well-formed");

        let cache_hits = IntCounterVec::new(
            prometheus::Opts::new(
                "llmkube_cache_lookup_total",
                "Cache resolve() calls, labeled by hit/miss",
            ),
            &["result"],
        )
        .expect("metric definition is well-formed");

        let fetch_duration = Histogram::with_opts(HistogramOpts::new(
            "llmkube_fetch_duration_seconds",
            "Time spent fetching a model artifact",
        ))
        .expect("metric definition is well-formed");

        let in_flight_downloads = IntGauge::new(
            "llmkube_in_flight_downloads",
            "Number of artifact fetches currently in progress",
        )
        .expect("metric definition is well-formed");

        registry.register(Box::new(reconcile_total.clone())).unwrap();
        registry.register(Box::new(reconcile_duration.clone())).unwrap();
        registry.register(Box::new(cache_hits.clone())).unwrap();
        registry.register(Box::new(fetch_duration.clone())).unwrap();
        registry.register(Box::new(in_flight_downloads.clone())).unwrap();

        Self {
            registry,
            reconcile_total,
            reconcile_duration,
            cache_hits,
            fetch_duration,
            in_flight_downloads,
        }
    }

    pub fn record_reconcile(&self, controller: &str, outcome: &str, duration_secs: f64) {
        self.reconcile_total.with_label_values(&[controller, outcome]).inc();
        self.reconcile_duration.with_label_values(&[controller]).observe(duration_secs);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        let label = if hit { "hit" } else { "miss" };
        self.cache_hits.with_label_values(&[label]).inc();
    }

    /// Render the current snapshot in Prometheus text exposition format.
    pub fn encode_text(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder.encode(&families, &mut buffer).expect("text encoding never fails for well-formed metrics");
        String::from_utf8(buffer).expect("prometheus text encoder always emits UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_exposition_includes_known_metric_names() {
        let metrics = Metrics::new();
        metrics.record_reconcile("model", "success", 0.5);
        metrics.record_cache_lookup(true);
        let text = metrics.encode_text();
        assert!(text.contains("llmkube_reconcile_total"));
        assert!(text.contains("llmkube_cache_lookup_total"));
    }
}
