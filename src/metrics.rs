//! Prometheus metrics for routing decisions
//!
//! Tracks decision counts by tier, mode, and override kind, fallback
//! resolutions, ledger append failures, and classification latency. The
//! host exposes [`Metrics::gather`] output on its metrics endpoint.

use crate::registry::Mode;
use crate::router::RoutingDecision;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Metrics collector for the routing core
///
/// Label values come from closed enums (tier, mode, override kind), so
/// cardinality is bounded at 3 tiers x 3 modes x 8 override kinds.
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    decisions_total: IntCounterVec,
    fallbacks_total: IntCounter,
    ledger_append_failures: IntCounter,
    classification_duration: Histogram,
}

impl Metrics {
    /// Create a collector and register every metric with a fresh registry
    ///
    /// # Errors
    /// Returns an error if metric registration fails (e.g. duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions_total = IntCounterVec::new(
            Opts::new(
                "thriftroute_decisions_total",
                "Total routing decisions by tier, mode, and override kind",
            ),
            &["tier", "mode", "override"],
        )?;

        let fallbacks_total = IntCounter::with_opts(Opts::new(
            "thriftroute_fallbacks_total",
            "Total decisions resolved by cheapest-configured fallback",
        ))?;

        let ledger_append_failures = IntCounter::with_opts(Opts::new(
            "thriftroute_ledger_append_failures_total",
            "Total decisions made but not recorded because the ledger append failed",
        ))?;

        // Classification is bounded to sub-millisecond latency, so the
        // buckets concentrate below 1ms
        let classification_duration = Histogram::with_opts(
            HistogramOpts::new(
                "thriftroute_classification_duration_ms",
                "Classification latency in milliseconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
        )?;

        registry.register(Box::new(decisions_total.clone()))?;
        registry.register(Box::new(fallbacks_total.clone()))?;
        registry.register(Box::new(ledger_append_failures.clone()))?;
        registry.register(Box::new(classification_duration.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            decisions_total,
            fallbacks_total,
            ledger_append_failures,
            classification_duration,
        })
    }

    /// Record one routing decision
    ///
    /// Fallback resolutions are detected through the documented "Fallback"
    /// substring contract on the reasoning string.
    ///
    /// # Errors
    /// Returns an error if the label lookup fails.
    pub fn record_decision(
        &self,
        decision: &RoutingDecision,
        mode: Mode,
    ) -> Result<(), prometheus::Error> {
        self.decisions_total
            .get_metric_with_label_values(&[
                decision.tier.as_str(),
                mode.as_str(),
                decision.override_kind.as_str(),
            ])?
            .inc();
        if decision.reasoning.contains("Fallback") {
            self.fallbacks_total.inc();
        }
        Ok(())
    }

    /// Record classification latency
    ///
    /// # Errors
    /// Returns an error if `duration_ms` is NaN, infinite, or negative;
    /// such values corrupt histogram percentiles.
    pub fn record_classification_duration(
        &self,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite and non-negative, got: {}",
                duration_ms
            )));
        }
        self.classification_duration.observe(duration_ms);
        Ok(())
    }

    /// Record a ledger append failure
    pub fn record_ledger_append_failure(&self) {
        self.ledger_append_failures.inc();
    }

    /// Encode all registered metrics in Prometheus text format
    ///
    /// # Errors
    /// Returns an error if encoding fails or produces invalid UTF-8.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("Metrics are not valid UTF-8: {}", e)))
    }
}
