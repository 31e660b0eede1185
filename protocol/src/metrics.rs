//! # Prometheus Metrics
//!
//! Admission outcomes for the ante pipeline. The node scrapes these
//! alongside its own metrics; here we only own the handles and the
//! registry.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Holds all Prometheus metric handles for the admission pipeline.
///
/// Clone-friendly (prometheus handles are `Arc`s internally) so one
/// instance can be shared by every handler on every thread.
#[derive(Clone)]
pub struct AnteMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Transactions admitted, by chain.
    pub admitted_total: IntCounterVec,
    /// Transactions rejected, by chain and reason code.
    pub rejected_total: IntCounterVec,
    /// Gas consumed by admitted transactions during the ante pass.
    pub gas_consumed: Histogram,
}

impl AnteMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("nova".into()), None)?;

        let admitted_total = IntCounterVec::new(
            Opts::new(
                "ante_admitted_total",
                "Transactions that passed the admission pipeline",
            ),
            &["chain"],
        )?;
        registry.register(Box::new(admitted_total.clone()))?;

        let rejected_total = IntCounterVec::new(
            Opts::new(
                "ante_rejected_total",
                "Transactions rejected by the admission pipeline",
            ),
            &["chain", "reason"],
        )?;
        registry.register(Box::new(rejected_total.clone()))?;

        let gas_consumed = Histogram::with_opts(
            HistogramOpts::new(
                "ante_gas_consumed",
                "Gas consumed by the ante pass of admitted transactions",
            )
            .buckets(vec![
                1_000.0, 5_000.0, 10_000.0, 25_000.0, 50_000.0, 100_000.0, 250_000.0, 1_000_000.0,
            ]),
        )?;
        registry.register(Box::new(gas_consumed.clone()))?;

        Ok(Self {
            registry,
            admitted_total,
            rejected_total,
            gas_consumed,
        })
    }

    /// Record an admitted transaction.
    pub fn observe_admitted(&self, chain: &str, gas: u64) {
        self.admitted_total.with_label_values(&[chain]).inc();
        self.gas_consumed.observe(gas as f64);
    }

    /// Record a rejection. `reason` should be a stable code, not a message.
    pub fn observe_rejected(&self, chain: &str, reason: &str) {
        self.rejected_total
            .with_label_values(&[chain, reason])
            .inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
