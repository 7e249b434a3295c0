//! Prometheus metrics for the fedchain node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] holding counters for message
//! intake and block persistence, plus gauges for queue depth and halted
//! chains. [`NodeMetrics::encode_text`] renders the Prometheus text format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Raw messages handed to the processor.
    pub messages_received: IntCounter,
    pub decode_failures: IntCounter,
    pub messages_valid: IntCounter,
    pub messages_invalid: IntCounter,
    /// Messages parked because the signer set was not yet known.
    pub messages_deferred: IntCounter,
    /// Deferred messages dropped to make room for newer ones.
    pub deferred_evicted: IntCounter,
    pub faults_executed: IntCounter,
    pub blocks_persisted: IntCounter,
    pub storage_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub deferred_queue_len: IntGauge,
    pub halted_chains: IntGauge,
    /// Distinct fault tuples with at least one recorded signature.
    pub pending_fault_tuples: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time spent processing one message batch, in milliseconds.
    pub batch_process_time_ms: Histogram,
}

impl NodeMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_received = register_int_counter_with_registry!(
            Opts::new("fedchain_messages_received_total", "Raw messages received"),
            registry
        )
        .expect("failed to register messages_received counter");

        let decode_failures = register_int_counter_with_registry!(
            Opts::new(
                "fedchain_decode_failures_total",
                "Messages that failed to decode"
            ),
            registry
        )
        .expect("failed to register decode_failures counter");

        let messages_valid = register_int_counter_with_registry!(
            Opts::new("fedchain_messages_valid_total", "Messages validated as Valid"),
            registry
        )
        .expect("failed to register messages_valid counter");

        let messages_invalid = register_int_counter_with_registry!(
            Opts::new(
                "fedchain_messages_invalid_total",
                "Messages validated as Invalid"
            ),
            registry
        )
        .expect("failed to register messages_invalid counter");

        let messages_deferred = register_int_counter_with_registry!(
            Opts::new(
                "fedchain_messages_deferred_total",
                "Messages deferred pending the signer set"
            ),
            registry
        )
        .expect("failed to register messages_deferred counter");

        let deferred_evicted = register_int_counter_with_registry!(
            Opts::new(
                "fedchain_deferred_evicted_total",
                "Deferred messages evicted because the queue was full"
            ),
            registry
        )
        .expect("failed to register deferred_evicted counter");

        let faults_executed = register_int_counter_with_registry!(
            Opts::new(
                "fedchain_faults_executed_total",
                "Fault messages handed to the state machine"
            ),
            registry
        )
        .expect("failed to register faults_executed counter");

        let blocks_persisted = register_int_counter_with_registry!(
            Opts::new("fedchain_blocks_persisted_total", "Blocks written to storage"),
            registry
        )
        .expect("failed to register blocks_persisted counter");

        let storage_failures = register_int_counter_with_registry!(
            Opts::new(
                "fedchain_storage_failures_total",
                "Block writes that failed and halted their chain"
            ),
            registry
        )
        .expect("failed to register storage_failures counter");

        let deferred_queue_len = register_int_gauge_with_registry!(
            Opts::new("fedchain_deferred_queue_len", "Messages awaiting revalidation"),
            registry
        )
        .expect("failed to register deferred_queue_len gauge");

        let halted_chains = register_int_gauge_with_registry!(
            Opts::new("fedchain_halted_chains", "Chains halted after a storage failure"),
            registry
        )
        .expect("failed to register halted_chains gauge");

        let pending_fault_tuples = register_int_gauge_with_registry!(
            Opts::new(
                "fedchain_pending_fault_tuples",
                "Fault tuples with recorded signatures"
            ),
            registry
        )
        .expect("failed to register pending_fault_tuples gauge");

        let batch_process_time_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "fedchain_batch_process_time_ms",
                "Time spent processing one message batch in milliseconds"
            )
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0]),
            registry
        )
        .expect("failed to register batch_process_time_ms histogram");

        Self {
            registry,
            messages_received,
            decode_failures,
            messages_valid,
            messages_invalid,
            messages_deferred,
            deferred_evicted,
            faults_executed,
            blocks_persisted,
            storage_failures,
            deferred_queue_len,
            halted_chains,
            pending_fault_tuples,
            batch_process_time_ms,
        }
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn encode_text(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| NodeError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| NodeError::Metrics(e.to_string()))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_without_panic() {
        let m = NodeMetrics::new();
        m.messages_received.inc();
        m.halted_chains.set(2);
        m.batch_process_time_ms.observe(3.5);
        assert_eq!(m.messages_received.get(), 1);
        assert_eq!(m.halted_chains.get(), 2);
    }

    #[test]
    fn encode_text_contains_metric_names() {
        let m = NodeMetrics::new();
        m.blocks_persisted.inc_by(3);
        let text = m.encode_text().unwrap();
        assert!(text.contains("fedchain_blocks_persisted_total 3"));
        assert!(text.contains("fedchain_halted_chains"));
        assert!(text.contains("fedchain_batch_process_time_ms"));
    }

    #[test]
    fn separate_instances_have_separate_registries() {
        let a = NodeMetrics::new();
        let b = NodeMetrics::new();
        a.decode_failures.inc();
        assert_eq!(b.decode_failures.get(), 0);
    }
}
