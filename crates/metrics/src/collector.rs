use std::time::Duration;

use cloud_orders_types::{Flow, Phase};
use prometheus::{Encoder, TextEncoder};

use crate::metrics::*;

/// Label used when the flow of a failed order could not be determined
const UNKNOWN_FLOW: &str = "unknown";

/// Metrics collector for the cloud order fulfillment engine
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    /// Create a new metrics collector backed by the default registry
    pub fn new() -> Self {
        Self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FULFILLMENT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record a fulfillment invocation starting
    pub fn record_fulfillment_started(&self, flow: Flow) {
        FULFILLMENTS_STARTED.with_label_values(&[flow.as_str()]).inc();
        ACTIVE_FULFILLMENTS.inc();
    }

    /// Record a fulfillment invocation ending, however it ended
    pub fn record_fulfillment_finished(&self, flow: Flow, outcome: RunOutcome, duration: Duration) {
        PIPELINE_OUTCOMES
            .with_label_values(&[flow.as_str(), outcome.as_str()])
            .inc();
        FULFILLMENT_DURATION
            .with_label_values(&[flow.as_str()])
            .observe(duration.as_millis() as f64);
        ACTIVE_FULFILLMENTS.dec();
    }

    /// Record an error escaping fulfillment
    pub fn record_failure(&self, flow: Option<Flow>) {
        let label = flow.map_or(UNKNOWN_FLOW, |flow| flow.as_str());
        FULFILLMENT_FAILURES.with_label_values(&[label]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STEP METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record what a step returned
    pub fn record_step(&self, step: &str, outcome: &str) {
        STEP_OUTCOMES.with_label_values(&[step, outcome]).inc();
    }

    pub fn record_phase_advance(&self, flow: Flow, to: Phase) {
        PHASE_ADVANCES
            .with_label_values(&[flow.as_str(), to.as_str()])
            .inc();
    }

    /// Record an order diverted to Querying
    pub fn record_querying(&self, flow: Flow, error_id: &str) {
        ORDERS_QUERIED
            .with_label_values(&[flow.as_str(), error_id])
            .inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Record an account-level provider call
    pub fn record_account_operation(&self, operation: &str, success: bool) {
        let result = if success { "success" } else { "error" };
        ACCOUNT_OPERATIONS
            .with_label_values(&[operation, result])
            .inc();
    }

    pub fn record_error_event(&self, error_type: &str) {
        ERROR_EVENTS.with_label_values(&[error_type]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

/// How a fulfillment invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step continued
    Completed,
    /// A step stopped the run to be resumed on a later poll
    Halted,
    /// The order now waits for buyer input
    Querying,
    /// An error escaped
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Halted => "halted",
            RunOutcome::Querying => "querying",
            RunOutcome::Failed => "failed",
        }
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}
