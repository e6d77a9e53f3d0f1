use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // FULFILLMENT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Fulfillment invocations by flow
    pub static ref FULFILLMENTS_STARTED: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_fulfillments_started_total",
        "Total number of fulfillment invocations",
        &["flow"]
    )
    .expect("fulfillments_started metric registers once");

    /// How each pipeline run ended
    pub static ref PIPELINE_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_pipeline_outcomes_total",
        "Pipeline runs by flow and outcome",
        &["flow", "outcome"]
    )
    .expect("pipeline_outcomes metric registers once");

    /// Fulfillments that raised an error
    pub static ref FULFILLMENT_FAILURES: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_fulfillment_failures_total",
        "Fulfillment invocations that raised an error",
        &["flow"]
    )
    .expect("fulfillment_failures metric registers once");

    /// Fulfillments currently running in this process
    pub static ref ACTIVE_FULFILLMENTS: IntGauge = register_int_gauge!(
        "cloud_orders_fulfillments_active",
        "Current number of running fulfillments"
    )
    .expect("fulfillments_active metric registers once");

    /// Invocation duration histogram (in milliseconds)
    pub static ref FULFILLMENT_DURATION: HistogramVec = register_histogram_vec!(
        "cloud_orders_fulfillment_duration_ms",
        "Fulfillment invocation duration in milliseconds",
        &["flow"],
        vec![50.0, 100.0, 500.0, 1000.0, 5000.0, 15000.0, 60000.0]
    )
    .expect("fulfillment_duration metric registers once");

    // ═══════════════════════════════════════════════════════════════════════════
    // STEP METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Step results by step name and outcome
    pub static ref STEP_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_step_outcomes_total",
        "Step invocations by step and outcome",
        &["step", "outcome"]
    )
    .expect("step_outcomes metric registers once");

    /// Persisted phase advances
    pub static ref PHASE_ADVANCES: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_phase_advances_total",
        "Phase advances by flow and target phase",
        &["flow", "phase"]
    )
    .expect("phase_advances metric registers once");

    /// Orders moved to Querying
    pub static ref ORDERS_QUERIED: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_orders_queried_total",
        "Orders diverted to Querying by flow and error id",
        &["flow", "error_id"]
    )
    .expect("orders_queried metric registers once");

    // ═══════════════════════════════════════════════════════════════════════════
    // PROVIDER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Account-level provider operations
    pub static ref ACCOUNT_OPERATIONS: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_account_operations_total",
        "Cloud account operations by operation and result",
        &["operation", "result"]
    )
    .expect("account_operations metric registers once");

    /// Error-level log events by error type
    pub static ref ERROR_EVENTS: IntCounterVec = register_int_counter_vec!(
        "cloud_orders_error_events_total",
        "Error-level events by error type",
        &["error_type"]
    )
    .expect("error_events metric registers once");
}
