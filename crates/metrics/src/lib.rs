//! Metrics and monitoring for the cloud order fulfillment engine
//!
//! This crate provides metrics collection and tracing setup for tracking
//! fulfillment runs, step outcomes, phase advances and provider calls.
//!
//! # Features
//!
//! - Prometheus metrics exposition
//! - Tracing initialisation from configuration (plain or JSON output)
//! - Correlation IDs and per-order fulfillment spans
//!
//! # Example
//!
//! ```no_run
//! use cloud_orders_config::LoggingConfig;
//! use cloud_orders_metrics::{init_tracing_with_metrics, MetricsCollector};
//! use std::sync::Arc;
//!
//! let collector = Arc::new(MetricsCollector::new());
//! init_tracing_with_metrics(&LoggingConfig::default(), collector.clone()).unwrap();
//!
//! println!("{}", collector.export_metrics().unwrap());
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError, RunOutcome};
pub use crate::tracing::{
    init_tracing, init_tracing_with_metrics, CorrelationId, FulfillmentSpan, MetricsLayer,
    TracingError,
};
