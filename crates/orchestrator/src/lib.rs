//! Fulfillment engine for cloud-account orders.
//!
//! An order is fulfilled over many invocations. Each invocation builds an
//! [`OrderContext`] from the stored order, runs the [`Pipeline`] for its
//! flow until a step halts or diverts the order to Querying, and returns.
//! Progress survives between invocations only as the order's persisted
//! phase and fulfillment parameters.

pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod flows;
pub mod fulfillment;
pub mod pipeline;
pub mod report;
pub mod step;
pub mod steps;

#[cfg(test)]
mod testing;

#[cfg(test)]
mod tests;

pub use clients::Clients;
pub use config::FulfillmentConfig;
pub use context::{parse_account_ids, OrderContext};
pub use error::{ContextError, FulfillmentError, PipelineError};
pub use flows::pipeline_for;
pub use fulfillment::Fulfiller;
pub use pipeline::Pipeline;
pub use report::{failure_trace, redact_trace_ids};
pub use step::{Step, StepOutcome};
