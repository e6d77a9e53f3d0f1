use cloud_orders_connectors::{CloudError, NotifyError, OnboardingError, StoreError, TicketError};
use cloud_orders_types::{Flow, Phase, PhaseError, UnknownPhase};
use thiserror::Error;

/// Raw order payload could not be turned into a context
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("order payload is not a JSON object")]
    NotAnObject,

    #[error("order payload has no {0}")]
    MissingField(&'static str),

    #[error("order payload field {field} is malformed: {source}")]
    Malformed {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored phase is invalid: {0}")]
    UnknownPhase(#[from] UnknownPhase),
}

/// Pipeline assembled from steps that do not belong to its flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("step {step} acts in phase {phase}, which the {flow} flow never enters")]
    ForeignPhase {
        flow: Flow,
        step: &'static str,
        phase: Phase,
    },
}

/// Anything that aborts a fulfillment invocation
#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("order storage error: {0}")]
    Store(#[from] StoreError),

    #[error("cloud provider error: {0}")]
    Cloud(#[from] CloudError),

    #[error("ticketing error: {0}")]
    Ticket(#[from] TicketError),

    #[error("onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("invalid order: {0}")]
    Context(#[from] ContextError),

    #[error("phase error: {0}")]
    Phase(#[from] PhaseError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Order type or sub-type no pipeline exists for
    #[error("unsupported order {order_id}: {reason}")]
    UnsupportedOrder { order_id: String, reason: String },

    /// A parameter earlier steps guarantee is absent
    #[error("order {order_id} is missing required parameter {parameter}")]
    MissingParameter {
        order_id: String,
        parameter: &'static str,
    },

    #[error("order {order_id} has no master account to act on")]
    MissingMasterAccount { order_id: String },

    #[error("vendor onboarding {engagement_id} failed")]
    OnboardingFailed { engagement_id: String },
}

impl FulfillmentError {
    pub fn missing_parameter(order_id: &str, parameter: &'static str) -> Self {
        FulfillmentError::MissingParameter {
            order_id: order_id.to_string(),
            parameter,
        }
    }
}
