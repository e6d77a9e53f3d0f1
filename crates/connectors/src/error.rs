use cloud_orders_types::ConstraintReason;
use thiserror::Error;

/// Order-storage API failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("order not found: {0}")]
    NotFound(String),

    /// Non-success response; `body` is the machine-readable error payload
    #[error("order storage returned {status}: {body}")]
    Api {
        status: u16,
        body: serde_json::Value,
    },

    #[error("malformed order payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Cloud-provider control-plane failure
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    /// Provider refused an account operation for a classified reason
    #[error("constraint violation ({reason}): {message}")]
    ConstraintViolation {
        reason: ConstraintReason,
        message: String,
    },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("handshake not found: {0}")]
    HandshakeNotFound(String),

    #[error("account creation request not found: {0}")]
    RequestNotFound(String),

    #[error("cloud API error {code}: {message}")]
    Api { code: String, message: String },
}

impl CloudError {
    pub fn constraint(reason: ConstraintReason, message: impl Into<String>) -> Self {
        CloudError::ConstraintViolation {
            reason,
            message: message.into(),
        }
    }

    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::Api {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn constraint_reason(&self) -> Option<&ConstraintReason> {
        match self {
            CloudError::ConstraintViolation { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("ticket not found: {0}")]
    NotFound(String),

    #[error("ticketing API error {status}: {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("onboarding engagement not found: {0}")]
    NotFound(String),

    #[error("onboarding API error: {0}")]
    Api(String),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
