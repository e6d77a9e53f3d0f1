//! Value types exchanged with the cloud-provider control plane

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Membership status of an account in an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    PendingClosure,
}

/// Account as listed by the management account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub status: AccountStatus,
}

impl Account {
    pub fn new(id: impl Into<String>, status: AccountStatus) -> Self {
        Self {
            id: id.into(),
            status,
        }
    }
}

/// State of an asynchronous linked-account creation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCreationState {
    InProgress,
    Succeeded,
    Failed,
}

/// Provider-reported failure causes for account creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountCreationFailure {
    EmailAlreadyExists,
    InvalidEmail,
    AccountLimitExceeded,
    ConcurrentAccountModification,
    InternalFailure,
    #[serde(untagged)]
    Other(String),
}

impl AccountCreationFailure {
    /// Failures the buyer can fix by editing ordering parameters
    pub fn is_buyer_recoverable(&self) -> bool {
        matches!(
            self,
            AccountCreationFailure::EmailAlreadyExists | AccountCreationFailure::InvalidEmail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreationStatus {
    pub request_id: String,
    pub state: AccountCreationState,

    /// Set once the request succeeded
    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub failure_reason: Option<AccountCreationFailure>,
}

/// State of an organization-membership invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandshakeState {
    Requested,
    Open,
    Canceled,
    Accepted,
    Declined,
    Expired,
}

impl HandshakeState {
    /// Invitation still alive from the seller's point of view
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            HandshakeState::Requested | HandshakeState::Open | HandshakeState::Accepted
        )
    }

    pub fn is_cancellable(&self) -> bool {
        matches!(self, HandshakeState::Requested | HandshakeState::Open)
    }
}

/// Provider record of an outstanding organization invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub id: String,
    pub state: HandshakeState,
    pub target_account_id: String,
}

impl Handshake {
    pub fn new(
        id: impl Into<String>,
        state: HandshakeState,
        target_account_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            state,
            target_account_id: target_account_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub master_account_id: String,
}

/// Resource tags, ordered for deterministic requests
pub type Tags = BTreeMap<String, String>;

/// Classified reason a provider rejected an account operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintReason {
    /// Account is too young to be closed or removed
    CoolOffPeriod,
    /// Account lacks what it needs to stand alone (payment method, contact info)
    MissingPrerequisites,
    /// Provider-wide close/remove quota exhausted
    QuotaExceeded,
    Other(String),
}

impl std::fmt::Display for ConstraintReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstraintReason::CoolOffPeriod => f.write_str("cool-off period"),
            ConstraintReason::MissingPrerequisites => f.write_str("missing prerequisites"),
            ConstraintReason::QuotaExceeded => f.write_str("quota exceeded"),
            ConstraintReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// Vendor onboarding progress for a master account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnboardingStatus {
    Running,
    Succeeded,
    Failed,
}
