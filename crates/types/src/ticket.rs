use serde::{Deserialize, Serialize};

/// What a service ticket asks the operations team to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceRequestKind {
    /// Move a buyer's organization under the seller's billing
    TransferOrganization,
    /// Finish decommissioning terminated accounts
    TerminateAccounts,
}

/// Service ticket to open for an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub kind: ServiceRequestKind,
    pub service_type: String,
    pub summary: String,
    pub additional_info: String,
}

/// Ticket reference returned by the ticketing API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,

    /// Free-form workflow state, compared against the configured resolved value
    pub state: String,
}
