use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::OrderType;

/// Persisted fulfillment checkpoint.
///
/// Stored as the `phase` fulfillment parameter; the string forms are part
/// of the order-storage schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "preConfigurationMPA")]
    PreconfigurationMpa,
    #[serde(rename = "createAccount")]
    CreateAccount,
    #[serde(rename = "transferAccount")]
    TransferAccount,
    #[serde(rename = "checkInvitationLink")]
    CheckInvitationLink,
    #[serde(rename = "createSubscriptions")]
    CreateSubscriptions,
    #[serde(rename = "ccpOnboard")]
    CcpOnboard,
    #[serde(rename = "terminateAccount")]
    TerminateAccount,
    #[serde(rename = "completed")]
    Completed,
}

impl Phase {
    pub const ALL: [Phase; 8] = [
        Phase::PreconfigurationMpa,
        Phase::CreateAccount,
        Phase::TransferAccount,
        Phase::CheckInvitationLink,
        Phase::CreateSubscriptions,
        Phase::CcpOnboard,
        Phase::TerminateAccount,
        Phase::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::PreconfigurationMpa => "preConfigurationMPA",
            Phase::CreateAccount => "createAccount",
            Phase::TransferAccount => "transferAccount",
            Phase::CheckInvitationLink => "checkInvitationLink",
            Phase::CreateSubscriptions => "createSubscriptions",
            Phase::CcpOnboard => "ccpOnboard",
            Phase::TerminateAccount => "terminateAccount",
            Phase::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase: {0}")]
pub struct UnknownPhase(pub String);

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .iter()
            .copied()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| UnknownPhase(s.to_string()))
    }
}

/// Order sub-type a pipeline and phase table are selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flow {
    PurchaseNewAccount,
    PurchaseTransferWithOrganization,
    PurchaseTransferWithoutOrganization,
    PurchaseSplitBilling,
    Change,
    Termination,
}

impl Flow {
    pub const ALL: [Flow; 6] = [
        Flow::PurchaseNewAccount,
        Flow::PurchaseTransferWithOrganization,
        Flow::PurchaseTransferWithoutOrganization,
        Flow::PurchaseSplitBilling,
        Flow::Change,
        Flow::Termination,
    ];

    pub fn order_type(&self) -> OrderType {
        match self {
            Flow::PurchaseNewAccount
            | Flow::PurchaseTransferWithOrganization
            | Flow::PurchaseTransferWithoutOrganization
            | Flow::PurchaseSplitBilling => OrderType::Purchase,
            Flow::Change => OrderType::Change,
            Flow::Termination => OrderType::Termination,
        }
    }

    /// Short label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::PurchaseNewAccount => "purchase_new_account",
            Flow::PurchaseTransferWithOrganization => "purchase_transfer_with_organization",
            Flow::PurchaseTransferWithoutOrganization => "purchase_transfer_without_organization",
            Flow::PurchaseSplitBilling => "purchase_split_billing",
            Flow::Change => "change",
            Flow::Termination => "termination",
        }
    }

    pub fn phases(&self) -> PhaseTable {
        let sequence: &'static [Phase] = match self {
            Flow::PurchaseNewAccount => &[
                Phase::PreconfigurationMpa,
                Phase::CreateAccount,
                Phase::CreateSubscriptions,
                Phase::CcpOnboard,
                Phase::Completed,
            ],
            Flow::PurchaseTransferWithOrganization => &[
                Phase::PreconfigurationMpa,
                Phase::CreateAccount,
                Phase::CheckInvitationLink,
                Phase::CreateSubscriptions,
                Phase::CcpOnboard,
                Phase::Completed,
            ],
            Flow::PurchaseTransferWithoutOrganization => &[
                Phase::PreconfigurationMpa,
                Phase::TransferAccount,
                Phase::CreateSubscriptions,
                Phase::CcpOnboard,
                Phase::Completed,
            ],
            Flow::PurchaseSplitBilling => &[
                Phase::PreconfigurationMpa,
                Phase::CreateSubscriptions,
                Phase::Completed,
            ],
            Flow::Change => &[
                Phase::CreateAccount,
                Phase::CreateSubscriptions,
                Phase::Completed,
            ],
            Flow::Termination => &[Phase::TerminateAccount, Phase::Completed],
        };
        PhaseTable { flow: *self, sequence }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase transition errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("phase {phase} is not part of the {flow} flow")]
    NotInFlow { flow: Flow, phase: Phase },

    #[error("{flow} flow cannot move from {from} to {to}")]
    IllegalTransition { flow: Flow, from: Phase, to: Phase },

    #[error("{flow} flow has no phase after {from}")]
    NoSuccessor { flow: Flow, from: Phase },
}

/// Ordered, flow-specific phase sequence.
///
/// Transitions are only allowed to the immediate successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTable {
    flow: Flow,
    sequence: &'static [Phase],
}

impl PhaseTable {
    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn sequence(&self) -> &'static [Phase] {
        self.sequence
    }

    /// Phase an order starts in before anything is persisted
    pub fn initial(&self) -> Phase {
        self.sequence[0]
    }

    pub fn contains(&self, phase: Phase) -> bool {
        self.sequence.contains(&phase)
    }

    pub fn position(&self, phase: Phase) -> Option<usize> {
        self.sequence.iter().position(|p| *p == phase)
    }

    pub fn successor(&self, from: Phase) -> Result<Phase, PhaseError> {
        let index = self.position(from).ok_or(PhaseError::NotInFlow {
            flow: self.flow,
            phase: from,
        })?;
        self.sequence
            .get(index + 1)
            .copied()
            .ok_or(PhaseError::NoSuccessor {
                flow: self.flow,
                from,
            })
    }

    /// Check that `from -> to` is a single forward step
    pub fn check_transition(&self, from: Phase, to: Phase) -> Result<(), PhaseError> {
        if !self.contains(to) {
            return Err(PhaseError::NotInFlow {
                flow: self.flow,
                phase: to,
            });
        }
        if self.successor(from)? != to {
            return Err(PhaseError::IllegalTransition {
                flow: self.flow,
                from,
                to,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_string_roundtrip_matches_schema() {
        assert_eq!(Phase::PreconfigurationMpa.as_str(), "preConfigurationMPA");
        assert_eq!("ccpOnboard".parse::<Phase>().unwrap(), Phase::CcpOnboard);
        assert!("CCPOnboard".parse::<Phase>().is_err());

        let json = serde_json::to_string(&Phase::CheckInvitationLink).unwrap();
        assert_eq!(json, "\"checkInvitationLink\"");
    }

    #[test]
    fn test_every_flow_ends_completed() {
        for flow in Flow::ALL {
            let table = flow.phases();
            assert_eq!(*table.sequence().last().unwrap(), Phase::Completed);
        }
    }

    #[test]
    fn test_successor_walks_sequence() {
        let table = Flow::PurchaseTransferWithoutOrganization.phases();
        assert_eq!(table.initial(), Phase::PreconfigurationMpa);
        assert_eq!(
            table.successor(Phase::PreconfigurationMpa).unwrap(),
            Phase::TransferAccount
        );
        assert_eq!(
            table.successor(Phase::TransferAccount).unwrap(),
            Phase::CreateSubscriptions
        );
        assert!(matches!(
            table.successor(Phase::Completed),
            Err(PhaseError::NoSuccessor { .. })
        ));
    }

    #[test]
    fn test_organization_transfer_creates_account_before_checking_invitation() {
        let table = Flow::PurchaseTransferWithOrganization.phases();
        assert_eq!(
            table.successor(Phase::PreconfigurationMpa).unwrap(),
            Phase::CreateAccount
        );
        assert_eq!(
            table.successor(Phase::CreateAccount).unwrap(),
            Phase::CheckInvitationLink
        );
        assert_eq!(
            table.successor(Phase::CheckInvitationLink).unwrap(),
            Phase::CreateSubscriptions
        );
    }

    #[test]
    fn test_check_transition_rejects_skips_and_backwards() {
        let table = Flow::PurchaseNewAccount.phases();

        assert!(table
            .check_transition(Phase::CreateAccount, Phase::CreateSubscriptions)
            .is_ok());
        assert!(matches!(
            table.check_transition(Phase::CreateAccount, Phase::Completed),
            Err(PhaseError::IllegalTransition { .. })
        ));
        assert!(matches!(
            table.check_transition(Phase::CcpOnboard, Phase::CreateAccount),
            Err(PhaseError::IllegalTransition { .. })
        ));
        assert!(matches!(
            table.check_transition(Phase::CreateAccount, Phase::TransferAccount),
            Err(PhaseError::NotInFlow { .. })
        ));
    }

    #[test]
    fn test_flow_order_types() {
        assert_eq!(Flow::PurchaseSplitBilling.order_type(), OrderType::Purchase);
        assert_eq!(Flow::Change.order_type(), OrderType::Change);
        assert_eq!(Flow::Termination.order_type(), OrderType::Termination);
    }
}
