//! Fulfillment steps.
//!
//! Every step re-reads the order on each poll and decides for itself
//! whether it has work to do; most key that decision on the persisted
//! phase.

mod account;
mod complete;
mod invitations;
mod onboarding;
mod organization;
mod setup;
mod subscriptions;
mod termination;
mod tickets;
mod transfer;

pub use account::CreateLinkedAccount;
pub use complete::CompleteOrder;
pub use invitations::{reconcile_invitations, AwaitInvitationLinks, InvitationPlan, SendInvitationLinks};
pub use onboarding::CcpOnboard;
pub use organization::ConfigureOrganization;
pub use setup::SetupContext;
pub use subscriptions::CreateSubscriptions;
pub use termination::TerminateAccounts;
pub use tickets::{
    AwaitTerminationTicket, AwaitTransferTicket, CreateTerminationTicket, CreateTransferTicket,
};
pub use transfer::{ValidateTransferRequest, VerifyTransferredAccounts};

use cloud_orders_types::Phase;

use crate::{FulfillmentError, OrderContext};

/// Whether the order currently sits in `phase`
pub(crate) fn in_phase(ctx: &OrderContext, phase: Phase) -> Result<bool, FulfillmentError> {
    Ok(ctx.phase()? == phase)
}
