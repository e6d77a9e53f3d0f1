//! Step sequences for each flow

use cloud_orders_types::{Flow, Phase};

use crate::steps::{
    AwaitInvitationLinks, AwaitTerminationTicket, AwaitTransferTicket, CcpOnboard, CompleteOrder,
    ConfigureOrganization, CreateLinkedAccount, CreateSubscriptions, CreateTerminationTicket,
    CreateTransferTicket, SendInvitationLinks, SetupContext, TerminateAccounts,
    ValidateTransferRequest, VerifyTransferredAccounts,
};
use crate::{Pipeline, PipelineError, Step};

/// Build the pipeline for `flow`
pub fn pipeline_for(flow: Flow) -> Result<Pipeline, PipelineError> {
    let steps: Vec<Box<dyn Step>> = match flow {
        Flow::PurchaseNewAccount => vec![
            Box::new(SetupContext),
            Box::new(ConfigureOrganization),
            Box::new(CreateLinkedAccount::new()),
            Box::new(CreateSubscriptions),
            Box::new(CcpOnboard),
            Box::new(CompleteOrder),
        ],
        Flow::PurchaseTransferWithOrganization => vec![
            Box::new(SetupContext),
            Box::new(ValidateTransferRequest::new(&[
                Phase::PreconfigurationMpa,
                Phase::CreateAccount,
            ])),
            Box::new(CreateTransferTicket),
            Box::new(CreateLinkedAccount::optional()),
            Box::new(AwaitTransferTicket),
            Box::new(VerifyTransferredAccounts),
            Box::new(CreateSubscriptions),
            Box::new(CcpOnboard),
            Box::new(CompleteOrder),
        ],
        Flow::PurchaseTransferWithoutOrganization => vec![
            Box::new(SetupContext),
            Box::new(ValidateTransferRequest::new(&[
                Phase::PreconfigurationMpa,
                Phase::TransferAccount,
            ])),
            Box::new(ConfigureOrganization),
            Box::new(SendInvitationLinks),
            Box::new(AwaitInvitationLinks),
            Box::new(CreateSubscriptions),
            Box::new(CcpOnboard),
            Box::new(CompleteOrder),
        ],
        Flow::PurchaseSplitBilling => vec![
            Box::new(SetupContext),
            Box::new(ConfigureOrganization),
            Box::new(CreateSubscriptions),
            Box::new(CompleteOrder),
        ],
        Flow::Change => vec![
            Box::new(SetupContext),
            Box::new(CreateLinkedAccount::new()),
            Box::new(CreateSubscriptions),
            Box::new(CompleteOrder),
        ],
        Flow::Termination => vec![
            Box::new(SetupContext),
            Box::new(TerminateAccounts),
            Box::new(CreateTerminationTicket),
            Box::new(AwaitTerminationTicket),
            Box::new(CompleteOrder),
        ],
    };
    Pipeline::new(flow, steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_flow_builds() {
        for flow in Flow::ALL {
            let pipeline = pipeline_for(flow).unwrap();
            assert_eq!(pipeline.flow(), flow);
            assert_eq!(pipeline.step_names().first(), Some(&"setup_context"));
            assert_eq!(pipeline.step_names().last(), Some(&"complete_order"));
        }
    }

    #[test]
    fn test_optional_account_only_for_organization_transfer() {
        let names = pipeline_for(Flow::PurchaseTransferWithOrganization)
            .unwrap()
            .step_names();
        assert!(names.contains(&"create_linked_account_optional"));

        let names = pipeline_for(Flow::PurchaseNewAccount).unwrap().step_names();
        assert!(names.contains(&"create_linked_account"));
        assert!(!names.contains(&"create_linked_account_optional"));
    }
}
