use async_trait::async_trait;
use cloud_orders_types::{
    is_valid_account_id, param, AccountStatus, ParameterError, Phase,
    ERR_ACCOUNTS_NOT_TRANSFERRED, ERR_INVALID_ACCOUNT_ID, ERR_INVALID_MASTER_PAYER_ID,
    ERR_MISSING_PARAMETER, ERR_TOO_MANY_ACCOUNTS,
};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Checks the buyer's transfer inputs before anything is sent to the
/// provider
pub struct ValidateTransferRequest {
    phases: Vec<Phase>,
}

impl ValidateTransferRequest {
    /// Validate while the order is in one of `phases`
    pub fn new(phases: &[Phase]) -> Self {
        Self {
            phases: phases.to_vec(),
        }
    }

    fn errors(&self, clients: &Clients, ctx: &OrderContext) -> Vec<(&'static str, ParameterError)> {
        let mut errors = Vec::new();
        let targets = ctx.target_account_ids();

        if targets.is_empty() && !ctx.is_organization_transfer() {
            errors.push((param::ACCOUNT_ID, ParameterError::missing_parameter("Account ids")));
        } else if targets.len() > clients.config.max_target_accounts {
            errors.push((
                param::ACCOUNT_ID,
                ParameterError::too_many_accounts(targets.len(), clients.config.max_target_accounts),
            ));
        } else {
            let invalid: Vec<String> = targets
                .iter()
                .filter(|id| !is_valid_account_id(id))
                .cloned()
                .collect();
            if !invalid.is_empty() {
                errors.push((param::ACCOUNT_ID, ParameterError::invalid_account_ids(&invalid)));
            }
        }

        if ctx.is_organization_transfer() {
            match ctx.master_payer_id() {
                None => errors.push((
                    param::MASTER_PAYER_ID,
                    ParameterError::missing_parameter("Master payer id"),
                )),
                Some(id) if !is_valid_account_id(id) => errors.push((
                    param::MASTER_PAYER_ID,
                    ParameterError::invalid_master_payer_id(id),
                )),
                Some(_) => {}
            }
        }

        errors
    }
}

#[async_trait]
impl Step for ValidateTransferRequest {
    fn name(&self) -> &'static str {
        "validate_transfer_request"
    }

    fn phases(&self) -> &[Phase] {
        &self.phases
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !self.acts_in(ctx.phase()?) {
            return Ok(StepOutcome::Continue);
        }

        let errors = self.errors(clients, ctx);
        let Some((_, first)) = errors.first().cloned() else {
            ctx.resume_if_diverted_by(
                clients,
                &[
                    ERR_MISSING_PARAMETER,
                    ERR_TOO_MANY_ACCOUNTS,
                    ERR_INVALID_ACCOUNT_ID,
                    ERR_INVALID_MASTER_PAYER_ID,
                ],
            )
            .await?;
            return Ok(StepOutcome::Continue);
        };

        warn!(
            order_id = %ctx.order_id(),
            errors = errors.len(),
            error_id = %first.id,
            "Transfer request is invalid"
        );
        // Errors from an earlier divert go unless raised again
        let parameters = ctx.parameters_mut();
        for external_id in [param::ACCOUNT_ID, param::MASTER_PAYER_ID] {
            if parameters.ordering_error(external_id).is_some() {
                parameters.set_ordering_error(external_id, None);
            }
        }
        for (external_id, error) in errors {
            parameters.set_ordering_error(external_id, Some(error));
        }
        ctx.divert_to_querying(clients, first).await
    }
}

/// Confirms every named account is active in the transferred organization
pub struct VerifyTransferredAccounts;

#[async_trait]
impl Step for VerifyTransferredAccounts {
    fn name(&self) -> &'static str {
        "verify_transferred_accounts"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::CheckInvitationLink]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !super::in_phase(ctx, Phase::CheckInvitationLink)? {
            return Ok(StepOutcome::Continue);
        }

        let cloud = ctx.cloud(clients).await?;
        let active: BTreeSet<String> = cloud
            .list_accounts()
            .await?
            .into_iter()
            .filter(|a| a.status == AccountStatus::Active)
            .map(|a| a.id)
            .collect();

        let missing: Vec<String> = ctx
            .target_account_ids()
            .difference(&active)
            .cloned()
            .collect();
        if !missing.is_empty() {
            return ctx
                .divert_to_querying(clients, ParameterError::accounts_not_transferred(&missing))
                .await;
        }

        ctx.resume_if_diverted_by(clients, &[ERR_ACCOUNTS_NOT_TRANSFERRED])
            .await?;
        info!(order_id = %ctx.order_id(), "Transferred accounts verified");
        ctx.advance_to_next_phase(clients).await?;
        Ok(StepOutcome::Continue)
    }
}
