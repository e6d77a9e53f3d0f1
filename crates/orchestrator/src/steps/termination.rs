use async_trait::async_trait;
use cloud_orders_connectors::CloudError;
use cloud_orders_types::{
    param, AccountStatus, ConstraintReason, ParameterError, TerminationType,
    ERR_TERMINATION_PREREQUISITES,
};
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Closes or unlinks the accounts whose subscriptions are terminating.
///
/// Acts on at most one account per invocation to stay under the
/// provider's close/remove quotas; remaining accounts wait for the next
/// poll. Skipped once a termination ticket is recorded.
pub struct TerminateAccounts;

#[async_trait]
impl Step for TerminateAccounts {
    fn name(&self) -> &'static str {
        "terminate_accounts"
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if ctx
            .parameters()
            .fulfillment_value(param::TERMINATION_TICKET_ID)
            .is_some()
        {
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
        let remaining: Vec<String> = ctx
            .accounts_slated_for_termination()
            .intersection(&active)
            .cloned()
            .collect();

        let Some(account_id) = remaining.first() else {
            return Ok(StepOutcome::Continue);
        };

        let termination = ctx.termination_type();
        let (operation, result) = match termination {
            TerminationType::CloseAccount => {
                ("close_account", cloud.close_account(account_id).await)
            }
            TerminationType::UnlinkAccount => (
                "remove_account_from_organization",
                cloud.remove_account_from_organization(account_id).await,
            ),
        };
        clients.record(|m| m.record_account_operation(operation, result.is_ok()));

        match result {
            Ok(()) => {
                info!(
                    order_id = %ctx.order_id(),
                    account_id = %account_id,
                    termination = termination.as_str(),
                    remaining = remaining.len() - 1,
                    "Terminated account"
                );
                ctx.resume_if_diverted_by(clients, &[ERR_TERMINATION_PREREQUISITES])
                    .await?;
                if remaining.len() > 1 {
                    Ok(StepOutcome::Halt)
                } else {
                    Ok(StepOutcome::Continue)
                }
            }
            Err(e) => self.constrained(clients, ctx, account_id, e).await,
        }
    }
}

impl TerminateAccounts {
    async fn constrained(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
        account_id: &str,
        error: CloudError,
    ) -> Result<StepOutcome, FulfillmentError> {
        match error.constraint_reason() {
            Some(ConstraintReason::CoolOffPeriod) => {
                warn!(order_id = %ctx.order_id(), account_id = %account_id, "Account in cool-off period");
                Ok(StepOutcome::Halt)
            }
            Some(ConstraintReason::QuotaExceeded) => {
                warn!(order_id = %ctx.order_id(), account_id = %account_id, "Termination quota exceeded");
                Ok(StepOutcome::Halt)
            }
            Some(ConstraintReason::MissingPrerequisites) => {
                ctx.divert_to_querying(clients, ParameterError::termination_prerequisites(account_id))
                    .await
            }
            _ => Err(error.into()),
        }
    }
}
