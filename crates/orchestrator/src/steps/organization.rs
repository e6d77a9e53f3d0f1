use async_trait::async_trait;
use cloud_orders_types::Phase;
use tracing::info;

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Makes sure the master account manages an organization
pub struct ConfigureOrganization;

#[async_trait]
impl Step for ConfigureOrganization {
    fn name(&self) -> &'static str {
        "configure_organization"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::PreconfigurationMpa]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::PreconfigurationMpa)? {
            return Ok(StepOutcome::Continue);
        }

        let cloud = ctx.cloud(clients).await?;
        match cloud.describe_organization().await? {
            Some(organization) => {
                info!(
                    order_id = %ctx.order_id(),
                    organization_id = %organization.id,
                    "Organization already configured"
                );
            }
            None => {
                let created = cloud.create_organization().await;
                clients.record(|m| m.record_account_operation("create_organization", created.is_ok()));
                let organization = created?;
                info!(
                    order_id = %ctx.order_id(),
                    organization_id = %organization.id,
                    account_id = %organization.master_account_id,
                    "Created organization"
                );
            }
        }

        ctx.advance_to_next_phase(clients).await?;
        Ok(StepOutcome::Continue)
    }
}
