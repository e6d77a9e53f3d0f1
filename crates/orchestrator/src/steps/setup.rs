use async_trait::async_trait;
use cloud_orders_types::{is_valid_account_id, param};
use tracing::info;

use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Connects to the master account and records the flow's first phase on
/// orders that have none yet
pub struct SetupContext;

#[async_trait]
impl Step for SetupContext {
    fn name(&self) -> &'static str {
        "setup_context"
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        let flow = ctx.flow()?;

        // The master payer of an organization transfer is buyer input and
        // is only connected to once it is well formed.
        let deferred = ctx.is_organization_transfer()
            && !ctx.master_payer_id().is_some_and(is_valid_account_id);
        if !deferred {
            ctx.cloud(clients).await?;
        }

        if !ctx.phase_is_set() {
            let initial = flow.phases().initial();
            ctx.save_fulfillment_value(clients, param::PHASE, Some(initial.as_str().to_string()))
                .await?;
            info!(order_id = %ctx.order_id(), flow = %flow, phase = %initial, "Initialised phase");
        }

        Ok(StepOutcome::Continue)
    }
}
