use async_trait::async_trait;
use cloud_orders_types::{OrderStatus, Phase};
use tracing::info;

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Closes out the order once every other phase is done
pub struct CompleteOrder;

#[async_trait]
impl Step for CompleteOrder {
    fn name(&self) -> &'static str {
        "complete_order"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::Completed]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::Completed)? || ctx.order.status == OrderStatus::Completed {
            return Ok(StepOutcome::Continue);
        }

        let flow = ctx.flow()?;
        let template = clients.config.completed_template(flow);
        clients
            .store
            .transition_to_complete(ctx.order_id(), template.clone())
            .await?;
        ctx.order.status = OrderStatus::Completed;
        if template.is_some() {
            ctx.order.template = template;
        }

        info!(order_id = %ctx.order_id(), flow = %flow, "Order completed");
        Ok(StepOutcome::Continue)
    }
}
