use async_trait::async_trait;
use cloud_orders_types::{param, OnboardingStatus, Phase};
use tracing::info;

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Enrolls the master account in the vendor's partner onboarding
pub struct CcpOnboard;

#[async_trait]
impl Step for CcpOnboard {
    fn name(&self) -> &'static str {
        "ccp_onboard"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::CcpOnboard]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::CcpOnboard)? {
            return Ok(StepOutcome::Continue);
        }

        let Some(engagement_id) = ctx
            .parameters()
            .fulfillment_value(param::CCP_ENGAGEMENT_ID)
            .map(str::to_string)
        else {
            let master = ctx
                .master_account_id()
                .ok_or_else(|| FulfillmentError::MissingMasterAccount {
                    order_id: ctx.order_id().to_string(),
                })?
                .to_string();
            let engagement_id = clients
                .onboarding
                .start_onboarding(&master, ctx.order_id())
                .await?;
            ctx.save_fulfillment_value(clients, param::CCP_ENGAGEMENT_ID, Some(engagement_id.clone()))
                .await?;
            info!(
                order_id = %ctx.order_id(),
                account_id = %master,
                engagement_id = %engagement_id,
                "Started onboarding"
            );
            return Ok(StepOutcome::Halt);
        };

        match clients.onboarding.get_onboarding_status(&engagement_id).await? {
            OnboardingStatus::Running => Ok(StepOutcome::Halt),
            OnboardingStatus::Failed => Err(FulfillmentError::OnboardingFailed { engagement_id }),
            OnboardingStatus::Succeeded => {
                info!(order_id = %ctx.order_id(), engagement_id = %engagement_id, "Onboarding finished");
                ctx.advance_to_next_phase(clients).await?;
                Ok(StepOutcome::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, OrderFixture};

    #[tokio::test]
    async fn test_onboarding_lifecycle() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(
                OrderFixture::purchase("newAccount")
                    .fulfillment("phase", "ccpOnboard")
                    .build(),
            )
            .await;

        let outcome = CcpOnboard.apply(&harness.clients, &mut ctx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Halt);
        assert_eq!(harness.onboarding.started().await, 1);

        let mut ctx = harness.reload().await;
        let outcome = CcpOnboard.apply(&harness.clients, &mut ctx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Halt);
        assert_eq!(harness.onboarding.started().await, 1);

        harness.onboarding.settle_all(OnboardingStatus::Succeeded).await;
        let mut ctx = harness.reload().await;
        let outcome = CcpOnboard.apply(&harness.clients, &mut ctx).await.unwrap();
        assert_eq!(outcome, StepOutcome::Continue);
        assert_eq!(ctx.phase().unwrap(), Phase::Completed);
    }

    #[tokio::test]
    async fn test_failed_onboarding_is_an_error() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(
                OrderFixture::purchase("newAccount")
                    .fulfillment("phase", "ccpOnboard")
                    .build(),
            )
            .await;
        CcpOnboard.apply(&harness.clients, &mut ctx).await.unwrap();
        harness.onboarding.settle_all(OnboardingStatus::Failed).await;

        let mut ctx = harness.reload().await;
        assert!(matches!(
            CcpOnboard.apply(&harness.clients, &mut ctx).await,
            Err(FulfillmentError::OnboardingFailed { .. })
        ));
    }
}
