use async_trait::async_trait;
use cloud_orders_types::{
    param, Handshake, HandshakeState, ParameterError, Phase, ERR_INVITATIONS_PENDING,
    ERR_INVITATION_FAILED,
};
use std::collections::BTreeSet;
use tracing::{info, warn};

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Provider calls needed to bring invitations in line with the targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationPlan {
    /// Targets with no live invitation
    pub invite: Vec<String>,

    /// Open invitations to accounts no longer targeted
    pub cancel: Vec<Handshake>,
}

/// Diff target accounts against existing handshakes
pub fn reconcile_invitations(targets: &BTreeSet<String>, handshakes: &[Handshake]) -> InvitationPlan {
    let live: BTreeSet<&str> = handshakes
        .iter()
        .filter(|h| h.state.is_live())
        .map(|h| h.target_account_id.as_str())
        .collect();

    InvitationPlan {
        invite: targets
            .iter()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect(),
        cancel: handshakes
            .iter()
            .filter(|h| h.state.is_cancellable() && !targets.contains(&h.target_account_id))
            .cloned()
            .collect(),
    }
}

/// Invites each target account into the master account's organization
pub struct SendInvitationLinks;

#[async_trait]
impl Step for SendInvitationLinks {
    fn name(&self) -> &'static str {
        "send_invitation_links"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::TransferAccount]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::TransferAccount)? {
            return Ok(StepOutcome::Continue);
        }

        let cloud = ctx.cloud(clients).await?;
        let plan = reconcile_invitations(&ctx.target_account_ids(), &cloud.list_handshakes().await?);
        let notes = format!(
            "Invitation to join the organization of account {} for order {}",
            ctx.master_account_id().unwrap_or_default(),
            ctx.order_id()
        );

        // Each call stands alone; failures are collected, not propagated.
        let mut failed_invites = Vec::new();
        for account_id in &plan.invite {
            let result = cloud.invite_account_to_organization(account_id, &notes).await;
            clients.record(|m| m.record_account_operation("invite_account", result.is_ok()));
            match result {
                Ok(handshake) => {
                    info!(
                        order_id = %ctx.order_id(),
                        account_id = %account_id,
                        handshake_id = %handshake.id,
                        "Sent invitation"
                    );
                }
                Err(e) => {
                    warn!(order_id = %ctx.order_id(), account_id = %account_id, error = %e, "Invitation failed");
                    failed_invites.push(account_id.clone());
                }
            }
        }

        let mut failed_cancels = Vec::new();
        for handshake in &plan.cancel {
            let result = cloud.cancel_handshake(&handshake.id).await;
            clients.record(|m| m.record_account_operation("cancel_invitation", result.is_ok()));
            match result {
                Ok(_) => {
                    info!(
                        order_id = %ctx.order_id(),
                        account_id = %handshake.target_account_id,
                        handshake_id = %handshake.id,
                        "Cancelled stale invitation"
                    );
                }
                Err(e) => {
                    warn!(
                        order_id = %ctx.order_id(),
                        handshake_id = %handshake.id,
                        error = %e,
                        "Cancelling invitation failed"
                    );
                    failed_cancels.push(handshake.id.clone());
                }
            }
        }

        if !failed_invites.is_empty() {
            let error = ParameterError::invitation_failed(&failed_invites);
            ctx.parameters_mut()
                .set_ordering_error(param::ACCOUNT_ID, Some(error.clone()));
            return ctx.divert_to_querying(clients, error).await;
        }
        if !failed_cancels.is_empty() {
            return Ok(StepOutcome::Halt);
        }

        ctx.resume_if_diverted_by(clients, &[ERR_INVITATION_FAILED])
            .await?;
        Ok(StepOutcome::Continue)
    }
}

/// Waits until every target account accepted its invitation
pub struct AwaitInvitationLinks;

#[async_trait]
impl Step for AwaitInvitationLinks {
    fn name(&self) -> &'static str {
        "await_invitation_links"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::TransferAccount]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::TransferAccount)? {
            return Ok(StepOutcome::Continue);
        }

        let cloud = ctx.cloud(clients).await?;
        let accepted: BTreeSet<String> = cloud
            .list_handshakes()
            .await?
            .into_iter()
            .filter(|h| h.state == HandshakeState::Accepted)
            .map(|h| h.target_account_id)
            .collect();

        let pending: Vec<String> = ctx
            .target_account_ids()
            .difference(&accepted)
            .cloned()
            .collect();
        if !pending.is_empty() {
            info!(order_id = %ctx.order_id(), pending = pending.len(), "Waiting for invitations");
            return ctx
                .divert_to_querying(clients, ParameterError::invitations_pending(&pending))
                .await;
        }

        ctx.resume_if_diverted_by(clients, &[ERR_INVITATIONS_PENDING, ERR_INVITATION_FAILED])
            .await?;
        info!(order_id = %ctx.order_id(), "All invitations accepted");
        ctx.advance_to_next_phase(clients).await?;
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, OrderFixture, MASTER_ACCOUNT};
    use cloud_orders_connectors::{CloudError, MockCloud};
    use cloud_orders_types::OrderStatus;

    fn targets(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn transfer_order(accounts: &str) -> OrderFixture {
        OrderFixture::purchase("transfer")
            .ordering("transferType", "transferWithoutOrganization")
            .ordering("accountId", accounts)
            .fulfillment("phase", "transferAccount")
    }

    #[test]
    fn test_reconcile_ignores_dead_handshakes() {
        let handshakes = vec![
            Handshake::new("h-1", HandshakeState::Declined, "222222222222"),
            Handshake::new("h-2", HandshakeState::Expired, "333333333333"),
            Handshake::new("h-3", HandshakeState::Canceled, "444444444444"),
        ];

        let plan = reconcile_invitations(&targets(&["222222222222", "333333333333"]), &handshakes);
        assert_eq!(plan.invite, vec!["222222222222", "333333333333"]);
        assert!(plan.cancel.is_empty());
    }

    #[test]
    fn test_accepted_invitation_to_untargeted_account_is_kept() {
        let handshakes = vec![Handshake::new("h-1", HandshakeState::Accepted, "222222222222")];

        let plan = reconcile_invitations(&BTreeSet::new(), &handshakes);
        assert!(plan.invite.is_empty());
        assert!(plan.cancel.is_empty());
    }

    #[tokio::test]
    async fn test_sends_missing_and_cancels_stale() {
        let cloud = MockCloud::new(MASTER_ACCOUNT)
            .with_handshake("222222222222", HandshakeState::Open)
            .await
            .with_handshake("999999999999", HandshakeState::Requested)
            .await;
        let harness = Harness::with_cloud(cloud);
        let mut ctx = harness
            .context(transfer_order("222222222222\n333333333333").build())
            .await;

        let outcome = SendInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Continue);

        let calls = harness.cloud.calls().await;
        assert!(calls.contains(&"invite_account_to_organization:333333333333".to_string()));
        assert!(!calls.contains(&"invite_account_to_organization:222222222222".to_string()));
        assert!(calls.contains(&"cancel_handshake:h-2".to_string()));

        // Second run has nothing left to do
        let mut ctx = harness.reload().await;
        SendInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();
        assert_eq!(harness.cloud.call_count("invite_account_to_organization").await, 1);
        assert_eq!(harness.cloud.call_count("cancel_handshake").await, 1);
    }

    #[tokio::test]
    async fn test_failed_invitations_divert_with_accounts() {
        let harness = Harness::new();
        harness
            .cloud
            .fail_on(
                "invite_account_to_organization",
                Some("333333333333"),
                CloudError::api("DuplicateHandshakeException", "duplicate"),
            )
            .await;
        let mut ctx = harness
            .context(transfer_order("222222222222\n333333333333").build())
            .await;

        let outcome = SendInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Querying);
        assert_eq!(harness.cloud.call_count("invite_account_to_organization").await, 2);
        let error = harness.stored().await.error.unwrap();
        assert_eq!(error.id, ERR_INVITATION_FAILED);
        assert!(error.message.contains("333333333333"));
        assert!(!error.message.contains("222222222222"));
    }

    #[tokio::test]
    async fn test_failed_cancellation_halts() {
        let cloud = MockCloud::new(MASTER_ACCOUNT)
            .with_handshake("999999999999", HandshakeState::Open)
            .await;
        let harness = Harness::with_cloud(cloud);
        harness
            .cloud
            .fail_on("cancel_handshake", None, CloudError::api("Throttled", "slow down"))
            .await;
        let mut ctx = harness.context(transfer_order("222222222222").build()).await;

        let outcome = SendInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Halt);
        assert_eq!(harness.stored().await.status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_await_queries_until_all_accepted() {
        let cloud = MockCloud::new(MASTER_ACCOUNT)
            .with_handshake("222222222222", HandshakeState::Accepted)
            .await
            .with_handshake("333333333333", HandshakeState::Open)
            .await;
        let harness = Harness::with_cloud(cloud);
        let mut ctx = harness
            .context(transfer_order("222222222222\n333333333333").build())
            .await;

        let outcome = AwaitInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Querying);
        let error = harness.stored().await.error.unwrap();
        assert_eq!(error.id, ERR_INVITATIONS_PENDING);
        assert!(error.message.contains("333333333333"));

        // Same pending set: no second notification
        let mut ctx = harness.reload().await;
        AwaitInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();
        assert_eq!(harness.notifier.queried().await.len(), 1);

        harness
            .cloud
            .set_handshake_state("333333333333", HandshakeState::Accepted)
            .await;
        let mut ctx = harness.reload().await;
        let outcome = AwaitInvitationLinks
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();
        assert_eq!(outcome, StepOutcome::Continue);

        let stored = harness.stored().await;
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(
            stored.parameters.fulfillment_value(param::PHASE),
            Some("createSubscriptions")
        );
    }
}
