//! Cross-step properties of the fulfillment engine

#[cfg(test)]
mod unit_tests {
    use crate::steps::*;
    use crate::testing::{Harness, OrderFixture, MASTER_ACCOUNT, ORDER_ID};
    use crate::{
        parse_account_ids, Fulfiller, FulfillmentConfig, FulfillmentError, Pipeline, Step,
        StepOutcome,
    };
    use cloud_orders_connectors::{CloudError, MockCloud, StoreCall};
    use cloud_orders_types::{
        param, AccountStatus, Flow, Handshake, HandshakeState, OnboardingStatus, OrderStatus,
        Phase, SubscriptionStatus,
    };
    use std::collections::BTreeSet;

    async fn stored_phase(harness: &Harness) -> Option<String> {
        harness
            .stored()
            .await
            .parameters
            .fulfillment_value(param::PHASE)
            .map(str::to_string)
    }

    // ==================== Target Parsing ====================

    #[test]
    fn test_target_parsing_never_fails() {
        for raw in [None, Some(""), Some("\n"), Some("   \n\t\n")] {
            assert!(parse_account_ids(raw).is_empty());
        }

        let ids = parse_account_ids(Some("111111111111\n 111111111111 \n\n222222222222"));
        assert_eq!(ids.len(), 2);
    }

    // ==================== Invitation Reconciliation ====================

    #[test]
    fn test_invitation_reconciliation() {
        let handshakes = vec![
            Handshake::new("h-a", HandshakeState::Accepted, "A"),
            Handshake::new("h-b", HandshakeState::Requested, "B"),
            Handshake::new("h-d", HandshakeState::Requested, "D"),
        ];
        let targets: BTreeSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();

        let plan = reconcile_invitations(&targets, &handshakes);

        assert_eq!(plan.invite, vec!["C".to_string()]);
        assert_eq!(plan.cancel.len(), 1);
        assert_eq!(plan.cancel[0].target_account_id, "D");
    }

    // ==================== Self-Selecting Applicability ====================

    #[tokio::test]
    async fn test_phase_gated_steps_skip_foreign_phases() {
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(ConfigureOrganization),
            Box::new(CreateLinkedAccount::new()),
            Box::new(SendInvitationLinks),
            Box::new(AwaitInvitationLinks),
            Box::new(CreateSubscriptions),
            Box::new(CcpOnboard),
            Box::new(CreateTransferTicket),
            Box::new(AwaitTransferTicket),
            Box::new(VerifyTransferredAccounts),
        ];
        let harness = Harness::new();
        let mut ctx = harness
            .context(
                OrderFixture::purchase("transfer")
                    .ordering("transferType", "transferWithOrganization")
                    .ordering("masterPayerId", "333333333333")
                    .fulfillment("phase", "completed")
                    .build(),
            )
            .await;

        for step in &steps {
            let outcome = step.apply(&harness.clients, &mut ctx).await.unwrap();
            assert_eq!(outcome, StepOutcome::Continue, "{} acted", step.name());
        }

        assert!(harness.cloud.calls().await.is_empty());
        assert!(harness.store.calls(ORDER_ID).await.is_empty());
        assert!(harness.tickets.is_empty().await);
        assert_eq!(harness.onboarding.started().await, 0);
    }

    #[test]
    fn test_every_phase_of_a_flow_has_a_step() {
        for flow in Flow::ALL {
            let table = flow.phases();
            let covered = crate::pipeline_for(flow).unwrap().phases();

            for phase in table.sequence() {
                assert!(covered.contains(phase), "no {flow} step acts in {phase}");
            }
            assert!(covered.iter().all(|p| table.contains(*p)));
        }
    }

    /// Steps of the transfer-without-organization flow, grouped by the
    /// phase they act in
    fn transfer_step_groups() -> Vec<Vec<Box<dyn Step>>> {
        let setup: Vec<Box<dyn Step>> = vec![
            Box::new(SetupContext),
            Box::new(ValidateTransferRequest::new(&[
                Phase::PreconfigurationMpa,
                Phase::TransferAccount,
            ])),
        ];
        let organization: Vec<Box<dyn Step>> = vec![Box::new(ConfigureOrganization)];
        let invitations: Vec<Box<dyn Step>> =
            vec![Box::new(SendInvitationLinks), Box::new(AwaitInvitationLinks)];
        let subscriptions: Vec<Box<dyn Step>> = vec![Box::new(CreateSubscriptions)];
        let onboarding: Vec<Box<dyn Step>> = vec![Box::new(CcpOnboard)];
        let complete: Vec<Box<dyn Step>> = vec![Box::new(CompleteOrder)];
        vec![setup, organization, invitations, subscriptions, onboarding, complete]
    }

    #[derive(Debug, PartialEq)]
    struct Settled {
        outcome: StepOutcome,
        phase: Option<String>,
        provider_writes: Vec<String>,
        subscribed: Vec<String>,
        onboardings: usize,
    }

    /// Poll a pipeline assembled in `order` until the phase stops moving
    async fn settle(order: &[usize]) -> Settled {
        let cloud = MockCloud::new(MASTER_ACCOUNT)
            .with_organization()
            .await
            .with_handshake("222222222222", HandshakeState::Accepted)
            .await
            .with_handshake("333333333333", HandshakeState::Accepted)
            .await;
        let harness = Harness::with_cloud(cloud);
        harness
            .store
            .insert(
                OrderFixture::purchase("transfer")
                    .ordering("transferType", "transferWithoutOrganization")
                    .ordering("accountId", "222222222222\n333333333333")
                    .fulfillment("phase", "transferAccount")
                    .build(),
            )
            .await
            .unwrap();

        let mut outcome = StepOutcome::Continue;
        let mut phase = stored_phase(&harness).await;
        for _ in 0..8 {
            let mut groups = transfer_step_groups();
            let mut steps: Vec<Box<dyn Step>> = Vec::new();
            for i in order {
                steps.append(&mut groups[*i]);
            }
            let pipeline = Pipeline::new(Flow::PurchaseTransferWithoutOrganization, steps).unwrap();

            let mut ctx = harness.reload().await;
            outcome = pipeline.run(&harness.clients, &mut ctx).await.unwrap();
            let next = stored_phase(&harness).await;
            if outcome != StepOutcome::Continue && next == phase {
                break;
            }
            phase = next;
        }

        let mut provider_writes: Vec<String> = harness
            .cloud
            .calls()
            .await
            .into_iter()
            .filter(|c| !["list_", "describe_", "get_"].iter().any(|p| c.starts_with(p)))
            .collect();
        provider_writes.sort();
        let mut subscribed: Vec<String> = harness
            .store
            .calls(ORDER_ID)
            .await
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::CreateSubscription(s) => Some(s.account_id),
                _ => None,
            })
            .collect();
        subscribed.sort();

        Settled {
            outcome,
            phase,
            provider_writes,
            subscribed,
            onboardings: harness.onboarding.started().await,
        }
    }

    #[tokio::test]
    async fn test_step_order_does_not_change_where_an_order_settles() {
        let canonical = settle(&[0, 1, 2, 3, 4, 5]).await;
        assert_eq!(canonical.outcome, StepOutcome::Halt);
        assert_eq!(canonical.phase.as_deref(), Some("ccpOnboard"));
        assert_eq!(canonical.subscribed, vec!["222222222222", "333333333333"]);
        assert_eq!(canonical.onboardings, 1);

        for order in [[5, 4, 3, 2, 1, 0], [3, 4, 5, 0, 1, 2], [2, 0, 4, 1, 5, 3]] {
            assert_eq!(settle(&order).await, canonical, "order {order:?}");
        }
    }

    // ==================== Idempotent Re-entry ====================

    #[tokio::test]
    async fn test_repeated_polls_do_not_repeat_side_effects() {
        let harness = Harness::new();
        harness
            .store
            .insert(
                OrderFixture::purchase("newAccount")
                    .ordering("rootAccountEmail", "root@buyer.example")
                    .ordering("accountName", "Buyer prod")
                    .build(),
            )
            .await
            .unwrap();
        let fulfiller = Fulfiller::new(harness.clients.clone()).unwrap();

        for _ in 0..3 {
            let outcome = fulfiller.fulfill_by_id(ORDER_ID).await.unwrap();
            assert_eq!(outcome, StepOutcome::Halt);
        }

        assert_eq!(harness.cloud.call_count("create_organization").await, 1);
        assert_eq!(harness.cloud.call_count("create_linked_account").await, 1);
        assert_eq!(stored_phase(&harness).await.as_deref(), Some("createAccount"));
    }

    // ==================== Phase Monotonicity ====================

    #[tokio::test]
    async fn test_phase_only_moves_forward() {
        let harness = Harness::new();
        harness
            .store
            .insert(
                OrderFixture::purchase("newAccount")
                    .ordering("rootAccountEmail", "root@buyer.example")
                    .ordering("accountName", "Buyer prod")
                    .build(),
            )
            .await
            .unwrap();
        let fulfiller = Fulfiller::new(harness.clients.clone()).unwrap();
        let table = Flow::PurchaseNewAccount.phases();
        let mut positions = Vec::new();

        for poll in 0..6 {
            match poll {
                2 => harness.cloud.complete_request("car-1", "555555555555").await,
                4 => harness.onboarding.settle_all(OnboardingStatus::Succeeded).await,
                _ => {}
            }
            fulfiller.fulfill_by_id(ORDER_ID).await.unwrap();
            let phase: Phase = stored_phase(&harness).await.unwrap().parse().unwrap();
            positions.push(table.position(phase).unwrap());
        }

        assert!(positions.windows(2).all(|w| w[0] <= w[1]), "{positions:?}");
        assert_eq!(harness.stored().await.status, OrderStatus::Completed);
    }

    // ==================== Rate-Limit Ceiling ====================

    #[tokio::test]
    async fn test_at_most_one_termination_call_per_invocation() {
        let cloud = MockCloud::new(MASTER_ACCOUNT)
            .with_account("222222222222", AccountStatus::Active)
            .await
            .with_account("333333333333", AccountStatus::Active)
            .await
            .with_account("444444444444", AccountStatus::Active)
            .await;
        let harness = Harness::with_cloud(cloud);
        harness
            .store
            .insert(
                OrderFixture::termination()
                    .subscription("222222222222", SubscriptionStatus::Terminating)
                    .subscription("333333333333", SubscriptionStatus::Terminating)
                    .subscription("444444444444", SubscriptionStatus::Terminating)
                    .build(),
            )
            .await
            .unwrap();
        let fulfiller = Fulfiller::new(harness.clients.clone()).unwrap();

        for expected in 1..=3 {
            fulfiller.fulfill_by_id(ORDER_ID).await.unwrap();
            assert_eq!(harness.cloud.call_count("close_account").await, expected);
        }
        assert_eq!(harness.tickets.len().await, 1);
    }

    // ==================== Failure Notification ====================

    #[tokio::test]
    async fn test_failure_reported_once_and_reraised() {
        let harness = Harness::new()
            .configure(FulfillmentConfig::default().with_fail_orders_on_error(true));
        harness
            .cloud
            .fail_on(
                "list_accounts",
                None,
                CloudError::api(
                    "ServiceException",
                    "traceparent 00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01",
                ),
            )
            .await;
        harness
            .store
            .insert(
                OrderFixture::termination()
                    .subscription("222222222222", SubscriptionStatus::Terminating)
                    .build(),
            )
            .await
            .unwrap();
        let fulfiller = Fulfiller::new(harness.clients.clone()).unwrap();

        let result = fulfiller.fulfill_by_id(ORDER_ID).await;

        assert!(matches!(result, Err(FulfillmentError::Cloud(_))));
        let failures = harness.notifier.failures().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].order_id, ORDER_ID);
        assert!(!failures[0].trace.contains("0af7651916cd43dd8448eb211c80319c"));
        assert!(harness
            .store
            .calls(ORDER_ID)
            .await
            .iter()
            .any(|c| matches!(c, StoreCall::TransitionToFail(_))));
    }
}
