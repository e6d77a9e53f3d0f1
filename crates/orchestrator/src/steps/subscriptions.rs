use async_trait::async_trait;
use cloud_orders_types::{param, Flow, NewSubscription, Phase};
use std::collections::BTreeSet;
use tracing::info;

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Registers one billing subscription per provisioned account
pub struct CreateSubscriptions;

impl CreateSubscriptions {
    /// Accounts the order bills for, by flow
    fn accounts(ctx: &OrderContext, flow: Flow) -> Result<BTreeSet<String>, FulfillmentError> {
        let created = ctx
            .parameters()
            .fulfillment_value(param::CREATED_ACCOUNT_ID)
            .map(str::to_string);

        let accounts = match flow {
            Flow::PurchaseNewAccount | Flow::Change => {
                let created = created.ok_or_else(|| {
                    FulfillmentError::missing_parameter(ctx.order_id(), param::CREATED_ACCOUNT_ID)
                })?;
                BTreeSet::from([created])
            }
            Flow::PurchaseTransferWithoutOrganization => ctx.target_account_ids(),
            Flow::PurchaseTransferWithOrganization => {
                let mut accounts = ctx.target_account_ids();
                let master_payer = ctx.master_payer_id().ok_or_else(|| {
                    FulfillmentError::missing_parameter(ctx.order_id(), param::MASTER_PAYER_ID)
                })?;
                accounts.insert(master_payer.to_string());
                accounts.extend(created);
                accounts
            }
            Flow::PurchaseSplitBilling => {
                let master = ctx.master_account_id().ok_or_else(|| {
                    FulfillmentError::MissingMasterAccount {
                        order_id: ctx.order_id().to_string(),
                    }
                })?;
                BTreeSet::from([master.to_string()])
            }
            Flow::Termination => BTreeSet::new(),
        };
        Ok(accounts)
    }
}

#[async_trait]
impl Step for CreateSubscriptions {
    fn name(&self) -> &'static str {
        "create_subscriptions"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::CreateSubscriptions]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::CreateSubscriptions)? {
            return Ok(StepOutcome::Continue);
        }

        let accounts = Self::accounts(ctx, ctx.flow()?)?;
        let missing: Vec<String> = {
            let subscribed = ctx.subscribed_account_ids();
            accounts
                .into_iter()
                .filter(|id| !subscribed.contains(id.as_str()))
                .collect()
        };

        for account_id in missing {
            let subscription = clients
                .store
                .create_subscription(
                    ctx.order_id(),
                    NewSubscription {
                        name: format!("Account {account_id}"),
                        account_id: account_id.clone(),
                    },
                )
                .await?;
            info!(
                order_id = %ctx.order_id(),
                account_id = %account_id,
                subscription_id = %subscription.id,
                "Created subscription"
            );
            ctx.subscriptions.push(subscription);
        }

        ctx.advance_to_next_phase(clients).await?;
        Ok(StepOutcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, OrderFixture, MASTER_ACCOUNT, ORDER_ID};
    use cloud_orders_types::SubscriptionStatus;

    fn in_subscriptions(fixture: OrderFixture) -> OrderFixture {
        fixture.fulfillment("phase", "createSubscriptions")
    }

    #[tokio::test]
    async fn test_subscribes_created_account() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(
                in_subscriptions(OrderFixture::change())
                    .fulfillment("createdAccountId", "555555555555")
                    .build(),
            )
            .await;

        let outcome = CreateSubscriptions
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();

        assert_eq!(outcome, StepOutcome::Continue);
        let subscriptions = harness.store.subscriptions(ORDER_ID).await;
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].account_id(), Some("555555555555"));
        assert_eq!(ctx.phase().unwrap(), Phase::Completed);
    }

    #[tokio::test]
    async fn test_skips_already_subscribed_accounts() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(
                in_subscriptions(
                    OrderFixture::purchase("transfer")
                        .ordering("transferType", "transferWithoutOrganization")
                        .ordering("accountId", "222222222222\n333333333333"),
                )
                .subscription("222222222222", SubscriptionStatus::Active)
                .build(),
            )
            .await;

        CreateSubscriptions
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();

        let subscriptions = harness.store.subscriptions(ORDER_ID).await;
        assert_eq!(subscriptions.len(), 2);
        assert_eq!(subscriptions[1].account_id(), Some("333333333333"));
    }

    #[tokio::test]
    async fn test_split_billing_subscribes_master() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(in_subscriptions(OrderFixture::purchase("splitBilling")).build())
            .await;

        CreateSubscriptions
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();

        let subscriptions = harness.store.subscriptions(ORDER_ID).await;
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(subscriptions[0].account_id(), Some(MASTER_ACCOUNT));
    }

    #[tokio::test]
    async fn test_organization_transfer_includes_master_payer() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(
                in_subscriptions(
                    OrderFixture::purchase("transfer")
                        .ordering("transferType", "transferWithOrganization")
                        .ordering("masterPayerId", "333333333333")
                        .ordering("accountId", "444444444444"),
                )
                .build(),
            )
            .await;

        CreateSubscriptions
            .apply(&harness.clients, &mut ctx)
            .await
            .unwrap();

        let accounts: Vec<String> = harness
            .store
            .subscriptions(ORDER_ID)
            .await
            .iter()
            .filter_map(|s| s.account_id().map(str::to_string))
            .collect();
        assert_eq!(accounts, vec!["333333333333", "444444444444"]);
    }

    #[tokio::test]
    async fn test_new_account_requires_created_account() {
        let harness = Harness::new();
        let mut ctx = harness
            .context(in_subscriptions(OrderFixture::purchase("newAccount")).build())
            .await;

        assert!(matches!(
            CreateSubscriptions.apply(&harness.clients, &mut ctx).await,
            Err(FulfillmentError::MissingParameter {
                parameter: "createdAccountId",
                ..
            })
        ));
    }
}
