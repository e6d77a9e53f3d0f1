use async_trait::async_trait;
use cloud_orders_types::{
    NewSubscription, Order, OrderStatus, OrderUpdate, Subscription, SubscriptionStatus,
    TemplateRef,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::StoreError;

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Order-storage API consumed by the fulfillment engine.
///
/// Every call is a plain request/response; there is no concurrency token,
/// the last write wins.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch the raw order payload (agreement, buyer, seller and
    /// subscriptions included)
    async fn get(&self, order_id: &str) -> Result<Value, StoreError>;

    /// Persist parameters / template / status / error
    async fn update(&self, order_id: &str, update: OrderUpdate) -> Result<(), StoreError>;

    /// Move the order to Querying with the given parameters and error
    async fn transition_to_query(
        &self,
        order_id: &str,
        update: OrderUpdate,
    ) -> Result<(), StoreError>;

    /// Move a Querying order back to Processing
    async fn transition_to_process(&self, order_id: &str) -> Result<(), StoreError>;

    async fn transition_to_complete(
        &self,
        order_id: &str,
        template: Option<TemplateRef>,
    ) -> Result<(), StoreError>;

    async fn transition_to_fail(&self, order_id: &str, reason: &str) -> Result<(), StoreError>;

    /// Register a billing subscription for one cloud account on the order
    async fn create_subscription(
        &self,
        order_id: &str,
        subscription: NewSubscription,
    ) -> Result<Subscription, StoreError>;
}

/// Side effect recorded by [`InMemoryOrderStore`]
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Update(OrderUpdate),
    TransitionToQuery(OrderUpdate),
    TransitionToProcess,
    TransitionToComplete(Option<TemplateRef>),
    TransitionToFail(String),
    CreateSubscription(NewSubscription),
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE (for testing)
// ═══════════════════════════════════════════════════════════════════════════

/// Order storage kept in process memory, enforcing the platform's status
/// transition rules
#[derive(Debug, Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Value>>>,
    calls: Arc<RwLock<HashMap<String, Vec<StoreCall>>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order payload; the `id` field is the key
    pub async fn insert(&self, order: Value) -> Result<(), StoreError> {
        let id = order
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Api {
                status: 400,
                body: json!({"errorCode": "missing_id"}),
            })?
            .to_string();
        self.orders.write().await.insert(id, order);
        Ok(())
    }

    /// Typed view of a stored order
    pub async fn order(&self, order_id: &str) -> Option<Order> {
        let orders = self.orders.read().await;
        orders
            .get(order_id)
            .and_then(|raw| serde_json::from_value(raw.clone()).ok())
    }

    pub async fn subscriptions(&self, order_id: &str) -> Vec<Subscription> {
        let orders = self.orders.read().await;
        orders
            .get(order_id)
            .and_then(|raw| raw.get("subscriptions").cloned())
            .and_then(|subs| serde_json::from_value(subs).ok())
            .unwrap_or_default()
    }

    /// Calls made against one order, oldest first
    pub async fn calls(&self, order_id: &str) -> Vec<StoreCall> {
        self.calls
            .read()
            .await
            .get(order_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrite an order's status, bypassing transition rules
    pub async fn force_status(&self, order_id: &str, status: OrderStatus) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;
        order["status"] = serde_json::to_value(status)?;
        Ok(())
    }

    async fn record(&self, order_id: &str, call: StoreCall) {
        self.calls
            .write()
            .await
            .entry(order_id.to_string())
            .or_default()
            .push(call);
    }

    async fn apply(
        &self,
        order_id: &str,
        update: &OrderUpdate,
        transition: Option<(&[OrderStatus], OrderStatus)>,
    ) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;

        if let Some((allowed_from, to)) = transition {
            let current: OrderStatus = serde_json::from_value(order["status"].clone())?;
            if !allowed_from.contains(&current) {
                return Err(StoreError::Api {
                    status: 400,
                    body: json!({
                        "errorCode": "invalid_transition",
                        "from": current,
                        "to": to,
                    }),
                });
            }
            order["status"] = serde_json::to_value(to)?;
        }

        if let Some(parameters) = &update.parameters {
            order["parameters"] = serde_json::to_value(parameters)?;
        }
        if let Some(template) = &update.template {
            order["template"] = serde_json::to_value(template)?;
        }
        if let Some(status) = update.status {
            order["status"] = serde_json::to_value(status)?;
        }
        if let Some(error) = &update.error {
            order["error"] = serde_json::to_value(error)?;
        } else if transition.is_some_and(|(_, to)| to == OrderStatus::Processing) {
            if let Some(fields) = order.as_object_mut() {
                fields.remove("error");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_id: &str) -> Result<Value, StoreError> {
        self.orders
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(order_id.to_string()))
    }

    async fn update(&self, order_id: &str, update: OrderUpdate) -> Result<(), StoreError> {
        self.apply(order_id, &update, None).await?;
        self.record(order_id, StoreCall::Update(update)).await;
        Ok(())
    }

    async fn transition_to_query(
        &self,
        order_id: &str,
        update: OrderUpdate,
    ) -> Result<(), StoreError> {
        self.apply(
            order_id,
            &update,
            Some((&[OrderStatus::Processing], OrderStatus::Querying)),
        )
        .await?;
        self.record(order_id, StoreCall::TransitionToQuery(update))
            .await;
        Ok(())
    }

    async fn transition_to_process(&self, order_id: &str) -> Result<(), StoreError> {
        self.apply(
            order_id,
            &OrderUpdate::default(),
            Some((&[OrderStatus::Querying], OrderStatus::Processing)),
        )
        .await?;
        self.record(order_id, StoreCall::TransitionToProcess).await;
        Ok(())
    }

    async fn transition_to_complete(
        &self,
        order_id: &str,
        template: Option<TemplateRef>,
    ) -> Result<(), StoreError> {
        let update = OrderUpdate {
            template: template.clone(),
            ..Default::default()
        };
        self.apply(
            order_id,
            &update,
            Some((&[OrderStatus::Processing], OrderStatus::Completed)),
        )
        .await?;
        self.record(order_id, StoreCall::TransitionToComplete(template))
            .await;
        Ok(())
    }

    async fn transition_to_fail(&self, order_id: &str, reason: &str) -> Result<(), StoreError> {
        self.apply(
            order_id,
            &OrderUpdate::default(),
            Some((
                &[OrderStatus::Processing, OrderStatus::Querying],
                OrderStatus::Failed,
            )),
        )
        .await?;
        self.record(order_id, StoreCall::TransitionToFail(reason.to_string()))
            .await;
        Ok(())
    }

    async fn create_subscription(
        &self,
        order_id: &str,
        subscription: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let created = {
            let mut orders = self.orders.write().await;
            let order = orders
                .get_mut(order_id)
                .ok_or_else(|| StoreError::NotFound(order_id.to_string()))?;

            if !order["subscriptions"].is_array() {
                order["subscriptions"] = json!([]);
            }
            let existing = order["subscriptions"].as_array().map_or(0, Vec::len);
            let created = Subscription {
                id: format!("SUB-{order_id}-{}", existing + 1),
                name: subscription.name.clone(),
                status: SubscriptionStatus::Active,
                external_ids: cloud_orders_types::ExternalIds {
                    vendor: Some(subscription.account_id.clone()),
                    client: None,
                },
            };
            let value = serde_json::to_value(&created)?;
            if let Some(list) = order["subscriptions"].as_array_mut() {
                list.push(value);
            }
            created
        };
        self.record(order_id, StoreCall::CreateSubscription(subscription))
            .await;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_orders_types::{param, ParameterError, Parameters};

    fn order_payload(status: &str) -> Value {
        json!({
            "id": "ORD-1",
            "type": "Purchase",
            "status": status,
            "parameters": {"ordering": [], "fulfillment": []},
            "agreement": {"id": "AGR-1", "externalIds": {"vendor": "111111111111"}}
        })
    }

    #[tokio::test]
    async fn test_update_persists_parameters() {
        let store = InMemoryOrderStore::new();
        store.insert(order_payload("Processing")).await.unwrap();

        let mut parameters = Parameters::default();
        parameters.set_fulfillment_value(param::PHASE, Some("createAccount".to_string()));
        store
            .update("ORD-1", OrderUpdate::parameters(parameters))
            .await
            .unwrap();

        let order = store.order("ORD-1").await.unwrap();
        assert_eq!(
            order.parameters.fulfillment_value(param::PHASE),
            Some("createAccount")
        );
        assert_eq!(store.calls("ORD-1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_query_then_process_clears_error() {
        let store = InMemoryOrderStore::new();
        store.insert(order_payload("Processing")).await.unwrap();

        let update = OrderUpdate {
            error: Some(ParameterError::new("AWS003", "missing")),
            ..Default::default()
        };
        store.transition_to_query("ORD-1", update).await.unwrap();
        assert_eq!(
            store.order("ORD-1").await.unwrap().status,
            OrderStatus::Querying
        );

        store.transition_to_process("ORD-1").await.unwrap();
        let order = store.order("ORD-1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert!(order.error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_transition_rejected() {
        let store = InMemoryOrderStore::new();
        store.insert(order_payload("Querying")).await.unwrap();

        let result = store.transition_to_complete("ORD-1", None).await;
        assert!(matches!(result, Err(StoreError::Api { status: 400, .. })));
        assert!(store.calls("ORD-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_create_subscription_appends() {
        let store = InMemoryOrderStore::new();
        store.insert(order_payload("Processing")).await.unwrap();

        let created = store
            .create_subscription(
                "ORD-1",
                NewSubscription {
                    name: "Account 222222222222".to_string(),
                    account_id: "222222222222".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(created.account_id(), Some("222222222222"));
        assert_eq!(store.subscriptions("ORD-1").await, vec![created]);
    }

    #[tokio::test]
    async fn test_missing_order() {
        let store = InMemoryOrderStore::new();
        assert!(matches!(
            store.get("ORD-404").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
