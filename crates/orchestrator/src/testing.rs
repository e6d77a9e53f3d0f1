//! Fixtures shared by the unit tests of this crate

use cloud_orders_connectors::{
    InMemoryOrderStore, InMemoryTicketDesk, MockCloud, MockCloudFactory, MockOnboarding,
    OrderStore, RecordingNotifier,
};
use cloud_orders_types::{Order, SubscriptionStatus};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{Clients, FulfillmentConfig, OrderContext};

pub const ORDER_ID: &str = "ORD-0001";
pub const MASTER_ACCOUNT: &str = "111111111111";

/// Builder for raw order payloads as order storage returns them
pub struct OrderFixture {
    order_type: &'static str,
    status: &'static str,
    master_account: Option<String>,
    ordering: Vec<Value>,
    fulfillment: Vec<Value>,
    subscriptions: Vec<Value>,
}

impl OrderFixture {
    fn new(order_type: &'static str) -> Self {
        Self {
            order_type,
            status: "Processing",
            master_account: Some(MASTER_ACCOUNT.to_string()),
            ordering: Vec::new(),
            fulfillment: Vec::new(),
            subscriptions: Vec::new(),
        }
    }

    pub fn purchase(account_type: &str) -> Self {
        Self::new("Purchase").ordering("accountType", account_type)
    }

    pub fn change() -> Self {
        Self::new("Change")
    }

    pub fn termination() -> Self {
        Self::new("Termination")
    }

    pub fn status(mut self, status: &'static str) -> Self {
        self.status = status;
        self
    }

    pub fn without_master_account(mut self) -> Self {
        self.master_account = None;
        self
    }

    pub fn ordering(mut self, id: &str, value: &str) -> Self {
        self.ordering.push(json!({"externalId": id, "value": value}));
        self
    }

    pub fn fulfillment(mut self, id: &str, value: &str) -> Self {
        self.fulfillment
            .push(json!({"externalId": id, "value": value}));
        self
    }

    pub fn subscription(mut self, account_id: &str, status: SubscriptionStatus) -> Self {
        let n = self.subscriptions.len() + 1;
        self.subscriptions.push(json!({
            "id": format!("SUB-{n}"),
            "name": format!("Account {account_id}"),
            "status": status,
            "externalIds": {"vendor": account_id},
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "id": ORDER_ID,
            "type": self.order_type,
            "status": self.status,
            "parameters": {
                "ordering": self.ordering,
                "fulfillment": self.fulfillment,
            },
            "agreement": {
                "id": "AGR-0001",
                "externalIds": {"vendor": self.master_account},
            },
            "buyer": {"id": "BUY-0001", "name": "Buyer"},
            "seller": {"id": "SEL-0001", "name": "Seller"},
            "subscriptions": self.subscriptions,
            "product": {"id": "PRD-0001"},
        })
    }
}

/// Mocks for every external system, wired into [`Clients`]
pub struct Harness {
    pub store: InMemoryOrderStore,
    pub cloud: MockCloud,
    pub factory: MockCloudFactory,
    pub tickets: InMemoryTicketDesk,
    pub onboarding: MockOnboarding,
    pub notifier: RecordingNotifier,
    pub clients: Clients,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_cloud(MockCloud::new(MASTER_ACCOUNT))
    }

    pub fn with_cloud(cloud: MockCloud) -> Self {
        let store = InMemoryOrderStore::new();
        let factory = MockCloudFactory::new(cloud.clone());
        let tickets = InMemoryTicketDesk::default();
        let onboarding = MockOnboarding::new();
        let notifier = RecordingNotifier::new();
        let clients = Clients::new(
            Arc::new(store.clone()),
            Arc::new(factory.clone()),
            Arc::new(tickets.clone()),
            Arc::new(onboarding.clone()),
            Arc::new(notifier.clone()),
        );

        Self {
            store,
            cloud,
            factory,
            tickets,
            onboarding,
            notifier,
            clients,
        }
    }

    pub fn configure(mut self, config: FulfillmentConfig) -> Self {
        self.clients = self.clients.with_config(config);
        self
    }

    /// Store the order and build a context from it
    pub async fn context(&self, order: Value) -> OrderContext {
        self.store.insert(order.clone()).await.unwrap();
        OrderContext::from_order_data(order).unwrap()
    }

    /// Fresh context from what storage holds now, as the next poll would see it
    pub async fn reload(&self) -> OrderContext {
        let raw = self.store.get(ORDER_ID).await.unwrap();
        OrderContext::from_order_data(raw).unwrap()
    }

    pub async fn stored(&self) -> Order {
        self.store.order(ORDER_ID).await.unwrap()
    }
}
