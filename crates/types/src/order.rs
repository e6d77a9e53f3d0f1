use serde::{Deserialize, Serialize};

use crate::{ParameterError, Parameters};

/// Kind of buyer intent an order carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Purchase,
    Change,
    Termination,
}

/// Lifecycle status of an order as held by order storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Draft,
    Processing,
    Querying,
    Completed,
    Failed,
}

impl OrderStatus {
    /// Statuses the poller picks orders up in
    pub fn is_actionable(&self) -> bool {
        matches!(self, OrderStatus::Processing | OrderStatus::Querying)
    }
}

/// Reference to a rendering template owned by order storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: String,
    pub name: String,
}

impl TemplateRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
        }
    }
}

/// Vendor / platform external identifiers attached to a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIds {
    /// Identifier assigned by the cloud vendor (account id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    /// Identifier assigned by the commerce platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// Commercial agreement an order belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub id: String,

    /// `vendor` carries the master (payer) account id once assigned
    #[serde(default)]
    pub external_ids: ExternalIds,
}

impl Agreement {
    pub fn master_account_id(&self) -> Option<&str> {
        self.external_ids
            .vendor
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seller {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Lifecycle of a subscription (one per provisioned cloud account)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    Active,
    Updating,
    Terminating,
    Terminated,
}

/// Billing subscription for a single cloud account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,

    #[serde(default)]
    pub name: String,

    pub status: SubscriptionStatus,

    #[serde(default)]
    pub external_ids: ExternalIds,
}

impl Subscription {
    /// Cloud account id the subscription bills for
    pub fn account_id(&self) -> Option<&str> {
        self.external_ids.vendor.as_deref()
    }
}

/// Payload for registering a new subscription on an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubscription {
    pub name: String,
    pub account_id: String,
}

/// Order record minus the entities the context lifts out of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,

    #[serde(rename = "type")]
    pub order_type: OrderType,

    pub status: OrderStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,

    #[serde(default)]
    pub parameters: Parameters,

    /// Order-level error shown alongside a Querying status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ParameterError>,
}

/// Partial update sent to order storage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ParameterError>,
}

impl OrderUpdate {
    pub fn parameters(parameters: Parameters) -> Self {
        Self {
            parameters: Some(parameters),
            ..Default::default()
        }
    }

    pub fn with_template(mut self, template: TemplateRef) -> Self {
        self.template = Some(template);
        self
    }
}
