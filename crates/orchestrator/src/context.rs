use cloud_orders_connectors::CloudClient;
use cloud_orders_types::{
    param, AccountType, Agreement, Buyer, Flow, Order, OrderStatus, OrderType, OrderUpdate,
    ParameterError, Parameters, Phase, Seller, Subscription, SubscriptionStatus, TerminationType,
    TransferType,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::{Clients, ContextError, FulfillmentError, StepOutcome};

/// Per-invocation working state of one order.
///
/// Built from the raw payload order storage returns, mutated by steps and
/// discarded when the invocation ends. Everything durable lives in the
/// order's parameters.
pub struct OrderContext {
    /// Order body without the entities lifted out below
    pub order: Order,

    pub agreement: Agreement,

    pub buyer: Option<Buyer>,

    pub seller: Option<Seller>,

    pub subscriptions: Vec<Subscription>,

    /// Parameters as order storage last saw them
    persisted: Parameters,

    /// Provider client for the master account, connected on first use
    cloud: Option<Arc<dyn CloudClient>>,
}

impl OrderContext {
    /// Lift agreement, buyer, seller and subscriptions out of the payload
    pub fn from_order_data(data: Value) -> Result<Self, ContextError> {
        let Value::Object(mut fields) = data else {
            return Err(ContextError::NotAnObject);
        };

        let agreement = fields
            .remove("agreement")
            .ok_or(ContextError::MissingField("agreement"))?;
        let agreement: Agreement = lift("agreement", agreement)?;
        let buyer = optional(&mut fields, "buyer")?;
        let seller = optional(&mut fields, "seller")?;
        let subscriptions = optional(&mut fields, "subscriptions")?.unwrap_or_default();
        let order: Order = lift("order", Value::Object(fields))?;

        Ok(Self {
            persisted: order.parameters.clone(),
            order,
            agreement,
            buyer,
            seller,
            subscriptions,
            cloud: None,
        })
    }

    pub fn order_id(&self) -> &str {
        &self.order.id
    }

    pub fn parameters(&self) -> &Parameters {
        &self.order.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.order.parameters
    }

    pub fn is_querying(&self) -> bool {
        self.order.status == OrderStatus::Querying
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DERIVED STATE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn account_type(&self) -> Option<AccountType> {
        self.parameters()
            .ordering_value(param::ACCOUNT_TYPE)
            .and_then(AccountType::parse)
    }

    pub fn transfer_type(&self) -> Option<TransferType> {
        self.parameters()
            .ordering_value(param::TRANSFER_TYPE)
            .and_then(TransferType::parse)
    }

    /// Absent or unrecognised values mean closing the account
    pub fn termination_type(&self) -> TerminationType {
        self.parameters()
            .ordering_value(param::TERMINATION_TYPE)
            .and_then(TerminationType::parse)
            .unwrap_or_default()
    }

    /// Flow the order's type and sub-type selectors put it in
    pub fn flow(&self) -> Result<Flow, FulfillmentError> {
        let unsupported = |reason: String| FulfillmentError::UnsupportedOrder {
            order_id: self.order.id.clone(),
            reason,
        };

        match self.order.order_type {
            OrderType::Change => Ok(Flow::Change),
            OrderType::Termination => Ok(Flow::Termination),
            OrderType::Purchase => match self.account_type() {
                Some(AccountType::NewAccount) => Ok(Flow::PurchaseNewAccount),
                Some(AccountType::SplitBilling) => Ok(Flow::PurchaseSplitBilling),
                Some(AccountType::Transfer) => match self.transfer_type() {
                    Some(TransferType::WithOrganization) => {
                        Ok(Flow::PurchaseTransferWithOrganization)
                    }
                    Some(TransferType::WithoutOrganization) => {
                        Ok(Flow::PurchaseTransferWithoutOrganization)
                    }
                    None => Err(unsupported(format!(
                        "transfer type {:?} is not supported",
                        self.parameters().raw_ordering_value(param::TRANSFER_TYPE)
                    ))),
                },
                None => Err(unsupported(format!(
                    "account type {:?} is not supported",
                    self.parameters().raw_ordering_value(param::ACCOUNT_TYPE)
                ))),
            },
        }
    }

    /// Current phase; an unset phase reads as the flow's first phase
    pub fn phase(&self) -> Result<Phase, FulfillmentError> {
        match self.parameters().fulfillment_value(param::PHASE) {
            Some(raw) => Ok(raw.parse::<Phase>().map_err(ContextError::from)?),
            None => Ok(self.flow()?.phases().initial()),
        }
    }

    pub fn phase_is_set(&self) -> bool {
        self.parameters().fulfillment_value(param::PHASE).is_some()
    }

    /// Accounts named by the buyer, one per line
    pub fn target_account_ids(&self) -> BTreeSet<String> {
        parse_account_ids(self.parameters().raw_ordering_value(param::ACCOUNT_ID))
    }

    pub fn master_payer_id(&self) -> Option<&str> {
        self.parameters().ordering_value(param::MASTER_PAYER_ID)
    }

    /// Account the engine manages the organization from: the buyer's
    /// master payer for organization transfers, the agreement's vendor id
    /// otherwise
    pub fn master_account_id(&self) -> Option<&str> {
        if self.is_organization_transfer() {
            return self.master_payer_id();
        }
        self.agreement.master_account_id()
    }

    pub fn is_organization_transfer(&self) -> bool {
        self.order.order_type == OrderType::Purchase
            && self.account_type() == Some(AccountType::Transfer)
            && self.transfer_type() == Some(TransferType::WithOrganization)
    }

    /// Accounts whose subscriptions are being terminated
    pub fn accounts_slated_for_termination(&self) -> BTreeSet<String> {
        self.subscriptions
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Terminating)
            .filter_map(|s| s.account_id())
            .map(str::to_string)
            .collect()
    }

    /// Accounts that already have a live subscription on this order
    pub fn subscribed_account_ids(&self) -> BTreeSet<&str> {
        self.subscriptions
            .iter()
            .filter(|s| s.status != SubscriptionStatus::Terminated)
            .filter_map(|s| s.account_id())
            .collect()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLOUD CLIENT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Provider client for the master account, connecting on first use
    pub async fn cloud(
        &mut self,
        clients: &Clients,
    ) -> Result<Arc<dyn CloudClient>, FulfillmentError> {
        if let Some(client) = &self.cloud {
            return Ok(client.clone());
        }

        let account_id = self
            .master_account_id()
            .ok_or_else(|| FulfillmentError::MissingMasterAccount {
                order_id: self.order.id.clone(),
            })?
            .to_string();
        let client = clients
            .cloud
            .connect(&account_id, &clients.config.management_role_name)
            .await?;

        debug!(order_id = %self.order.id, account_id = %account_id, "Connected to cloud provider");
        self.cloud = Some(client.clone());
        Ok(client)
    }

    pub fn attach_cloud(&mut self, client: Arc<dyn CloudClient>) {
        self.cloud = Some(client);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Write the current parameters to order storage
    pub async fn save_parameters(&mut self, clients: &Clients) -> Result<(), FulfillmentError> {
        clients
            .store
            .update(
                &self.order.id,
                OrderUpdate::parameters(self.order.parameters.clone()),
            )
            .await?;
        self.persisted = self.order.parameters.clone();
        Ok(())
    }

    /// Record and persist a fulfillment parameter
    pub async fn save_fulfillment_value(
        &mut self,
        clients: &Clients,
        external_id: &str,
        value: Option<String>,
    ) -> Result<(), FulfillmentError> {
        self.order
            .parameters
            .set_fulfillment_value(external_id, value);
        self.save_parameters(clients).await
    }

    /// Move to `to`, which must directly follow the current phase
    pub async fn advance_phase(
        &mut self,
        clients: &Clients,
        to: Phase,
    ) -> Result<(), FulfillmentError> {
        let flow = self.flow()?;
        let from = self.phase()?;
        flow.phases().check_transition(from, to)?;

        self.save_fulfillment_value(clients, param::PHASE, Some(to.as_str().to_string()))
            .await?;

        info!(
            order_id = %self.order.id,
            flow = %flow,
            from = %from,
            to = %to,
            "Advanced phase"
        );
        clients.record(|m| m.record_phase_advance(flow, to));
        Ok(())
    }

    /// Advance to the phase after the current one
    pub async fn advance_to_next_phase(
        &mut self,
        clients: &Clients,
    ) -> Result<Phase, FulfillmentError> {
        let next = self.flow()?.phases().successor(self.phase()?)?;
        self.advance_phase(clients, next).await?;
        Ok(next)
    }

    /// Put the order in Querying with `error` and tell the buyer.
    ///
    /// Re-diverting with the error the order already carries changes
    /// nothing and sends nothing.
    pub async fn divert_to_querying(
        &mut self,
        clients: &Clients,
        error: ParameterError,
    ) -> Result<StepOutcome, FulfillmentError> {
        let flow = self.flow()?;

        if self.is_querying() && self.order.error.as_ref() == Some(&error) {
            if self.order.parameters != self.persisted {
                self.save_parameters(clients).await?;
            }
            debug!(order_id = %self.order.id, error_id = %error.id, "Order already querying");
            return Ok(StepOutcome::Querying);
        }

        self.order.error = Some(error.clone());
        if self.is_querying() {
            let update = OrderUpdate {
                parameters: Some(self.order.parameters.clone()),
                error: Some(error.clone()),
                ..Default::default()
            };
            clients.store.update(&self.order.id, update).await?;
        } else {
            let template = clients.config.querying_template(flow);
            let update = OrderUpdate {
                parameters: Some(self.order.parameters.clone()),
                template: template.clone(),
                error: Some(error.clone()),
                status: None,
            };
            clients.store.transition_to_query(&self.order.id, update).await?;
            self.order.status = OrderStatus::Querying;
            if template.is_some() {
                self.order.template = template;
            }
        }
        self.persisted = self.order.parameters.clone();

        clients.notifier.notify_querying(&self.order).await?;

        info!(
            order_id = %self.order.id,
            flow = %flow,
            error_id = %error.id,
            message = %error.message,
            "Order moved to querying"
        );
        clients.record(|m| m.record_querying(flow, &error.id));
        Ok(StepOutcome::Querying)
    }

    /// Return the order to Processing if it is querying because of one of
    /// `error_ids`. Returns whether the order was resumed.
    pub async fn resume_if_diverted_by(
        &mut self,
        clients: &Clients,
        error_ids: &[&str],
    ) -> Result<bool, FulfillmentError> {
        let diverted_here = self.is_querying()
            && self
                .order
                .error
                .as_ref()
                .is_some_and(|e| error_ids.contains(&e.id.as_str()));
        if !diverted_here {
            return Ok(false);
        }

        self.order.parameters.clear_ordering_errors();
        self.order.error = None;
        self.save_parameters(clients).await?;
        clients.store.transition_to_process(&self.order.id).await?;
        self.order.status = OrderStatus::Processing;

        info!(order_id = %self.order.id, "Order resumed processing");
        Ok(true)
    }
}

fn lift<T: DeserializeOwned>(field: &'static str, value: Value) -> Result<T, ContextError> {
    serde_json::from_value(value).map_err(|source| ContextError::Malformed { field, source })
}

fn optional<T: DeserializeOwned>(
    fields: &mut serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<Option<T>, ContextError> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => lift(field, value).map(Some),
    }
}

/// Split a multi-line account list; blanks are dropped, duplicates collapse
pub fn parse_account_ids(raw: Option<&str>) -> BTreeSet<String> {
    raw.unwrap_or_default()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
