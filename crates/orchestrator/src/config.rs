use cloud_orders_config::{AppConfig, TemplatesConfig};
use cloud_orders_types::{Flow, TemplateRef};

/// Settings the engine reads while fulfilling orders
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentConfig {
    /// Role assumed in the master account
    pub management_role_name: String,

    /// Role provisioned in accounts the engine creates
    pub linked_account_role_name: String,

    /// Upper bound on accounts named by one transfer order
    pub max_target_accounts: usize,

    /// Transition orders to Failed when fulfillment raises
    pub fail_orders_on_error: bool,

    /// Replacement for trace identifiers in failure reports
    pub redaction_token: String,

    /// Ticket state treated as resolved
    pub resolved_ticket_state: String,

    pub ticket_service_type: String,

    pub templates: TemplatesConfig,
}

impl FulfillmentConfig {
    pub fn with_fail_orders_on_error(mut self, enabled: bool) -> Self {
        self.fail_orders_on_error = enabled;
        self
    }

    pub fn with_max_target_accounts(mut self, max: usize) -> Self {
        self.max_target_accounts = max;
        self
    }

    pub fn querying_template(&self, flow: Flow) -> Option<TemplateRef> {
        self.templates.querying_for(flow).map(TemplateRef::named)
    }

    pub fn completed_template(&self, flow: Flow) -> Option<TemplateRef> {
        self.templates.completed_for(flow).map(TemplateRef::named)
    }
}

impl From<&AppConfig> for FulfillmentConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            management_role_name: config.provider.management_role_name.clone(),
            linked_account_role_name: config.provider.linked_account_role_name.clone(),
            max_target_accounts: config.fulfillment.max_target_accounts,
            fail_orders_on_error: config.fulfillment.fail_orders_on_error,
            redaction_token: config.fulfillment.redaction_token.clone(),
            resolved_ticket_state: config.ticketing.resolved_state.clone(),
            ticket_service_type: config.ticketing.service_type.clone(),
            templates: config.templates.clone(),
        }
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}
