//! Core configuration structures for the cloud order fulfillment engine

use cloud_orders_types::Flow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cloud provider access
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Fulfillment policy
    #[serde(default)]
    pub fulfillment: FulfillmentSection,

    /// Service-desk settings
    #[serde(default)]
    pub ticketing: TicketingConfig,

    /// Template names by flow
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

/// Cloud provider access configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Role assumed in the master (payer) account
    #[serde(default = "default_management_role_name")]
    pub management_role_name: String,

    /// Role provisioned in newly created linked accounts
    #[serde(default = "default_linked_account_role_name")]
    pub linked_account_role_name: String,
}

/// Fulfillment policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentSection {
    /// Maximum accounts a single transfer order may name
    #[serde(default = "default_max_target_accounts")]
    pub max_target_accounts: usize,

    /// Move an order to Failed when fulfillment raises
    #[serde(default)]
    pub fail_orders_on_error: bool,

    /// Replacement for trace identifiers in failure reports
    #[serde(default = "default_redaction_token")]
    pub redaction_token: String,
}

/// Service-desk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketingConfig {
    /// Ticket state that counts as resolved
    #[serde(default = "default_resolved_state")]
    pub resolved_state: String,

    /// Service type stamped on every request
    #[serde(default = "default_service_type")]
    pub service_type: String,
}

/// Template names keyed by flow label (`purchase_new_account`, `termination`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Shown while an order waits for buyer input
    #[serde(default = "default_querying_templates")]
    pub querying: BTreeMap<String, String>,

    /// Shown once an order completes
    #[serde(default = "default_completed_templates")]
    pub completed: BTreeMap<String, String>,
}

impl TemplatesConfig {
    pub fn querying_for(&self, flow: Flow) -> Option<&str> {
        self.querying.get(flow.as_str()).map(String::as_str)
    }

    pub fn completed_for(&self, flow: Flow) -> Option<&str> {
        self.completed.get(flow.as_str()).map(String::as_str)
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_management_role_name() -> String {
    "OrganizationAccountAccessRole".to_string()
}

fn default_linked_account_role_name() -> String {
    "OrganizationAccountAccessRole".to_string()
}

fn default_max_target_accounts() -> usize {
    20
}

fn default_redaction_token() -> String {
    "<redacted>".to_string()
}

fn default_resolved_state() -> String {
    "Completed".to_string()
}

fn default_service_type() -> String {
    "Cloud Account Management".to_string()
}

fn flow_title(flow: Flow) -> &'static str {
    match flow {
        Flow::PurchaseNewAccount => "New account",
        Flow::PurchaseTransferWithOrganization => "Transfer with organization",
        Flow::PurchaseTransferWithoutOrganization => "Transfer without organization",
        Flow::PurchaseSplitBilling => "Split billing",
        Flow::Change => "Change",
        Flow::Termination => "Termination",
    }
}

fn default_querying_templates() -> BTreeMap<String, String> {
    Flow::ALL
        .iter()
        .map(|flow| {
            (
                flow.as_str().to_string(),
                format!("{} - input required", flow_title(*flow)),
            )
        })
        .collect()
}

fn default_completed_templates() -> BTreeMap<String, String> {
    Flow::ALL
        .iter()
        .map(|flow| {
            (
                flow.as_str().to_string(),
                format!("{} - completed", flow_title(*flow)),
            )
        })
        .collect()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            management_role_name: default_management_role_name(),
            linked_account_role_name: default_linked_account_role_name(),
        }
    }
}

impl Default for FulfillmentSection {
    fn default() -> Self {
        Self {
            max_target_accounts: default_max_target_accounts(),
            fail_orders_on_error: false,
            redaction_token: default_redaction_token(),
        }
    }
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            resolved_state: default_resolved_state(),
            service_type: default_service_type(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            querying: default_querying_templates(),
            completed: default_completed_templates(),
        }
    }
}
