use serde::{Deserialize, Serialize};

/// External ids of order parameters shared with the order-storage schema.
///
/// These strings are persisted on existing orders and must never change.
pub mod param {
    // Ordering (buyer supplied)
    pub const ACCOUNT_TYPE: &str = "accountType";
    pub const TRANSFER_TYPE: &str = "transferType";
    pub const ROOT_ACCOUNT_EMAIL: &str = "rootAccountEmail";
    pub const ACCOUNT_NAME: &str = "accountName";
    pub const ACCOUNT_ID: &str = "accountId";
    pub const MASTER_PAYER_ID: &str = "masterPayerId";
    pub const TERMINATION_TYPE: &str = "terminationType";

    // Fulfillment (engine internal)
    pub const PHASE: &str = "phase";
    pub const ACCOUNT_REQUEST_ID: &str = "accountRequestId";
    pub const CREATED_ACCOUNT_ID: &str = "createdAccountId";
    pub const CCP_ENGAGEMENT_ID: &str = "ccpEngagementId";
    pub const TRANSFER_TICKET_ID: &str = "transferTicketId";
    pub const TERMINATION_TICKET_ID: &str = "terminationTicketId";
}

/// Structured, buyer-facing error attached to a parameter or an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterError {
    pub id: String,
    pub message: String,
}

impl ParameterError {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParameterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.id, self.message)
    }
}

/// Visibility and editability flags rendered by the platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterConstraints {
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
}

/// One order parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub external_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ParameterError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ParameterConstraints>,
}

impl Parameter {
    pub fn new(external_id: impl Into<String>, value: Option<String>) -> Self {
        Self {
            external_id: external_id.into(),
            value,
            error: None,
            constraints: None,
        }
    }
}

/// Ordering and fulfillment parameter sets of an order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub ordering: Vec<Parameter>,

    #[serde(default)]
    pub fulfillment: Vec<Parameter>,
}

impl Parameters {
    /// Non-blank value of an ordering parameter
    pub fn ordering_value(&self, external_id: &str) -> Option<&str> {
        value_of(&self.ordering, external_id)
    }

    /// Non-blank value of a fulfillment parameter
    pub fn fulfillment_value(&self, external_id: &str) -> Option<&str> {
        value_of(&self.fulfillment, external_id)
    }

    /// Raw ordering value, blank strings included
    pub fn raw_ordering_value(&self, external_id: &str) -> Option<&str> {
        self.ordering
            .iter()
            .find(|p| p.external_id == external_id)
            .and_then(|p| p.value.as_deref())
    }

    pub fn set_ordering_value(&mut self, external_id: &str, value: Option<String>) {
        upsert(&mut self.ordering, external_id).value = value;
    }

    pub fn set_fulfillment_value(&mut self, external_id: &str, value: Option<String>) {
        upsert(&mut self.fulfillment, external_id).value = value;
    }

    pub fn ordering_error(&self, external_id: &str) -> Option<&ParameterError> {
        self.ordering
            .iter()
            .find(|p| p.external_id == external_id)
            .and_then(|p| p.error.as_ref())
    }

    pub fn set_ordering_error(&mut self, external_id: &str, error: Option<ParameterError>) {
        upsert(&mut self.ordering, external_id).error = error;
    }

    /// Remove every ordering error, returning whether any was present
    pub fn clear_ordering_errors(&mut self) -> bool {
        let mut cleared = false;
        for parameter in &mut self.ordering {
            if parameter.error.take().is_some() {
                cleared = true;
            }
        }
        cleared
    }

    pub fn has_ordering_errors(&self) -> bool {
        self.ordering.iter().any(|p| p.error.is_some())
    }
}

fn value_of<'a>(parameters: &'a [Parameter], external_id: &str) -> Option<&'a str> {
    parameters
        .iter()
        .find(|p| p.external_id == external_id)
        .and_then(|p| p.value.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn upsert<'a>(parameters: &'a mut Vec<Parameter>, external_id: &str) -> &'a mut Parameter {
    let index = match parameters.iter().position(|p| p.external_id == external_id) {
        Some(index) => index,
        None => {
            parameters.push(Parameter::new(external_id, None));
            parameters.len() - 1
        }
    };
    &mut parameters[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_read_as_absent() {
        let mut parameters = Parameters::default();
        parameters.set_ordering_value(param::ACCOUNT_NAME, Some("   ".to_string()));

        assert_eq!(parameters.ordering_value(param::ACCOUNT_NAME), None);
        assert_eq!(parameters.raw_ordering_value(param::ACCOUNT_NAME), Some("   "));
    }

    #[test]
    fn test_set_fulfillment_value_upserts() {
        let mut parameters = Parameters::default();
        parameters.set_fulfillment_value(param::PHASE, Some("createAccount".to_string()));
        parameters.set_fulfillment_value(param::PHASE, Some("completed".to_string()));

        assert_eq!(parameters.fulfillment.len(), 1);
        assert_eq!(parameters.fulfillment_value(param::PHASE), Some("completed"));
    }

    #[test]
    fn test_clear_ordering_errors() {
        let mut parameters = Parameters::default();
        assert!(!parameters.clear_ordering_errors());

        parameters.set_ordering_error(
            param::ROOT_ACCOUNT_EMAIL,
            Some(ParameterError::new("AWS001", "bad email")),
        );
        assert!(parameters.has_ordering_errors());
        assert!(parameters.clear_ordering_errors());
        assert!(!parameters.has_ordering_errors());
    }

    #[test]
    fn test_parameter_wire_format() {
        let parameter = Parameter::new(param::ACCOUNT_ID, Some("123456789012".to_string()));
        let json = serde_json::to_value(&parameter).unwrap();

        assert_eq!(json["externalId"], "accountId");
        assert_eq!(json["value"], "123456789012");
        assert!(json.get("error").is_none());
    }
}
