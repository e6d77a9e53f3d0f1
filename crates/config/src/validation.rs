//! Configuration validation

use crate::{AppConfig, ConfigError, Result};
use cloud_orders_types::Flow;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Validate logging config
    if let Err(e) = validate_log_level(&config.logging.level) {
        errors.push(e);
    }

    // Validate provider config
    if config.provider.management_role_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "provider.management_role_name",
            "role name is required",
        ));
    }

    if config.provider.linked_account_role_name.trim().is_empty() {
        errors.push(ValidationError::new(
            "provider.linked_account_role_name",
            "role name is required",
        ));
    }

    // Validate fulfillment policy
    if config.fulfillment.max_target_accounts == 0 {
        errors.push(ValidationError::new(
            "fulfillment.max_target_accounts",
            "must be greater than 0",
        ));
    }

    if config.fulfillment.redaction_token.is_empty() {
        errors.push(ValidationError::new(
            "fulfillment.redaction_token",
            "redaction token cannot be empty",
        ));
    }

    // Validate ticketing config
    if config.ticketing.resolved_state.trim().is_empty() {
        errors.push(ValidationError::new(
            "ticketing.resolved_state",
            "resolved state is required",
        ));
    }

    if config.ticketing.service_type.trim().is_empty() {
        errors.push(ValidationError::new(
            "ticketing.service_type",
            "service type is required",
        ));
    }

    // Every flow needs both templates
    for flow in Flow::ALL {
        if config.templates.querying_for(flow).is_none() {
            errors.push(ValidationError::new(
                format!("templates.querying.{flow}"),
                "missing template name",
            ));
        }
        if config.templates.completed_for(flow).is_none() {
            errors.push(ValidationError::new(
                format!("templates.completed.{flow}"),
                "missing template name",
            ));
        }
    }

    let known: Vec<&str> = Flow::ALL.iter().map(Flow::as_str).collect();
    for key in config
        .templates
        .querying
        .keys()
        .chain(config.templates.completed.keys())
    {
        if !known.contains(&key.as_str()) {
            errors.push(ValidationError::new(
                format!("templates.{key}"),
                format!("unknown flow '{key}'"),
            ));
        }
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "logging.level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}
