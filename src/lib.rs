//! Cloud-account order fulfillment.
//!
//! Facade over the workspace crates plus the wiring a poller needs:
//! load and validate configuration, then build a [`Fulfiller`] over the
//! external-system clients.

pub use cloud_orders_config as config;
pub use cloud_orders_connectors as connectors;
pub use cloud_orders_metrics as metrics;
pub use cloud_orders_orchestrator as orchestrator;
pub use cloud_orders_types as types;

pub use cloud_orders_orchestrator::{Clients, Fulfiller, FulfillmentConfig, StepOutcome};

use anyhow::Context;
use cloud_orders_config::{validate_config, AppConfig, ConfigLoader, ENV_PREFIX};
use cloud_orders_metrics::{init_tracing_with_metrics, MetricsCollector};
use std::path::Path;
use std::sync::Arc;

/// Load configuration from `path` (when given) layered under
/// `CLOUD_ORDERS_SECTION__KEY` environment variables, and validate it
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => ConfigLoader::from_file_with_env(path, ENV_PREFIX)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ConfigLoader::from_env().context("loading configuration from environment")?,
    };
    validate_config(&config).context("validating configuration")?;
    Ok(config)
}

/// Install the global subscriber described by `config.logging` and return
/// the collector its error events feed
///
/// Call once per process; pass the collector to [`Clients::with_metrics`].
pub fn init_observability(config: &AppConfig) -> anyhow::Result<Arc<MetricsCollector>> {
    let collector = Arc::new(MetricsCollector::new());
    init_tracing_with_metrics(&config.logging, collector.clone())
        .context("initialising tracing")?;
    Ok(collector)
}

/// Build a fulfiller whose settings come from `config`
pub fn build_fulfiller(config: &AppConfig, clients: Clients) -> anyhow::Result<Fulfiller> {
    validate_config(config).context("validating configuration")?;
    let clients = clients.with_config(FulfillmentConfig::from(config));
    Fulfiller::new(clients).context("assembling pipelines")
}
