use cloud_orders_connectors::{
    CloudClientFactory, Notifier, OnboardingClient, OrderStore, TicketClient,
};
use cloud_orders_metrics::MetricsCollector;
use std::sync::Arc;

use crate::FulfillmentConfig;

/// Handles to every external system plus the configuration, passed
/// explicitly into each step
#[derive(Clone)]
pub struct Clients {
    pub store: Arc<dyn OrderStore>,
    pub cloud: Arc<dyn CloudClientFactory>,
    pub tickets: Arc<dyn TicketClient>,
    pub onboarding: Arc<dyn OnboardingClient>,
    pub notifier: Arc<dyn Notifier>,
    pub config: FulfillmentConfig,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Clients {
    pub fn new(
        store: Arc<dyn OrderStore>,
        cloud: Arc<dyn CloudClientFactory>,
        tickets: Arc<dyn TicketClient>,
        onboarding: Arc<dyn OnboardingClient>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            cloud,
            tickets,
            onboarding,
            notifier,
            config: FulfillmentConfig::default(),
            metrics: None,
        }
    }

    pub fn with_config(mut self, config: FulfillmentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run `record` against the collector when metrics are enabled
    pub fn record(&self, record: impl FnOnce(&MetricsCollector)) {
        if let Some(metrics) = &self.metrics {
            record(metrics);
        }
    }
}
