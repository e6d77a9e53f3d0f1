use async_trait::async_trait;
use cloud_orders_types::Order;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::NotifyError;

/// Operator-channel report for a fulfillment that raised an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub order_id: String,

    /// Error text with its cause chain, trace identifiers already redacted
    pub trace: String,
}

/// Outbound notifications; rendering and delivery live elsewhere
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the buyer their order needs input
    async fn notify_querying(&self, order: &Order) -> Result<(), NotifyError>;

    async fn report_failure(&self, report: FailureReport) -> Result<(), NotifyError>;
}

/// Notifier that keeps what it was asked to send
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    queried: Arc<RwLock<Vec<Order>>>,
    failures: Arc<RwLock<Vec<FailureReport>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn queried(&self) -> Vec<Order> {
        self.queried.read().await.clone()
    }

    pub async fn failures(&self) -> Vec<FailureReport> {
        self.failures.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_querying(&self, order: &Order) -> Result<(), NotifyError> {
        self.queried.write().await.push(order.clone());
        Ok(())
    }

    async fn report_failure(&self, report: FailureReport) -> Result<(), NotifyError> {
        self.failures.write().await.push(report);
        Ok(())
    }
}
