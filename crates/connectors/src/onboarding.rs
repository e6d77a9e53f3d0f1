use async_trait::async_trait;
use cloud_orders_types::OnboardingStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::OnboardingError;

/// Vendor partner onboarding of a seller-managed master account
#[async_trait]
pub trait OnboardingClient: Send + Sync {
    /// Begin onboarding; returns the engagement id
    async fn start_onboarding(
        &self,
        master_account_id: &str,
        order_id: &str,
    ) -> Result<String, OnboardingError>;

    async fn get_onboarding_status(
        &self,
        engagement_id: &str,
    ) -> Result<OnboardingStatus, OnboardingError>;
}

/// Onboarding service whose engagements complete when told to
#[derive(Debug, Clone, Default)]
pub struct MockOnboarding {
    engagements: Arc<RwLock<HashMap<String, OnboardingStatus>>>,
}

impl MockOnboarding {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_status(&self, engagement_id: &str, status: OnboardingStatus) {
        self.engagements
            .write()
            .await
            .insert(engagement_id.to_string(), status);
    }

    /// Resolve every engagement with `status`
    pub async fn settle_all(&self, status: OnboardingStatus) {
        for value in self.engagements.write().await.values_mut() {
            *value = status;
        }
    }

    pub async fn started(&self) -> usize {
        self.engagements.read().await.len()
    }
}

#[async_trait]
impl OnboardingClient for MockOnboarding {
    async fn start_onboarding(
        &self,
        master_account_id: &str,
        order_id: &str,
    ) -> Result<String, OnboardingError> {
        let engagement_id = format!("ccp-{master_account_id}-{order_id}");
        self.engagements
            .write()
            .await
            .insert(engagement_id.clone(), OnboardingStatus::Running);
        Ok(engagement_id)
    }

    async fn get_onboarding_status(
        &self,
        engagement_id: &str,
    ) -> Result<OnboardingStatus, OnboardingError> {
        self.engagements
            .read()
            .await
            .get(engagement_id)
            .copied()
            .ok_or_else(|| OnboardingError::NotFound(engagement_id.to_string()))
    }
}
