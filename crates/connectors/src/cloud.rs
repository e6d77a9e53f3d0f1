use async_trait::async_trait;
use cloud_orders_types::{
    Account, AccountCreationFailure, AccountCreationState, AccountCreationStatus, AccountStatus,
    Handshake, HandshakeState, Organization, Tags,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::CloudError;

/// Cloud-provider control plane, authenticated against one account and role
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Start asynchronous creation of a linked account; returns the request id.
    /// `role_name` is provisioned in the new account for later access.
    async fn create_linked_account(
        &self,
        email: &str,
        account_name: &str,
        role_name: &str,
    ) -> Result<String, CloudError>;

    async fn get_account_creation_status(
        &self,
        request_id: &str,
    ) -> Result<AccountCreationStatus, CloudError>;

    /// Accounts in the organization managed by this account
    async fn list_accounts(&self) -> Result<Vec<Account>, CloudError>;

    async fn close_account(&self, account_id: &str) -> Result<(), CloudError>;

    async fn remove_account_from_organization(&self, account_id: &str)
        -> Result<(), CloudError>;

    async fn list_handshakes(&self) -> Result<Vec<Handshake>, CloudError>;

    async fn invite_account_to_organization(
        &self,
        account_id: &str,
        notes: &str,
    ) -> Result<Handshake, CloudError>;

    async fn cancel_handshake(&self, handshake_id: &str) -> Result<Handshake, CloudError>;

    async fn tag_resource(&self, resource_id: &str, tags: Tags) -> Result<(), CloudError>;

    /// Organization this account manages, if any
    async fn describe_organization(&self) -> Result<Option<Organization>, CloudError>;

    async fn create_organization(&self) -> Result<Organization, CloudError>;
}

/// Produces clients scoped to an account by assuming a named role in it
#[async_trait]
pub trait CloudClientFactory: Send + Sync {
    async fn connect(
        &self,
        account_id: &str,
        role_name: &str,
    ) -> Result<Arc<dyn CloudClient>, CloudError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// MOCK PROVIDER
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
struct CloudState {
    accounts: Vec<Account>,
    handshakes: Vec<Handshake>,
    requests: HashMap<String, AccountCreationStatus>,
    organization: Option<Organization>,
    tags: HashMap<String, Tags>,
    failures: HashMap<String, CloudError>,
    calls: Vec<String>,
    next_id: u64,
}

impl CloudState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Record the call and return an injected failure for it, if any.
    /// Failures keyed by `operation:target` win over plain `operation`.
    fn enter(&mut self, operation: &str, target: &str) -> Result<(), CloudError> {
        self.calls.push(format!("{operation}:{target}"));
        let keyed = self.failures.get(&format!("{operation}:{target}"));
        match keyed.or_else(|| self.failures.get(operation)) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// In-memory cloud provider for tests and local runs
#[derive(Debug, Clone)]
pub struct MockCloud {
    master_account_id: String,
    state: Arc<RwLock<CloudState>>,
}

impl MockCloud {
    pub fn new(master_account_id: impl Into<String>) -> Self {
        Self {
            master_account_id: master_account_id.into(),
            state: Arc::new(RwLock::new(CloudState::default())),
        }
    }

    pub async fn with_account(self, account_id: &str, status: AccountStatus) -> Self {
        self.state
            .write()
            .await
            .accounts
            .push(Account::new(account_id, status));
        self
    }

    pub async fn with_handshake(self, account_id: &str, state: HandshakeState) -> Self {
        {
            let mut cloud = self.state.write().await;
            let id = cloud.next_id("h");
            cloud
                .handshakes
                .push(Handshake::new(id, state, account_id));
        }
        self
    }

    pub async fn with_organization(self) -> Self {
        self.state.write().await.organization = Some(Organization {
            id: format!("o-{}", self.master_account_id),
            master_account_id: self.master_account_id.clone(),
        });
        self
    }

    /// Make every later `operation` call (optionally only for `target`) fail
    pub async fn fail_on(&self, operation: &str, target: Option<&str>, error: CloudError) {
        let key = match target {
            Some(target) => format!("{operation}:{target}"),
            None => operation.to_string(),
        };
        self.state.write().await.failures.insert(key, error);
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    /// Resolve a pending creation request successfully
    pub async fn complete_request(&self, request_id: &str, account_id: &str) {
        let mut cloud = self.state.write().await;
        if let Some(request) = cloud.requests.get_mut(request_id) {
            request.state = AccountCreationState::Succeeded;
            request.account_id = Some(account_id.to_string());
        }
        cloud
            .accounts
            .push(Account::new(account_id, AccountStatus::Active));
    }

    pub async fn fail_request(&self, request_id: &str, reason: AccountCreationFailure) {
        if let Some(request) = self.state.write().await.requests.get_mut(request_id) {
            request.state = AccountCreationState::Failed;
            request.failure_reason = Some(reason);
        }
    }

    /// Move the invitation addressed to `account_id` into `state`
    pub async fn set_handshake_state(&self, account_id: &str, state: HandshakeState) {
        let mut cloud = self.state.write().await;
        for handshake in cloud
            .handshakes
            .iter_mut()
            .filter(|h| h.target_account_id == account_id && h.state.is_live())
        {
            handshake.state = state;
        }
    }

    pub async fn set_account_status(&self, account_id: &str, status: AccountStatus) {
        let mut cloud = self.state.write().await;
        match cloud.accounts.iter_mut().find(|a| a.id == account_id) {
            Some(account) => account.status = status,
            None => cloud.accounts.push(Account::new(account_id, status)),
        }
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.state.read().await.accounts.clone()
    }

    pub async fn handshakes(&self) -> Vec<Handshake> {
        self.state.read().await.handshakes.clone()
    }

    pub async fn organization(&self) -> Option<Organization> {
        self.state.read().await.organization.clone()
    }

    pub async fn tags(&self, resource_id: &str) -> Option<Tags> {
        self.state.read().await.tags.get(resource_id).cloned()
    }

    /// Calls made so far as `operation:target`
    pub async fn calls(&self) -> Vec<String> {
        self.state.read().await.calls.clone()
    }

    /// Number of calls to `operation`
    pub async fn call_count(&self, operation: &str) -> usize {
        let prefix = format!("{operation}:");
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }
}

#[async_trait]
impl CloudClient for MockCloud {
    async fn create_linked_account(
        &self,
        email: &str,
        _account_name: &str,
        _role_name: &str,
    ) -> Result<String, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("create_linked_account", email)?;
        let request_id = cloud.next_id("car");
        cloud.requests.insert(
            request_id.clone(),
            AccountCreationStatus {
                request_id: request_id.clone(),
                state: AccountCreationState::InProgress,
                account_id: None,
                failure_reason: None,
            },
        );
        Ok(request_id)
    }

    async fn get_account_creation_status(
        &self,
        request_id: &str,
    ) -> Result<AccountCreationStatus, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("get_account_creation_status", request_id)?;
        cloud
            .requests
            .get(request_id)
            .cloned()
            .ok_or_else(|| CloudError::RequestNotFound(request_id.to_string()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("list_accounts", &self.master_account_id)?;
        Ok(cloud.accounts.clone())
    }

    async fn close_account(&self, account_id: &str) -> Result<(), CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("close_account", account_id)?;
        let account = cloud
            .accounts
            .iter_mut()
            .find(|a| a.id == account_id)
            .ok_or_else(|| CloudError::AccountNotFound(account_id.to_string()))?;
        account.status = AccountStatus::PendingClosure;
        Ok(())
    }

    async fn remove_account_from_organization(
        &self,
        account_id: &str,
    ) -> Result<(), CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("remove_account_from_organization", account_id)?;
        let before = cloud.accounts.len();
        cloud.accounts.retain(|a| a.id != account_id);
        if cloud.accounts.len() == before {
            return Err(CloudError::AccountNotFound(account_id.to_string()));
        }
        Ok(())
    }

    async fn list_handshakes(&self) -> Result<Vec<Handshake>, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("list_handshakes", &self.master_account_id)?;
        Ok(cloud.handshakes.clone())
    }

    async fn invite_account_to_organization(
        &self,
        account_id: &str,
        _notes: &str,
    ) -> Result<Handshake, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("invite_account_to_organization", account_id)?;
        let id = cloud.next_id("h");
        let handshake = Handshake::new(id, HandshakeState::Open, account_id);
        cloud.handshakes.push(handshake.clone());
        Ok(handshake)
    }

    async fn cancel_handshake(&self, handshake_id: &str) -> Result<Handshake, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("cancel_handshake", handshake_id)?;
        let handshake = cloud
            .handshakes
            .iter_mut()
            .find(|h| h.id == handshake_id)
            .ok_or_else(|| CloudError::HandshakeNotFound(handshake_id.to_string()))?;
        handshake.state = HandshakeState::Canceled;
        Ok(handshake.clone())
    }

    async fn tag_resource(&self, resource_id: &str, tags: Tags) -> Result<(), CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("tag_resource", resource_id)?;
        cloud
            .tags
            .entry(resource_id.to_string())
            .or_default()
            .extend(tags);
        Ok(())
    }

    async fn describe_organization(&self) -> Result<Option<Organization>, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("describe_organization", &self.master_account_id)?;
        Ok(cloud.organization.clone())
    }

    async fn create_organization(&self) -> Result<Organization, CloudError> {
        let mut cloud = self.state.write().await;
        cloud.enter("create_organization", &self.master_account_id)?;
        let organization = Organization {
            id: format!("o-{}", self.master_account_id),
            master_account_id: self.master_account_id.clone(),
        };
        cloud.organization = Some(organization.clone());
        Ok(organization)
    }
}

/// Factory handing out one shared [`MockCloud`] and recording each connect
#[derive(Debug, Clone)]
pub struct MockCloudFactory {
    cloud: MockCloud,
    connections: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockCloudFactory {
    pub fn new(cloud: MockCloud) -> Self {
        Self {
            cloud,
            connections: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// `(account_id, role_name)` pairs connected to so far
    pub async fn connections(&self) -> Vec<(String, String)> {
        self.connections.read().await.clone()
    }
}

#[async_trait]
impl CloudClientFactory for MockCloudFactory {
    async fn connect(
        &self,
        account_id: &str,
        role_name: &str,
    ) -> Result<Arc<dyn CloudClient>, CloudError> {
        self.connections
            .write()
            .await
            .push((account_id.to_string(), role_name.to_string()));
        Ok(Arc::new(self.cloud.clone()))
    }
}
