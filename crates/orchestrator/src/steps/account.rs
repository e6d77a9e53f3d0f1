use async_trait::async_trait;
use cloud_orders_types::{
    param, AccountCreationFailure, AccountCreationState, ParameterError, Phase, Tags,
    ERR_EMAIL_ALREADY_EXISTS, ERR_INVALID_EMAIL, ERR_MISSING_PARAMETER,
};
use tracing::{error, info};

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Creates a linked account from the buyer's email and account name.
///
/// Account creation is asynchronous at the provider: the first
/// invocation issues the request and halts, later ones poll it.
pub struct CreateLinkedAccount {
    optional: bool,
}

impl CreateLinkedAccount {
    pub fn new() -> Self {
        Self { optional: false }
    }

    /// Variant that advances without work when the buyer supplied neither
    /// email nor account name
    pub fn optional() -> Self {
        Self { optional: true }
    }

    async fn poll_request(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
        request_id: String,
    ) -> Result<StepOutcome, FulfillmentError> {
        let cloud = ctx.cloud(clients).await?;
        let status = cloud.get_account_creation_status(&request_id).await?;

        match status.state {
            AccountCreationState::InProgress => {
                info!(order_id = %ctx.order_id(), request_id = %request_id, "Account creation in progress");
                Ok(StepOutcome::Halt)
            }
            AccountCreationState::Succeeded => {
                let account_id = status.account_id.ok_or_else(|| {
                    FulfillmentError::missing_parameter(ctx.order_id(), param::CREATED_ACCOUNT_ID)
                })?;

                let tags = Tags::from([
                    ("orderId".to_string(), ctx.order_id().to_string()),
                    ("agreementId".to_string(), ctx.agreement.id.clone()),
                ]);
                cloud.tag_resource(&account_id, tags).await?;

                ctx.parameters_mut()
                    .set_fulfillment_value(param::CREATED_ACCOUNT_ID, Some(account_id.clone()));
                clients.record(|m| m.record_account_operation("create_linked_account", true));
                info!(order_id = %ctx.order_id(), account_id = %account_id, "Linked account created");

                ctx.advance_to_next_phase(clients).await?;
                Ok(StepOutcome::Continue)
            }
            AccountCreationState::Failed => {
                clients.record(|m| m.record_account_operation("create_linked_account", false));
                let email = ctx
                    .parameters()
                    .ordering_value(param::ROOT_ACCOUNT_EMAIL)
                    .unwrap_or_default()
                    .to_string();

                let buyer_error = match status.failure_reason {
                    Some(AccountCreationFailure::EmailAlreadyExists) => {
                        ParameterError::email_already_exists(&email)
                    }
                    Some(AccountCreationFailure::InvalidEmail) => {
                        ParameterError::invalid_email(&email)
                    }
                    other => {
                        error!(
                            order_id = %ctx.order_id(),
                            request_id = %request_id,
                            reason = ?other,
                            error_type = "account_creation_failed",
                            "Account creation failed"
                        );
                        return Ok(StepOutcome::Halt);
                    }
                };

                // Forget the request so a corrected email issues a new one.
                let parameters = ctx.parameters_mut();
                parameters.set_fulfillment_value(param::ACCOUNT_REQUEST_ID, None);
                parameters.set_ordering_error(param::ROOT_ACCOUNT_EMAIL, Some(buyer_error.clone()));
                ctx.divert_to_querying(clients, buyer_error).await
            }
        }
    }

    async fn request_account(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        let email = ctx
            .parameters()
            .ordering_value(param::ROOT_ACCOUNT_EMAIL)
            .map(str::to_string);
        let name = ctx
            .parameters()
            .ordering_value(param::ACCOUNT_NAME)
            .map(str::to_string);

        let (email, name) = match (email, name) {
            (None, None) if self.optional => {
                info!(order_id = %ctx.order_id(), "No linked account requested");
                ctx.advance_to_next_phase(clients).await?;
                return Ok(StepOutcome::Continue);
            }
            (Some(email), Some(name)) => (email, name),
            (email, name) => {
                let mut first = None;
                for (external_id, title, value) in [
                    (param::ROOT_ACCOUNT_EMAIL, "Root account email", &email),
                    (param::ACCOUNT_NAME, "Account name", &name),
                ] {
                    if value.is_none() {
                        let error = ParameterError::missing_parameter(title);
                        ctx.parameters_mut()
                            .set_ordering_error(external_id, Some(error.clone()));
                        first.get_or_insert(error);
                    }
                }
                return match first {
                    Some(error) => ctx.divert_to_querying(clients, error).await,
                    None => Ok(StepOutcome::Halt),
                };
            }
        };

        if ctx.is_querying() {
            // Buyer has not touched the rejected email yet.
            let rejected = ctx.parameters().ordering_error(param::ROOT_ACCOUNT_EMAIL);
            let unchanged = rejected.is_some_and(|e| {
                *e == ParameterError::email_already_exists(&email)
                    || *e == ParameterError::invalid_email(&email)
            });
            if unchanged {
                return Ok(StepOutcome::Halt);
            }
            ctx.resume_if_diverted_by(
                clients,
                &[ERR_EMAIL_ALREADY_EXISTS, ERR_INVALID_EMAIL, ERR_MISSING_PARAMETER],
            )
            .await?;
        }

        let cloud = ctx.cloud(clients).await?;
        let request_id = cloud
            .create_linked_account(&email, &name, &clients.config.linked_account_role_name)
            .await?;

        ctx.save_fulfillment_value(clients, param::ACCOUNT_REQUEST_ID, Some(request_id.clone()))
            .await?;
        info!(
            order_id = %ctx.order_id(),
            request_id = %request_id,
            "Requested linked account"
        );
        Ok(StepOutcome::Halt)
    }
}

impl Default for CreateLinkedAccount {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Step for CreateLinkedAccount {
    fn name(&self) -> &'static str {
        if self.optional {
            "create_linked_account_optional"
        } else {
            "create_linked_account"
        }
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::CreateAccount]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::CreateAccount)? {
            return Ok(StepOutcome::Continue);
        }

        match ctx
            .parameters()
            .fulfillment_value(param::ACCOUNT_REQUEST_ID)
            .map(str::to_string)
        {
            Some(request_id) => self.poll_request(clients, ctx, request_id).await,
            None => self.request_account(clients, ctx).await,
        }
    }
}
