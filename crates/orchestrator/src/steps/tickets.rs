//! Service tickets for work an operator finishes by hand

use async_trait::async_trait;
use cloud_orders_types::{param, Phase, ServiceRequest, ServiceRequestKind};
use tracing::info;

use super::in_phase;
use crate::{Clients, FulfillmentError, OrderContext, Step, StepOutcome};

/// Opens a ticket if none is recorded yet, returning its id
async fn open_ticket(
    clients: &Clients,
    ctx: &mut OrderContext,
    ticket_param: &'static str,
    request: ServiceRequest,
) -> Result<String, FulfillmentError> {
    if let Some(ticket_id) = ctx.parameters().fulfillment_value(ticket_param) {
        return Ok(ticket_id.to_string());
    }

    let ticket = clients
        .tickets
        .create_service_request(ctx.order_id(), &request)
        .await?;
    ctx.save_fulfillment_value(clients, ticket_param, Some(ticket.id.clone()))
        .await?;
    info!(
        order_id = %ctx.order_id(),
        ticket_id = %ticket.id,
        kind = ?request.kind,
        "Opened service ticket"
    );
    Ok(ticket.id)
}

/// Whether the recorded ticket reached the resolved state
async fn ticket_resolved(
    clients: &Clients,
    ctx: &OrderContext,
    ticket_param: &'static str,
) -> Result<bool, FulfillmentError> {
    let ticket_id = ctx
        .parameters()
        .fulfillment_value(ticket_param)
        .ok_or_else(|| FulfillmentError::missing_parameter(ctx.order_id(), ticket_param))?;
    let ticket = clients
        .tickets
        .get_service_request(ctx.order_id(), ticket_id)
        .await?;

    let resolved = ticket.state == clients.config.resolved_ticket_state;
    info!(
        order_id = %ctx.order_id(),
        ticket_id = %ticket.id,
        state = %ticket.state,
        resolved,
        "Polled service ticket"
    );
    Ok(resolved)
}

// ═══════════════════════════════════════════════════════════════════════════
// ORGANIZATION TRANSFER
// ═══════════════════════════════════════════════════════════════════════════

/// Asks operations to move the buyer's organization under the seller
pub struct CreateTransferTicket;

#[async_trait]
impl Step for CreateTransferTicket {
    fn name(&self) -> &'static str {
        "create_transfer_ticket"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::PreconfigurationMpa]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::PreconfigurationMpa)? {
            return Ok(StepOutcome::Continue);
        }

        let master_payer = ctx
            .master_payer_id()
            .ok_or_else(|| FulfillmentError::missing_parameter(ctx.order_id(), param::MASTER_PAYER_ID))?
            .to_string();
        let accounts: Vec<String> = ctx.target_account_ids().into_iter().collect();

        let request = ServiceRequest {
            kind: ServiceRequestKind::TransferOrganization,
            service_type: clients.config.ticket_service_type.clone(),
            summary: format!("Transfer organization of master payer {master_payer}"),
            additional_info: format!(
                "Order: {}\nAgreement: {}\nMaster payer: {}\nAccounts: {}",
                ctx.order_id(),
                ctx.agreement.id,
                master_payer,
                if accounts.is_empty() {
                    "all".to_string()
                } else {
                    accounts.join(", ")
                }
            ),
        };
        open_ticket(clients, ctx, param::TRANSFER_TICKET_ID, request).await?;

        ctx.advance_to_next_phase(clients).await?;
        Ok(StepOutcome::Continue)
    }
}

/// Waits for operations to resolve the transfer ticket
pub struct AwaitTransferTicket;

#[async_trait]
impl Step for AwaitTransferTicket {
    fn name(&self) -> &'static str {
        "await_transfer_ticket"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::CheckInvitationLink]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::CheckInvitationLink)? {
            return Ok(StepOutcome::Continue);
        }

        if ticket_resolved(clients, ctx, param::TRANSFER_TICKET_ID).await? {
            Ok(StepOutcome::Continue)
        } else {
            Ok(StepOutcome::Halt)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TERMINATION
// ═══════════════════════════════════════════════════════════════════════════

/// Asks operations to finish decommissioning the terminated accounts
pub struct CreateTerminationTicket;

#[async_trait]
impl Step for CreateTerminationTicket {
    fn name(&self) -> &'static str {
        "create_termination_ticket"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::TerminateAccount]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::TerminateAccount)?
            || ctx
                .parameters()
                .fulfillment_value(param::TERMINATION_TICKET_ID)
                .is_some()
        {
            return Ok(StepOutcome::Continue);
        }

        let accounts: Vec<String> = ctx.accounts_slated_for_termination().into_iter().collect();
        if accounts.is_empty() {
            return Err(FulfillmentError::missing_parameter(
                ctx.order_id(),
                "subscriptions",
            ));
        }

        let termination = ctx.termination_type();
        let request = ServiceRequest {
            kind: ServiceRequestKind::TerminateAccounts,
            service_type: clients.config.ticket_service_type.clone(),
            summary: format!("Terminate {} account(s)", accounts.len()),
            additional_info: format!(
                "Order: {}\nAgreement: {}\nTermination type: {}\nAccounts: {}",
                ctx.order_id(),
                ctx.agreement.id,
                termination.as_str(),
                accounts.join(", ")
            ),
        };
        open_ticket(clients, ctx, param::TERMINATION_TICKET_ID, request).await?;
        Ok(StepOutcome::Continue)
    }
}

/// Waits for the termination ticket, then moves the order to Completed
pub struct AwaitTerminationTicket;

#[async_trait]
impl Step for AwaitTerminationTicket {
    fn name(&self) -> &'static str {
        "await_termination_ticket"
    }

    fn phases(&self) -> &[Phase] {
        &[Phase::TerminateAccount]
    }

    async fn apply(
        &self,
        clients: &Clients,
        ctx: &mut OrderContext,
    ) -> Result<StepOutcome, FulfillmentError> {
        if !in_phase(ctx, Phase::TerminateAccount)? {
            return Ok(StepOutcome::Continue);
        }

        if !ticket_resolved(clients, ctx, param::TERMINATION_TICKET_ID).await? {
            return Ok(StepOutcome::Halt);
        }
        ctx.advance_phase(clients, Phase::Completed).await?;
        Ok(StepOutcome::Continue)
    }
}
