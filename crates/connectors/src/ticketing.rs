use async_trait::async_trait;
use cloud_orders_types::{ServiceRequest, Ticket};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::TicketError;

/// Service-desk API used for steps that need a human operator
#[async_trait]
pub trait TicketClient: Send + Sync {
    async fn create_service_request(
        &self,
        order_id: &str,
        request: &ServiceRequest,
    ) -> Result<Ticket, TicketError>;

    async fn get_service_request(
        &self,
        order_id: &str,
        ticket_id: &str,
    ) -> Result<Ticket, TicketError>;
}

/// Ticket desk kept in memory; new tickets start in `initial_state`
#[derive(Debug, Clone)]
pub struct InMemoryTicketDesk {
    initial_state: String,
    tickets: Arc<RwLock<HashMap<String, (String, ServiceRequest, Ticket)>>>,
}

impl Default for InMemoryTicketDesk {
    fn default() -> Self {
        Self::new("New")
    }
}

impl InMemoryTicketDesk {
    pub fn new(initial_state: impl Into<String>) -> Self {
        Self {
            initial_state: initial_state.into(),
            tickets: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn set_state(&self, ticket_id: &str, state: &str) -> Result<(), TicketError> {
        let mut tickets = self.tickets.write().await;
        let (_, _, ticket) = tickets
            .get_mut(ticket_id)
            .ok_or_else(|| TicketError::NotFound(ticket_id.to_string()))?;
        ticket.state = state.to_string();
        Ok(())
    }

    /// Requests opened for an order
    pub async fn requests_for(&self, order_id: &str) -> Vec<ServiceRequest> {
        self.tickets
            .read()
            .await
            .values()
            .filter(|(owner, _, _)| owner == order_id)
            .map(|(_, request, _)| request.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }
}

#[async_trait]
impl TicketClient for InMemoryTicketDesk {
    async fn create_service_request(
        &self,
        order_id: &str,
        request: &ServiceRequest,
    ) -> Result<Ticket, TicketError> {
        let mut tickets = self.tickets.write().await;
        let ticket = Ticket {
            id: format!("TKT-{:04}", tickets.len() + 1),
            state: self.initial_state.clone(),
        };
        tickets.insert(
            ticket.id.clone(),
            (order_id.to_string(), request.clone(), ticket.clone()),
        );
        Ok(ticket)
    }

    async fn get_service_request(
        &self,
        order_id: &str,
        ticket_id: &str,
    ) -> Result<Ticket, TicketError> {
        self.tickets
            .read()
            .await
            .get(ticket_id)
            .filter(|(owner, _, _)| owner == order_id)
            .map(|(_, _, ticket)| ticket.clone())
            .ok_or_else(|| TicketError::NotFound(ticket_id.to_string()))
    }
}
