use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::approval::{ApprovalTicket, NewTicket, TicketId};

use super::{TicketError, TicketStore};

/// Process-local ticket store. Records do not survive a restart.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<TicketId, ApprovalTicket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.tickets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tickets.read().await.is_empty()
    }

    // The status check and the write happen under one write guard, so the
    // first caller to take the lock decides the terminal state.
    async fn transition(
        &self,
        ticket_id: &TicketId,
        apply: impl FnOnce(&mut ApprovalTicket, DateTime<Utc>) -> bool + Send,
    ) -> Result<ApprovalTicket, TicketError> {
        let mut tickets = self.tickets.write().await;
        let ticket =
            tickets.get_mut(ticket_id).ok_or_else(|| TicketError::NotFound(ticket_id.clone()))?;

        if !apply(&mut *ticket, Utc::now()) {
            debug!(
                event_name = "tickets.transition.refused",
                correlation_id = %ticket_id,
                status = %ticket.status,
                "ticket already resolved; transition refused"
            );
            return Err(TicketError::AlreadyResolved {
                ticket_id: ticket_id.clone(),
                status: ticket.status,
            });
        }

        info!(
            event_name = "tickets.transition.applied",
            correlation_id = %ticket_id,
            claim_id = %ticket.claim_id,
            status = %ticket.status,
            "ticket resolved"
        );
        Ok(ticket.clone())
    }
}

fn open_ticket(
    tickets: &mut HashMap<TicketId, ApprovalTicket>,
    ticket_id: TicketId,
    request: NewTicket,
) {
    let ticket = ApprovalTicket::open(ticket_id.clone(), request, Utc::now());
    info!(
        event_name = "tickets.created",
        correlation_id = %ticket_id,
        claim_id = %ticket.claim_id,
        request_type = %ticket.request_type,
        resumable = ticket.resume_target().is_some(),
        "approval ticket created"
    );
    tickets.insert(ticket_id, ticket);
}

#[async_trait::async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn create(&self, request: NewTicket) -> Result<TicketId, TicketError> {
        let mut tickets = self.tickets.write().await;
        let mut ticket_id = TicketId::generate();
        while tickets.contains_key(&ticket_id) {
            ticket_id = TicketId::generate();
        }

        open_ticket(&mut tickets, ticket_id.clone(), request);
        Ok(ticket_id)
    }

    async fn insert(&self, ticket_id: TicketId, request: NewTicket) -> Result<(), TicketError> {
        let mut tickets = self.tickets.write().await;
        if tickets.contains_key(&ticket_id) {
            return Err(TicketError::Duplicate(ticket_id));
        }
        open_ticket(&mut tickets, ticket_id, request);
        Ok(())
    }

    async fn get(&self, ticket_id: &TicketId) -> Result<Option<ApprovalTicket>, TicketError> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(ticket_id).cloned())
    }

    async fn approve(
        &self,
        ticket_id: &TicketId,
        notes: Option<String>,
    ) -> Result<ApprovalTicket, TicketError> {
        self.transition(ticket_id, move |ticket, now| ticket.approve(notes, now)).await
    }

    async fn reject(
        &self,
        ticket_id: &TicketId,
        reason: Option<String>,
    ) -> Result<ApprovalTicket, TicketError> {
        self.transition(ticket_id, move |ticket, now| ticket.reject(reason, now)).await
    }

    async fn list_pending(&self) -> Result<Vec<ApprovalTicket>, TicketError> {
        let tickets = self.tickets.read().await;
        let mut pending: Vec<ApprovalTicket> =
            tickets.values().filter(|ticket| ticket.is_pending()).cloned().collect();
        pending.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.ticket_id.0.cmp(&right.ticket_id.0))
        });
        Ok(pending)
    }
}
