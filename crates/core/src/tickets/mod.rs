//! Approval ticket lifecycle.
//!
//! A ticket starts `pending` and moves exactly once to `approved` or
//! `rejected`. Stores must apply that transition atomically so that a repeated
//! or concurrent second attempt is refused with [`TicketError::AlreadyResolved`]
//! instead of being reapplied; callers rely on this to resume the suspended
//! agent call at most once.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::approval::{ApprovalTicket, NewTicket, TicketId, TicketStatus};
use crate::errors::{ApplicationError, DomainError};

pub mod memory;

pub use memory::InMemoryTicketStore;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TicketError {
    #[error("ticket `{0}` not found")]
    NotFound(TicketId),
    #[error("ticket `{ticket_id}` is already {status}")]
    AlreadyResolved { ticket_id: TicketId, status: TicketStatus },
    #[error("ticket `{0}` already exists")]
    Duplicate(TicketId),
    #[error("ticket storage failure: {0}")]
    Storage(String),
}

impl From<TicketError> for ApplicationError {
    fn from(value: TicketError) -> Self {
        match value {
            TicketError::NotFound(ticket_id) => {
                DomainError::TicketNotFound { ticket_id: ticket_id.0 }.into()
            }
            TicketError::AlreadyResolved { ticket_id, status } => {
                DomainError::TicketAlreadyResolved { ticket_id: ticket_id.0, status }.into()
            }
            TicketError::Duplicate(ticket_id) => {
                Self::Persistence(format!("ticket `{ticket_id}` already exists"))
            }
            TicketError::Storage(message) => Self::Persistence(message),
        }
    }
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create(&self, request: NewTicket) -> Result<TicketId, TicketError>;

    /// Opens a pending ticket under an id the caller generated up front, so the
    /// id can appear in content built before the ticket is stored.
    async fn insert(&self, ticket_id: TicketId, request: NewTicket) -> Result<(), TicketError>;

    async fn get(&self, ticket_id: &TicketId) -> Result<Option<ApprovalTicket>, TicketError>;

    async fn approve(
        &self,
        ticket_id: &TicketId,
        notes: Option<String>,
    ) -> Result<ApprovalTicket, TicketError>;

    async fn reject(
        &self,
        ticket_id: &TicketId,
        reason: Option<String>,
    ) -> Result<ApprovalTicket, TicketError>;

    /// Pending tickets ordered by creation time, then ticket id.
    async fn list_pending(&self) -> Result<Vec<ApprovalTicket>, TicketError>;
}
