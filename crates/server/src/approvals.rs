//! Callback routes hit from the approve/reject links in verification emails.
//!
//! - `GET /api/approve/{ticket_id}`  - approve, resume the agent, HTML confirmation
//! - `GET /api/reject/{ticket_id}`   - reject, resume the agent, HTML confirmation
//! - `GET /api/status/{ticket_id}`   - ticket status (JSON)
//! - `GET /api/pending`              - pending tickets (JSON)
//! - `GET /api/approvals/pending`    - pending tickets including their status

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use claimcheck_core::{
    ApplicationError, ApprovalTicket, ClaimId, TicketError, TicketId, TicketStatus, TicketStore,
};
use serde::Serialize;
use tracing::info;

use crate::api::ApiError;
use crate::pages::DecisionPages;
use crate::resume::AgentResumer;

pub const APPROVER_NOTES: &str = "Approved via email link";
pub const REJECTION_REASON: &str = "Rejected via email link";

#[derive(Clone)]
pub struct ApprovalState {
    pub store: Arc<dyn TicketStore>,
    pub resumer: Arc<dyn AgentResumer>,
    pub pages: Arc<DecisionPages>,
}

#[derive(Debug, Serialize)]
pub struct TicketStatusResponse {
    pub ticket_id: TicketId,
    pub claim_id: ClaimId,
    pub status: TicketStatus,
    pub request_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PendingApproval {
    pub ticket_id: TicketId,
    pub claim_id: ClaimId,
    pub user_email: String,
    pub request_type: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub count: usize,
    pub pending_approvals: Vec<PendingApproval>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn note(self) -> &'static str {
        match self {
            Self::Approve => APPROVER_NOTES,
            Self::Reject => REJECTION_REASON,
        }
    }
}

pub fn router(state: ApprovalState) -> Router {
    Router::new()
        .route("/api/approve/{ticket_id}", get(approve_ticket))
        .route("/api/reject/{ticket_id}", get(reject_ticket))
        .route("/api/status/{ticket_id}", get(ticket_status))
        .route("/api/pending", get(pending_tickets))
        .route("/api/approvals/pending", get(pending_tickets_with_status))
        .with_state(state)
}

async fn approve_ticket(
    Path(ticket_id): Path<String>,
    State(state): State<ApprovalState>,
) -> Result<Html<String>, ApiError> {
    decide(&state, TicketId(ticket_id), Decision::Approve).await
}

async fn reject_ticket(
    Path(ticket_id): Path<String>,
    State(state): State<ApprovalState>,
) -> Result<Html<String>, ApiError> {
    decide(&state, TicketId(ticket_id), Decision::Reject).await
}

async fn decide(
    state: &ApprovalState,
    ticket_id: TicketId,
    decision: Decision,
) -> Result<Html<String>, ApiError> {
    let note = Some(decision.note().to_string());
    let result = match decision {
        Decision::Approve => state.store.approve(&ticket_id, note).await,
        Decision::Reject => state.store.reject(&ticket_id, note).await,
    };

    match result {
        Ok(ticket) => {
            let outcome = state.resumer.resume(&ticket).await;
            info!(
                event_name = "approvals.decision.recorded",
                correlation_id = %ticket.ticket_id,
                claim_id = %ticket.claim_id,
                status = %ticket.status,
                agent_resumed = outcome.is_delivered(),
                "customer decision recorded"
            );
            render_page(state, &ticket, false)
        }
        Err(TicketError::AlreadyResolved { status, .. }) => {
            let ticket = state
                .store
                .get(&ticket_id)
                .await
                .map_err(|error| ApiError::new(error, ticket_id.as_str()))?
                .ok_or_else(|| {
                    ApiError::new(TicketError::NotFound(ticket_id.clone()), ticket_id.as_str())
                })?;
            info!(
                event_name = "approvals.decision.repeated",
                correlation_id = %ticket_id,
                requested = ?decision,
                recorded = %status,
                "ticket already resolved; agent not resumed again"
            );
            render_page(state, &ticket, true)
        }
        Err(error) => Err(ApiError::new(error, ticket_id.as_str())),
    }
}

fn render_page(
    state: &ApprovalState,
    ticket: &ApprovalTicket,
    already_recorded: bool,
) -> Result<Html<String>, ApiError> {
    state.pages.render(ticket, already_recorded).map(Html).map_err(|error| {
        ApiError::new(ApplicationError::Configuration(error.to_string()), ticket.ticket_id.as_str())
    })
}

async fn ticket_status(
    Path(ticket_id): Path<String>,
    State(state): State<ApprovalState>,
) -> Result<Json<TicketStatusResponse>, ApiError> {
    let ticket_id = TicketId(ticket_id);
    let ticket = state
        .store
        .get(&ticket_id)
        .await
        .map_err(|error| ApiError::new(error, ticket_id.as_str()))?
        .ok_or_else(|| {
            ApiError::new(TicketError::NotFound(ticket_id.clone()), ticket_id.as_str())
        })?;

    Ok(Json(TicketStatusResponse {
        ticket_id: ticket.ticket_id,
        claim_id: ticket.claim_id,
        status: ticket.status,
        request_type: ticket.request_type,
        created_at: ticket.created_at,
        updated_at: ticket.updated_at,
    }))
}

async fn pending_tickets(
    State(state): State<ApprovalState>,
) -> Result<Json<PendingResponse>, ApiError> {
    list_pending(&state, false).await.map(Json)
}

async fn pending_tickets_with_status(
    State(state): State<ApprovalState>,
) -> Result<Json<PendingResponse>, ApiError> {
    list_pending(&state, true).await.map(Json)
}

async fn list_pending(
    state: &ApprovalState,
    include_status: bool,
) -> Result<PendingResponse, ApiError> {
    let pending =
        state.store.list_pending().await.map_err(|error| ApiError::new(error, "pending"))?;
    let pending_approvals: Vec<PendingApproval> = pending
        .into_iter()
        .map(|ticket| PendingApproval {
            status: include_status.then_some(ticket.status),
            ticket_id: ticket.ticket_id,
            claim_id: ticket.claim_id,
            user_email: ticket.user_email,
            request_type: ticket.request_type,
            created_at: ticket.created_at,
        })
        .collect();

    Ok(PendingResponse { count: pending_approvals.len(), pending_approvals })
}
