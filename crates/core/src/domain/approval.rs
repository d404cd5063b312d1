use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::claim::{Claim, ClaimId};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub String);

impl TicketId {
    pub fn generate() -> Self {
        Self(format!("TKT-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TicketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Pending,
    Approved,
    Rejected,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies the agent session that is suspended on a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketMetadata {
    pub claim: Option<Claim>,
    pub session_info: Option<SessionInfo>,
}

/// Everything the caller supplies when opening a ticket.
#[derive(Clone, Debug, PartialEq)]
pub struct NewTicket {
    pub claim_id: ClaimId,
    pub user_email: String,
    pub request_type: String,
    pub function_call_id: Option<String>,
    pub session_info: Option<SessionInfo>,
    pub claim: Option<Claim>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApprovalTicket {
    pub ticket_id: TicketId,
    pub claim_id: ClaimId,
    pub user_email: String,
    pub request_type: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub function_call_id: Option<String>,
    pub metadata: TicketMetadata,
    pub approver_notes: Option<String>,
    pub rejection_reason: Option<String>,
}

impl ApprovalTicket {
    pub fn open(ticket_id: TicketId, request: NewTicket, now: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            claim_id: request.claim_id,
            user_email: request.user_email,
            request_type: request.request_type,
            status: TicketStatus::Pending,
            created_at: now,
            updated_at: now,
            function_call_id: request.function_call_id,
            metadata: TicketMetadata { claim: request.claim, session_info: request.session_info },
            approver_notes: None,
            rejection_reason: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TicketStatus::Pending
    }

    /// Moves a pending ticket to `approved`. Returns `false` and leaves the
    /// record untouched when the ticket is already terminal.
    pub fn approve(&mut self, notes: Option<String>, now: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = TicketStatus::Approved;
        self.approver_notes = notes;
        self.updated_at = now;
        true
    }

    pub fn reject(&mut self, reason: Option<String>, now: DateTime<Utc>) -> bool {
        if !self.is_pending() {
            return false;
        }
        self.status = TicketStatus::Rejected;
        self.rejection_reason = reason;
        self.updated_at = now;
        true
    }

    /// Correlation data needed to resume the suspended agent call, if complete.
    pub fn resume_target(&self) -> Option<(&SessionInfo, &str)> {
        let session = self.metadata.session_info.as_ref()?;
        let function_call_id = self.function_call_id.as_deref().filter(|id| !id.is_empty())?;
        Some((session, function_call_id))
    }
}
