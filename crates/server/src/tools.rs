//! Read-only lookups and ad-hoc notifications used by the agent's tools.
//!
//! - `GET  /api/claims/{claim_id}`
//! - `GET  /api/policies/{policy_number}`
//! - `POST /api/notifications`

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use claimcheck_core::{
    ApplicationError, Claim, ClaimDirectory, EmailTemplates, NotificationKind, NotificationSender,
    Policy,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiError;

#[derive(Clone)]
pub struct ToolState {
    pub claims: Arc<ClaimDirectory>,
    pub templates: Arc<EmailTemplates>,
    pub notifier: Arc<dyn NotificationSender>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClaimLookup {
    Found { claim: Claim },
    NotFound { message: String },
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PolicyLookup {
    Found { policy: PolicyView },
    NotFound { message: String },
}

#[derive(Debug, Serialize)]
pub struct PolicyView {
    #[serde(flatten)]
    pub policy: Policy,
    pub days_until_renewal: i64,
}

#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub recipient_email: String,
    pub subject: String,
    pub message: String,
    #[serde(default = "default_notification_type")]
    pub notification_type: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub recipient: String,
    pub subject: String,
    pub notification_type: NotificationKind,
    pub demo_mode: bool,
}

fn default_notification_type() -> String {
    NotificationKind::General.as_str().to_string()
}

pub fn router(state: ToolState) -> Router {
    Router::new()
        .route("/api/claims/{claim_id}", get(claim_status))
        .route("/api/policies/{policy_number}", get(policy_status))
        .route("/api/notifications", post(send_notification))
        .with_state(state)
}

pub fn lookup_claim(claims: &ClaimDirectory, claim_id: &str) -> ClaimLookup {
    match claims.claim(claim_id) {
        Some(claim) => ClaimLookup::Found { claim: claim.clone() },
        None => ClaimLookup::NotFound {
            message: format!("Claim {} not found in system", claim_id.trim()),
        },
    }
}

pub fn lookup_policy(
    claims: &ClaimDirectory,
    policy_number: &str,
    today: NaiveDate,
) -> PolicyLookup {
    match claims.policy(policy_number) {
        Some(policy) => PolicyLookup::Found {
            policy: PolicyView {
                days_until_renewal: policy.days_until_renewal(today),
                policy: policy.clone(),
            },
        },
        None => PolicyLookup::NotFound {
            message: format!("Policy {} not found in system", policy_number.trim()),
        },
    }
}

async fn claim_status(
    Path(claim_id): Path<String>,
    State(state): State<ToolState>,
) -> (StatusCode, Json<ClaimLookup>) {
    let lookup = lookup_claim(&state.claims, &claim_id);
    let status = match lookup {
        ClaimLookup::Found { .. } => StatusCode::OK,
        ClaimLookup::NotFound { .. } => StatusCode::NOT_FOUND,
    };
    (status, Json(lookup))
}

async fn policy_status(
    Path(policy_number): Path<String>,
    State(state): State<ToolState>,
) -> (StatusCode, Json<PolicyLookup>) {
    let lookup = lookup_policy(&state.claims, &policy_number, Utc::now().date_naive());
    let status = match lookup {
        PolicyLookup::Found { .. } => StatusCode::OK,
        PolicyLookup::NotFound { .. } => StatusCode::NOT_FOUND,
    };
    (status, Json(lookup))
}

async fn send_notification(
    State(state): State<ToolState>,
    Json(request): Json<NotificationRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let correlation_id = request.recipient_email.trim().to_string();
    deliver(&state, request)
        .await
        .map(Json)
        .map_err(|error| ApiError::new(error, correlation_id))
}

async fn deliver(
    state: &ToolState,
    request: NotificationRequest,
) -> Result<NotificationResponse, ApplicationError> {
    let kind: NotificationKind = request.notification_type.parse()?;
    let notification = state.templates.compose(
        &request.recipient_email,
        &request.subject,
        &request.message,
        kind,
    )?;
    let receipt = state.notifier.send(&notification).await?;

    info!(
        event_name = "tools.notification.sent",
        correlation_id = %receipt.recipient,
        notification_type = %receipt.notification_type,
        demo_mode = receipt.demo_mode,
        "notification handed to sender"
    );

    Ok(NotificationResponse {
        status: "success",
        message: if receipt.demo_mode {
            "Email notification sent successfully (demo mode)"
        } else {
            "Email notification sent successfully"
        },
        recipient: receipt.recipient,
        subject: receipt.subject,
        notification_type: receipt.notification_type,
        demo_mode: receipt.demo_mode,
    })
}
