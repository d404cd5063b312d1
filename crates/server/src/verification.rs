//! `POST /api/approvals`: the long-running tool the agent calls to ask a
//! customer whether they really filed a claim. Opens a ticket and emails the
//! approve/reject links; the agent stays suspended until one is clicked.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use claimcheck_core::notify::validate_recipient;
use claimcheck_core::{
    ApplicationError, ClaimDirectory, DomainError, EmailTemplates, NewTicket, NotificationKind,
    NotificationSender, SessionInfo, TicketId, TicketStore,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::ApiError;

pub const REQUEST_TYPE: &str = "claim_verification";

#[derive(Clone)]
pub struct VerificationState {
    pub store: Arc<dyn TicketStore>,
    pub claims: Arc<ClaimDirectory>,
    pub templates: Arc<EmailTemplates>,
    pub notifier: Arc<dyn NotificationSender>,
    /// Base for the links embedded in the email, without a trailing slash.
    pub public_base_url: String,
    /// App name recorded in session info when the caller does not send one.
    pub app_name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClaimApprovalRequest {
    pub claim_id: String,
    pub customer_email: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub function_call_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClaimApprovalResponse {
    pub status: &'static str,
    pub ticket_id: TicketId,
    pub claim_id: String,
    pub message: String,
    pub approve_url: String,
    pub reject_url: String,
}

pub fn router(state: VerificationState) -> Router {
    Router::new().route("/api/approvals", post(create_approval)).with_state(state)
}

async fn create_approval(
    State(state): State<VerificationState>,
    Json(request): Json<ClaimApprovalRequest>,
) -> Result<Json<ClaimApprovalResponse>, ApiError> {
    let correlation_id = request.claim_id.trim().to_string();
    request_claim_approval(&state, request)
        .await
        .map(Json)
        .map_err(|error| ApiError::new(error, correlation_id))
}

pub async fn request_claim_approval(
    state: &VerificationState,
    request: ClaimApprovalRequest,
) -> Result<ClaimApprovalResponse, ApplicationError> {
    let claim = state
        .claims
        .claim(&request.claim_id)
        .ok_or_else(|| DomainError::ClaimNotFound {
            claim_id: request.claim_id.trim().to_string(),
        })?
        .clone();
    let customer_email = request.customer_email.trim().to_string();
    validate_recipient(&customer_email)?;

    let session_info = match (non_blank(request.user_id), non_blank(request.session_id)) {
        (Some(user_id), Some(session_id)) => Some(SessionInfo {
            app_name: non_blank(request.app_name).unwrap_or_else(|| state.app_name.clone()),
            user_id,
            session_id,
        }),
        _ => None,
    };

    // The email embeds the ticket id, so the id is generated first and the
    // ticket is stored only once the message has rendered.
    let ticket_id = TicketId::generate();
    let approve_url = format!("{}/api/approve/{ticket_id}", state.public_base_url);
    let reject_url = format!("{}/api/reject/{ticket_id}", state.public_base_url);

    let body =
        state.templates.claim_verification_message(&ticket_id, &claim, &approve_url, &reject_url)?;
    let notification = state.templates.compose(
        &customer_email,
        &format!("Action Required: Verify Claim Submission - {}", claim.claim_id),
        &body,
        NotificationKind::ClaimVerification,
    )?;

    state
        .store
        .insert(
            ticket_id.clone(),
            NewTicket {
                claim_id: claim.claim_id.clone(),
                user_email: customer_email.clone(),
                request_type: REQUEST_TYPE.to_string(),
                function_call_id: non_blank(request.function_call_id),
                session_info,
                claim: Some(claim.clone()),
            },
        )
        .await?;

    if let Err(error) = state.notifier.send(&notification).await {
        warn!(
            event_name = "verification.email.failed",
            correlation_id = %ticket_id,
            claim_id = %claim.claim_id,
            error = %error,
            "approval email could not be sent; ticket left pending"
        );
        return Err(ApplicationError::Integration(format!(
            "Failed to send approval email: {error}"
        )));
    }

    info!(
        event_name = "verification.requested",
        correlation_id = %ticket_id,
        claim_id = %claim.claim_id,
        recipient = %customer_email,
        "claim verification email sent; awaiting customer response"
    );

    Ok(ClaimApprovalResponse {
        status: "pending",
        claim_id: claim.claim_id.to_string(),
        message: format!("Approval request sent to {customer_email}. Awaiting response."),
        ticket_id,
        approve_url,
        reject_url,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use claimcheck_core::{
        ApplicationError, ClaimDirectory, DeliveryReceipt, DemoNotificationSender, EmailTemplates,
        InMemoryTicketStore, Notification, NotificationError, NotificationKind, NotificationSender,
        TicketStatus, TicketStore,
    };
    use tower::ServiceExt;

    use super::{request_claim_approval, router, ClaimApprovalRequest, VerificationState};

    struct FailingSender;

    #[async_trait]
    impl NotificationSender for FailingSender {
        async fn send(
            &self,
            _notification: &Notification,
        ) -> Result<DeliveryReceipt, NotificationError> {
            Err(NotificationError::Delivery("relay refused connection".to_string()))
        }

        fn is_demo(&self) -> bool {
            false
        }
    }

    fn state(
        store: Arc<InMemoryTicketStore>,
        notifier: Arc<dyn NotificationSender>,
    ) -> VerificationState {
        VerificationState {
            store,
            claims: Arc::new(ClaimDirectory::with_fixtures()),
            templates: Arc::new(EmailTemplates::embedded().expect("templates")),
            notifier,
            public_base_url: "https://claims.example.com".to_string(),
            app_name: "insurance_notification".to_string(),
        }
    }

    fn request(claim_id: &str) -> ClaimApprovalRequest {
        ClaimApprovalRequest {
            claim_id: claim_id.to_string(),
            customer_email: "holder@example.com".to_string(),
            user_id: Some("customer001".to_string()),
            session_id: Some("session-1".to_string()),
            app_name: None,
            function_call_id: Some("call-1".to_string()),
        }
    }

    #[tokio::test]
    async fn opens_ticket_and_emails_action_links() {
        let store = Arc::new(InMemoryTicketStore::new());
        let sender = Arc::new(DemoNotificationSender::new("noreply@insurance.com"));
        let state = state(store.clone(), sender.clone());

        let response = request_claim_approval(&state, request("CLM-002")).await.expect("request");

        assert_eq!(response.status, "pending");
        assert_eq!(response.claim_id, "CLM-002");
        assert_eq!(
            response.approve_url,
            format!("https://claims.example.com/api/approve/{}", response.ticket_id)
        );
        assert_eq!(
            response.reject_url,
            format!("https://claims.example.com/api/reject/{}", response.ticket_id)
        );

        let ticket = store.get(&response.ticket_id).await.expect("get").expect("ticket exists");
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.request_type, "claim_verification");
        assert_eq!(ticket.user_email, "holder@example.com");
        assert_eq!(
            ticket.metadata.claim.as_ref().map(|claim| claim.claim_id.0.as_str()),
            Some("CLM-002")
        );
        let (session, call_id) = ticket.resume_target().expect("resumable");
        assert_eq!(session.app_name, "insurance_notification");
        assert_eq!(session.user_id, "customer001");
        assert_eq!(call_id, "call-1");

        let outbox = sender.outbox().await;
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].subject, "Action Required: Verify Claim Submission - CLM-002");
        assert_eq!(outbox[0].kind, NotificationKind::ClaimVerification);
        assert!(outbox[0].body_html.contains(&response.approve_url));
    }

    #[tokio::test]
    async fn session_info_needs_both_user_and_session() {
        let store = Arc::new(InMemoryTicketStore::new());
        let sender = Arc::new(DemoNotificationSender::new("noreply@insurance.com"));
        let state = state(store.clone(), sender);
        let mut partial = request("CLM-001");
        partial.session_id = Some("   ".to_string());

        let response = request_claim_approval(&state, partial).await.expect("request");

        let ticket = store.get(&response.ticket_id).await.expect("get").expect("ticket exists");
        assert_eq!(ticket.metadata.session_info, None);
        assert_eq!(ticket.resume_target(), None);
    }

    #[tokio::test]
    async fn unknown_claim_opens_no_ticket() {
        let store = Arc::new(InMemoryTicketStore::new());
        let sender = Arc::new(DemoNotificationSender::new("noreply@insurance.com"));
        let state = state(store.clone(), sender.clone());

        let error = request_claim_approval(&state, request("CLM-404")).await.expect_err("missing");

        assert!(error.to_string().contains("CLM-404"));
        assert!(store.is_empty().await);
        assert!(sender.outbox().await.is_empty());
    }

    #[tokio::test]
    async fn send_failure_surfaces_as_integration_error() {
        let store = Arc::new(InMemoryTicketStore::new());
        let state = state(store.clone(), Arc::new(FailingSender));

        let error =
            request_claim_approval(&state, request("CLM-001")).await.expect_err("send fails");

        let ApplicationError::Integration(message) = &error else {
            panic!("expected an integration error, got {error:?}");
        };
        assert!(message.starts_with("Failed to send approval email"));
        let pending = store.list_pending().await.expect("list");
        assert_eq!(pending.len(), 1, "ticket stays pending after a failed send");
    }

    #[tokio::test]
    async fn render_failure_opens_no_ticket() {
        let store = Arc::new(InMemoryTicketStore::new());
        let sender = Arc::new(DemoNotificationSender::new("noreply@insurance.com"));
        let mut state = state(store.clone(), sender.clone());
        state.templates = Arc::new(
            EmailTemplates::from_sources(
                "{{ message | safe }}",
                "<p>{{ reviewer_signature }}</p>",
                "<p>test</p>",
            )
            .expect("templates parse"),
        );

        let error =
            request_claim_approval(&state, request("CLM-002")).await.expect_err("render fails");

        assert!(matches!(error, ApplicationError::Configuration(_)));
        assert!(store.is_empty().await, "no ticket without an email pointing at it");
        assert!(sender.outbox().await.is_empty());
    }

    #[tokio::test]
    async fn http_maps_errors_to_status_codes() {
        let store = Arc::new(InMemoryTicketStore::new());
        let sender = Arc::new(DemoNotificationSender::new("noreply@insurance.com"));
        let app = router(state(store, sender));

        let post = |body: &'static str| {
            Request::builder()
                .method(Method::POST)
                .uri("/api/approvals")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .expect("request")
        };

        let missing = app
            .clone()
            .oneshot(post(r#"{"claim_id":"CLM-404","customer_email":"holder@example.com"}"#))
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let bad_email = app
            .clone()
            .oneshot(post(r#"{"claim_id":"CLM-001","customer_email":"not-an-address"}"#))
            .await
            .expect("response");
        assert_eq!(bad_email.status(), StatusCode::BAD_REQUEST);

        let created = app
            .oneshot(post(r#"{"claim_id":"clm-001","customer_email":"holder@example.com"}"#))
            .await
            .expect("response");
        assert_eq!(created.status(), StatusCode::OK);
    }
}
