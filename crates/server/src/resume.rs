//! Resumption calls into the external agent runtime.
//!
//! After a ticket reaches a terminal state the suspended `request_claim_approval`
//! call is completed by posting a function response to `{base_url}/run`. The
//! call is best-effort: the outcome is reported and logged, never retried.

use std::time::Duration;

use async_trait::async_trait;
use claimcheck_core::config::RuntimeConfig;
use claimcheck_core::{ApprovalTicket, TicketStatus};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResumePayload {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: ResumeMessage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResumeMessage {
    pub role: String,
    pub parts: Vec<ResumePart>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResumePart {
    pub function_response: FunctionResponse,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub id: String,
    pub response: DecisionResponse,
}

/// The tool result the agent sees once the human has decided.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub status: String,
    pub approval_status: TicketStatus,
    pub ticket_id: String,
    pub claim_id: String,
    pub message: String,
}

/// Builds the `/run` body for a resolved ticket. `None` when the ticket is
/// still pending or lacks the session/function-call correlation data.
pub fn build_resume_payload(ticket: &ApprovalTicket, function_name: &str) -> Option<ResumePayload> {
    if !ticket.status.is_terminal() {
        return None;
    }
    let (session, function_call_id) = ticket.resume_target()?;

    Some(ResumePayload {
        app_name: session.app_name.clone(),
        user_id: session.user_id.clone(),
        session_id: session.session_id.clone(),
        new_message: ResumeMessage {
            role: "function".to_string(),
            parts: vec![ResumePart {
                function_response: FunctionResponse {
                    name: function_name.to_string(),
                    id: function_call_id.to_string(),
                    response: DecisionResponse {
                        status: "success".to_string(),
                        approval_status: ticket.status,
                        ticket_id: ticket.ticket_id.to_string(),
                        claim_id: ticket.claim_id.to_string(),
                        message: format!("Claim verification {} by user", ticket.status),
                    },
                },
            }],
        },
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResumeOutcome {
    Delivered,
    Skipped { reason: String },
    Rejected { status: u16, body: String },
    Failed { error: String },
}

impl ResumeOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

#[async_trait]
pub trait AgentResumer: Send + Sync {
    async fn resume(&self, ticket: &ApprovalTicket) -> ResumeOutcome;
}

pub struct HttpAgentResumer {
    client: Client,
    run_url: String,
    function_name: String,
}

impl HttpAgentResumer {
    pub fn new(config: &RuntimeConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            run_url: format!("{}/run", config.base_url.trim_end_matches('/')),
            function_name: config.function_name.clone(),
        })
    }

    pub fn run_url(&self) -> &str {
        &self.run_url
    }
}

#[async_trait]
impl AgentResumer for HttpAgentResumer {
    async fn resume(&self, ticket: &ApprovalTicket) -> ResumeOutcome {
        let Some(payload) = build_resume_payload(ticket, &self.function_name) else {
            let reason = "missing session info or function call id".to_string();
            warn!(
                event_name = "resume.skipped",
                correlation_id = %ticket.ticket_id,
                claim_id = %ticket.claim_id,
                reason = %reason,
                "cannot resume agent automatically"
            );
            return ResumeOutcome::Skipped { reason };
        };

        info!(
            event_name = "resume.sending",
            correlation_id = %ticket.ticket_id,
            run_url = %self.run_url,
            user_id = %payload.user_id,
            session_id = %payload.session_id,
            approval_status = %ticket.status,
            "pushing function response to agent runtime"
        );

        let response = match self.client.post(&self.run_url).json(&payload).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "resume.failed",
                    correlation_id = %ticket.ticket_id,
                    run_url = %self.run_url,
                    error = %error,
                    "agent runtime unreachable; ticket state stands"
                );
                return ResumeOutcome::Failed { error: error.to_string() };
            }
        };

        let status = response.status();
        if status.is_success() {
            info!(
                event_name = "resume.delivered",
                correlation_id = %ticket.ticket_id,
                approval_status = %ticket.status,
                "agent resumed"
            );
            return ResumeOutcome::Delivered;
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            event_name = "resume.rejected",
            correlation_id = %ticket.ticket_id,
            status = status.as_u16(),
            body = %body,
            "agent runtime refused the function response"
        );
        ResumeOutcome::Rejected { status: status.as_u16(), body }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use chrono::Utc;
    use claimcheck_core::config::RuntimeConfig;
    use claimcheck_core::{ApprovalTicket, ClaimId, NewTicket, SessionInfo, TicketId, TicketStatus};
    use tokio::sync::Mutex;

    use super::{build_resume_payload, AgentResumer, HttpAgentResumer, ResumeOutcome, ResumePayload};

    type Received = Arc<Mutex<Vec<ResumePayload>>>;

    fn ticket(function_call_id: Option<&str>, with_session: bool) -> ApprovalTicket {
        ApprovalTicket::open(
            TicketId("TKT-1".to_string()),
            NewTicket {
                claim_id: ClaimId("CLM-002".to_string()),
                user_email: "holder@example.com".to_string(),
                request_type: "claim_verification".to_string(),
                function_call_id: function_call_id.map(str::to_string),
                session_info: with_session.then(|| SessionInfo {
                    app_name: "insurance_notification".to_string(),
                    user_id: "customer001".to_string(),
                    session_id: "session-9".to_string(),
                }),
                claim: None,
            },
            Utc::now(),
        )
    }

    fn approved(mut ticket: ApprovalTicket) -> ApprovalTicket {
        assert!(ticket.approve(Some("Approved via email link".to_string()), Utc::now()));
        ticket
    }

    fn runtime_config(base_url: String) -> RuntimeConfig {
        RuntimeConfig {
            base_url,
            app_name: "insurance_notification".to_string(),
            function_name: "request_claim_approval".to_string(),
            timeout_secs: 5,
        }
    }

    async fn fake_runtime(status: StatusCode) -> (String, Received) {
        async fn run(
            State((status, received)): State<(StatusCode, Received)>,
            Json(payload): Json<ResumePayload>,
        ) -> StatusCode {
            received.lock().await.push(payload);
            status
        }

        let received: Received = Arc::default();
        let router =
            Router::new().route("/run", post(run)).with_state((status, Arc::clone(&received)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake runtime");
        });
        (format!("http://{address}"), received)
    }

    #[test]
    fn payload_carries_correlation_ids_and_decision() {
        let ticket = approved(ticket(Some("call-7"), true));

        let payload = build_resume_payload(&ticket, "request_claim_approval").expect("payload");
        let json = serde_json::to_value(&payload).expect("serialize");

        assert_eq!(json["app_name"], "insurance_notification");
        assert_eq!(json["user_id"], "customer001");
        assert_eq!(json["session_id"], "session-9");
        assert_eq!(json["new_message"]["role"], "function");
        let function_response = &json["new_message"]["parts"][0]["function_response"];
        assert_eq!(function_response["name"], "request_claim_approval");
        assert_eq!(function_response["id"], "call-7");
        assert_eq!(function_response["response"]["status"], "success");
        assert_eq!(function_response["response"]["approval_status"], "approved");
        assert_eq!(function_response["response"]["ticket_id"], "TKT-1");
        assert_eq!(function_response["response"]["claim_id"], "CLM-002");
        assert_eq!(
            function_response["response"]["message"],
            "Claim verification approved by user"
        );
    }

    #[test]
    fn payload_requires_terminal_status_and_correlation_data() {
        assert_eq!(build_resume_payload(&ticket(Some("call-7"), true), "f"), None);
        assert_eq!(build_resume_payload(&approved(ticket(None, true)), "f"), None);
        assert_eq!(build_resume_payload(&approved(ticket(Some(""), true)), "f"), None);
        assert_eq!(build_resume_payload(&approved(ticket(Some("call-7"), false)), "f"), None);
    }

    #[tokio::test]
    async fn delivers_rejection_to_runtime() {
        let (base_url, received) = fake_runtime(StatusCode::OK).await;
        let resumer =
            HttpAgentResumer::new(&runtime_config(format!("{base_url}/"))).expect("client");
        assert_eq!(resumer.run_url(), format!("{base_url}/run"));

        let mut ticket = ticket(Some("call-7"), true);
        assert!(ticket.reject(Some("Rejected via email link".to_string()), Utc::now()));

        assert_eq!(resumer.resume(&ticket).await, ResumeOutcome::Delivered);
        let received = received.lock().await;
        assert_eq!(received.len(), 1);
        let response = &received[0].new_message.parts[0].function_response.response;
        assert_eq!(response.approval_status, TicketStatus::Rejected);
        assert_eq!(response.message, "Claim verification rejected by user");
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let (base_url, _received) = fake_runtime(StatusCode::UNPROCESSABLE_ENTITY).await;
        let resumer = HttpAgentResumer::new(&runtime_config(base_url)).expect("client");

        let outcome = resumer.resume(&approved(ticket(Some("call-7"), true))).await;

        assert!(matches!(outcome, ResumeOutcome::Rejected { status: 422, .. }));
    }

    #[tokio::test]
    async fn unreachable_runtime_is_a_failure_not_a_panic() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr");
        drop(listener);
        let resumer =
            HttpAgentResumer::new(&runtime_config(format!("http://{address}"))).expect("client");

        let outcome = resumer.resume(&approved(ticket(Some("call-7"), true))).await;

        assert!(matches!(outcome, ResumeOutcome::Failed { .. }));
        assert!(!outcome.is_delivered());
    }

    #[tokio::test]
    async fn missing_session_skips_the_call() {
        let (base_url, received) = fake_runtime(StatusCode::OK).await;
        let resumer = HttpAgentResumer::new(&runtime_config(base_url)).expect("client");

        let outcome = resumer.resume(&approved(ticket(Some("call-7"), false))).await;

        assert!(matches!(outcome, ResumeOutcome::Skipped { .. }));
        assert!(received.lock().await.is_empty());
    }
}
