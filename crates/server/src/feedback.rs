use axum::{routing::post, Json, Router};
use claimcheck_core::DomainError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiError;

pub const SERVICE_NAME: &str = "insurance-notification-agent";

/// Conversation rating submitted by the chat front end.
#[derive(Clone, Debug, Deserialize)]
pub struct Feedback {
    pub score: f64,
    #[serde(default)]
    pub text: Option<String>,
    pub invocation_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Feedback {
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.score.is_finite() {
            return Err(DomainError::InvariantViolation(
                "feedback score must be a finite number".to_string(),
            ));
        }
        if self.invocation_id.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "feedback invocation_id is required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackAck {
    pub status: &'static str,
}

pub fn router() -> Router {
    Router::new().route("/feedback", post(collect_feedback))
}

async fn collect_feedback(Json(feedback): Json<Feedback>) -> Result<Json<FeedbackAck>, ApiError> {
    feedback.validate().map_err(|error| ApiError::new(error, feedback.invocation_id.as_str()))?;

    info!(
        event_name = "feedback.received",
        correlation_id = %feedback.invocation_id,
        log_type = "feedback",
        service_name = SERVICE_NAME,
        score = feedback.score,
        text = feedback.text.as_deref().unwrap_or_default(),
        user_id = feedback.user_id.as_deref().unwrap_or_default(),
        "conversation feedback"
    );

    Ok(Json(FeedbackAck { status: "success" }))
}
