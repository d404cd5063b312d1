use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use claimcheck_core::{ApplicationError, InterfaceError};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

/// JSON error response carrying an [`InterfaceError`].
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn new(error: impl Into<ApplicationError>, correlation_id: impl Into<String>) -> Self {
        Self(error.into().into_interface(correlation_id))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            InterfaceError::Internal { message, correlation_id } => {
                error!(
                    event_name = "api.error.internal",
                    correlation_id = %correlation_id,
                    error = %message,
                    "request failed with internal error"
                );
                self.0.user_message().to_string()
            }
            other => {
                warn!(
                    event_name = "api.error.client",
                    correlation_id = %other.correlation_id(),
                    status = status.as_u16(),
                    error = %other.message(),
                    "request rejected"
                );
                other.message().to_string()
            }
        };

        let body =
            ErrorBody { error: message, correlation_id: self.0.correlation_id().to_string() };
        (status, Json(body)).into_response()
    }
}
