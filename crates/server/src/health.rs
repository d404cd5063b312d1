use std::collections::BTreeMap;

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::feedback::SERVICE_NAME;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub status: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub fn router() -> Router {
    Router::new().route("/", get(service_info)).route("/health", get(health))
}

pub async fn service_info() -> Json<ServiceInfo> {
    let endpoints = BTreeMap::from([
        ("approve", "/api/approve/{ticket_id}"),
        ("reject", "/api/reject/{ticket_id}"),
        ("status", "/api/status/{ticket_id}"),
        ("pending", "/api/pending"),
        ("request_approval", "/api/approvals"),
        ("claims", "/api/claims/{claim_id}"),
        ("policies", "/api/policies/{policy_number}"),
        ("notifications", "/api/notifications"),
        ("feedback", "/feedback"),
        ("health", "/health"),
    ]);

    Json(ServiceInfo {
        service: "Insurance Notification Approval API",
        status: "running",
        endpoints,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}
