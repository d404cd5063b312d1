use std::sync::Arc;

use axum::Router;
use claimcheck_core::config::{AppConfig, ConfigError};
use claimcheck_core::{
    ClaimDirectory, DemoNotificationSender, EmailTemplates, InMemoryTicketStore, NotificationError,
};
use thiserror::Error;
use tracing::info;

use crate::approvals::{self, ApprovalState};
use crate::feedback;
use crate::health;
use crate::pages::DecisionPages;
use crate::resume::HttpAgentResumer;
use crate::tools::{self, ToolState};
use crate::verification::{self, VerificationState};

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<InMemoryTicketStore>,
    pub notifier: Arc<DemoNotificationSender>,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("email templates failed to load: {0}")]
    EmailTemplates(#[from] NotificationError),
    #[error("page templates failed to load: {0}")]
    PageTemplates(#[source] tera::Error),
    #[error("agent runtime client could not be built: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Builds the router from an already loaded config. The config is validated
/// again so programmatic configs get the same checks as loaded ones.
pub async fn bootstrap(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    config.validate()?;

    let store = Arc::new(InMemoryTicketStore::new());
    let notifier = Arc::new(DemoNotificationSender::new(config.notification.sender_email.clone()));
    let claims = Arc::new(ClaimDirectory::with_fixtures());
    let templates = Arc::new(EmailTemplates::embedded()?);
    let pages = Arc::new(DecisionPages::embedded().map_err(BootstrapError::PageTemplates)?);
    let resumer =
        Arc::new(HttpAgentResumer::new(&config.runtime).map_err(BootstrapError::HttpClient)?);

    info!(
        event_name = "system.bootstrap.resumer_ready",
        correlation_id = "bootstrap",
        run_url = %resumer.run_url(),
        timeout_secs = config.runtime.timeout_secs,
        "agent runtime client initialized"
    );

    let router = Router::new()
        .merge(health::router())
        .merge(feedback::router())
        .merge(approvals::router(ApprovalState {
            store: store.clone(),
            resumer,
            pages,
        }))
        .merge(verification::router(VerificationState {
            store: store.clone(),
            claims: claims.clone(),
            templates: templates.clone(),
            notifier: notifier.clone(),
            public_base_url: config.public_base_url(),
            app_name: config.runtime.app_name.clone(),
        }))
        .merge(tools::router(ToolState { claims, templates, notifier: notifier.clone() }));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        public_base_url = %config.public_base_url(),
        demo_mode = true,
        "routes assembled"
    );

    Ok(Application { config, store, notifier, router })
}
