mod api;
mod approvals;
mod bootstrap;
mod feedback;
mod health;
mod pages;
mod resume;
mod tools;
mod verification;

use std::time::Duration;

use anyhow::{Context, Result};
use claimcheck_core::config::{AppConfig, LoadOptions};
use claimcheck_core::{NotificationSender, TicketStore};
use tokio::sync::oneshot;

fn init_logging(config: &AppConfig) {
    use claimcheck_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging comes up before bootstrap so config-derived events are captured.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let bootstrap::Application { config, store, notifier, router } =
        bootstrap::bootstrap(config).await?;

    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        public_base_url = %config.public_base_url(),
        runtime_url = %config.runtime.base_url,
        email_demo_mode = notifier.is_demo(),
        "claimcheck-server listening"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let grace = Duration::from_secs(config.server.graceful_shutdown_secs);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    wait_for_shutdown().await?;
    // Tickets live in process memory; undecided ones are lost on exit.
    let pending_tickets = store.list_pending().await.map(|pending| pending.len()).unwrap_or(0);
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        grace_secs = grace.as_secs(),
        pending_tickets,
        "claimcheck-server stopping"
    );
    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task panicked")?.context("server error")?,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            "in-flight requests did not finish within the grace period"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
