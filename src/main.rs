// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Polar AccessLink sync server
//!
//! Links one Polar account through OAuth, refreshes its data on a fixed
//! interval and serves the latest snapshot over HTTP.

use polar_accesslink_sync::{config::Config, services::run_every, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        entry_id = %config.entry_id,
        storage_dir = %config.storage_dir.display(),
        "Starting Polar AccessLink sync"
    );

    let port = config.port;
    let interval = Duration::from_secs(config.scan_interval_minutes.max(1) * 60);

    let state = Arc::new(AppState::from_config(config).expect("Failed to initialize state"));

    match state.poller.account().await {
        Some(account) => tracing::info!(
            user_id = account.user_id,
            name = %account.name,
            "Linked Polar account loaded"
        ),
        None => tracing::info!("No Polar account linked yet, visit /auth/polar"),
    }

    // Refresh loop
    let poller_state = state.clone();
    tokio::spawn(async move {
        run_every(&poller_state.poller, interval).await;
    });
    tracing::info!(interval_secs = interval.as_secs(), "Refresh loop started");

    // Build router
    let app = polar_accesslink_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("polar_accesslink_sync=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
