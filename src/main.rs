// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Plant Database API Server
//!
//! Turns a spreadsheet of plant observations plus field photos into a
//! browsable plant database.

use plantdb_api::{config::Config, services::cleanup, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment
    let config = Config::from_env()?;
    init_logging(config.debug)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        data_dir = %config.data_dir.display(),
        "Starting Plant Database API"
    );

    let state = Arc::new(AppState::new(config.clone()));

    // Create the upload/output scaffold
    state.storage.ensure_layout().await?;
    tracing::info!("Storage directories ready");

    let _sweeper = cleanup::spawn_sweeper(state.clone());

    // Build router
    let app = plantdb_api::routes::create_router(state);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize logging: structured JSON in production, readable text in debug mode.
fn init_logging(debug: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::from_default_env()
        .add_directive("plantdb_api=debug".parse()?)
        .add_directive(default_level.parse()?);

    if debug {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    } else {
        let format = tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true);

        tracing_subscriber::registry().with(filter).with(format).init();
    }
    Ok(())
}
