// File: services/petclaims_backend/src/main.rs
use anyhow::Context;
use petclaims_backend::{build_router, AppState};
use petclaims_config::load_config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    petclaims_common::logging::init();

    let config = Arc::new(load_config().context("Failed to load config")?);
    let state = AppState::new(config.clone()).await;
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}
