//! webcfg server entry point.
//!
//! Storage is in-memory (DashMap) with no persistence; data is lost on
//! restart. Production deployments plug a persistent `KvBackend` into
//! `AppState::new`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use webcfg_api::{AppConfig, AppState};
use webcfg_store::MemoryBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let state = AppState::new(&config, Arc::new(MemoryBackend::new()))
        .context("building application state")?;
    let app = webcfg_api::app(state, Duration::from_secs(config.request_timeout_secs));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        profiles_enabled = config.upstream.profiles_enabled,
        xconf = %config.upstream.xconf_host,
        "webcfg listening on {addr}"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("server error")?;
    Ok(())
}
