//! # webcfg-api — HTTP Service
//!
//! Assembles the webcfg routers into a single Axum application.
//!
//! ## Routes
//!
//! - `/api/v1/reference/{ref_id}/document`: reference document CRUD
//! - `/api/v1/device/{mac}/document/{subdoc_id}`: subdocument links
//! - `/api/v1/device/{mac}/config`: aggregated multipart config
//! - `/api/v1/device/{mac}/query_params`: device root document
//! - `/api/v1/device/{mac}/poke`: poke validation
//! - `/api/v1/device/{mac}/supplementary`: telemetry profile bundle
//! - `/health/*`: liveness and readiness probes
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → TimeoutLayer → request context → body limit → handler
//!
//! The 2 MiB body limit is lifted on the reference and subdocument link
//! routes, which carry opaque configuration blobs of any size.
//!
//! The timeout drops the handler future when it fires, which aborts any
//! in-flight upstream call.
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers; they validate, delegate, and
//!   map results.
//! - All errors map to structured HTTP responses via `AppError`.

pub mod config;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;

/// Default request body limit: 2 MiB.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Assemble the full application router.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .merge(routes::reference::router())
        .merge(routes::device::router())
        .merge(routes::supplementary::router())
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(from_fn(extractors::request_context))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: the storage backend answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.references.get("__readiness__") {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!("storage readiness check failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
    }
}
