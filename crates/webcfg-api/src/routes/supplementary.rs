//! `GET /api/v1/device/{mac}/supplementary`: the merged telemetry profile
//! catalog as a single-part multipart body.

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_TYPE, ETAG};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use webcfg_core::DeviceMac;

use crate::error::AppError;
use crate::extractors::{Audit, TelemetryHeaders};
use crate::routes::{etag, header_value};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/device/{mac}/supplementary", get(get_supplementary))
}

async fn get_supplementary(
    State(state): State<AppState>,
    Path(mac): Path<String>,
    Audit(ctx): Audit,
    TelemetryHeaders(query): TelemetryHeaders,
) -> Result<Response, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let bundle = state
        .telemetry
        .get_telemetry_bundle(&mac, &query, &ctx)
        .await?;
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, header_value(&bundle.body.content_type())?),
            (ETAG, etag(&bundle.root_version)?),
        ],
        bundle.body.into_body(),
    )
        .into_response())
}
