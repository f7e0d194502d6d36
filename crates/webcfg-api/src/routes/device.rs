//! # Device Routes
//!
//! | Method | Path                                          | Operation                  |
//! |--------|-----------------------------------------------|----------------------------|
//! | POST   | `/api/v1/device/{mac}/document/{subdoc_id}`   | link inline or indirection |
//! | GET    | `/api/v1/device/{mac}/document/{subdoc_id}`   | resolved bytes, or 404     |
//! | DELETE | `/api/v1/device/{mac}/document/{subdoc_id}`   | unlink                     |
//! | GET    | `/api/v1/device/{mac}/config?group_id=...`    | aggregated multipart       |
//! | PUT    | `/api/v1/device/{mac}/query_params`           | store supplementary params |
//! | GET    | `/api/v1/device/{mac}/query_params`           | stored params, or 404      |
//! | POST   | `/api/v1/device/{mac}/poke`                   | validate `doc` or `route`  |
//!
//! ## Config Negotiation
//!
//! `If-None-Match` carries one version token per `group_id` entry, `root`
//! first. The response `Etag` is the recomputed root version. When every
//! present member and the root token match, the answer is `304` with no
//! body; otherwise `200` with every present member.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::header::{CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use webcfg_core::{DeviceMac, GroupRequest, Lookup, PokeTarget, SubdocId, ValidationError};
use webcfg_store::{ConfigOutcome, Payload};

use crate::error::AppError;
use crate::extractors::{header_str, Audit};
use crate::routes::{etag, header_value, APPLICATION_MSGPACK};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/device/{mac}/document/{subdoc_id}",
            post(link_subdocument)
                .get(get_subdocument)
                .delete(unlink_subdocument)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/api/v1/device/{mac}/config", get(get_config))
        .route(
            "/api/v1/device/{mac}/query_params",
            put(put_query_params).get(get_query_params),
        )
        .route("/api/v1/device/{mac}/poke", post(poke))
}

fn subdoc_id(state: &AppState, raw: &str) -> Result<SubdocId, AppError> {
    state
        .registry
        .resolve(raw)
        .ok_or_else(|| ValidationError::UnknownSubdoc(raw.to_string()).into())
}

async fn link_subdocument(
    State(state): State<AppState>,
    Path((mac, subdoc)): Path<(String, String)>,
    Audit(ctx): Audit,
    body: Bytes,
) -> Result<Response, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let subdoc = subdoc_id(&state, &subdoc)?;
    let payload = Payload::from_link_body(&body)?;
    let version = state.linker.link(&mac, &subdoc, payload)?;
    tracing::debug!(mac = %mac, subdoc_id = %subdoc, audit_id = ctx.audit_id.as_str(), "link request served");
    Ok((StatusCode::OK, [(ETAG, etag(&version)?)]).into_response())
}

async fn get_subdocument(
    State(state): State<AppState>,
    Path((mac, subdoc)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let subdoc = subdoc_id(&state, &subdoc)?;
    match state.linker.resolve(&mac, &subdoc)? {
        Lookup::Present(doc) => Ok((
            StatusCode::OK,
            [
                (CONTENT_TYPE, HeaderValue::from_static(APPLICATION_MSGPACK)),
                (ETAG, etag(&doc.version)?),
            ],
            doc.bytes,
        )
            .into_response()),
        Lookup::Absent => Err(AppError::NotFound(format!("subdocument {subdoc} of {mac}"))),
    }
}

async fn unlink_subdocument(
    State(state): State<AppState>,
    Path((mac, subdoc)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let subdoc = subdoc_id(&state, &subdoc)?;
    state.linker.unlink(&mac, &subdoc)?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize)]
struct ConfigParams {
    group_id: Option<String>,
}

async fn get_config(
    State(state): State<AppState>,
    Path(mac): Path<String>,
    Query(params): Query<ConfigParams>,
    Audit(ctx): Audit,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let request = GroupRequest::parse(
        params.group_id.as_deref(),
        header_str(&headers, IF_NONE_MATCH.as_str()),
        &state.registry,
    )?;
    tracing::debug!(
        mac = %mac,
        audit_id = ctx.audit_id.as_str(),
        group = ?request.ids(),
        "config requested"
    );

    match state.aggregator.get_config(&mac, &request)? {
        ConfigOutcome::NotModified { root_version } => {
            Ok((StatusCode::NOT_MODIFIED, [(ETAG, etag(&root_version)?)]).into_response())
        }
        ConfigOutcome::Modified {
            root_version,
            body,
            part_count,
        } => {
            tracing::debug!(
                mac = %mac,
                audit_id = ctx.audit_id.as_str(),
                part_count,
                "config served"
            );
            Ok((
                StatusCode::OK,
                [
                    (CONTENT_TYPE, header_value(&body.content_type())?),
                    (ETAG, etag(&root_version)?),
                ],
                body.into_body(),
            )
                .into_response())
        }
    }
}

async fn put_query_params(
    State(state): State<AppState>,
    Path(mac): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let params = std::str::from_utf8(&body)
        .map_err(|_| ValidationError::InvalidQueryParams("not UTF-8".into()))?;
    state.roots.set_query_params(&mac, params.trim())?;
    Ok(StatusCode::OK)
}

async fn get_query_params(
    State(state): State<AppState>,
    Path(mac): Path<String>,
) -> Result<Response, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    match state.roots.query_params(&mac)? {
        Lookup::Present(params) => Ok((
            StatusCode::OK,
            [(CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
            params,
        )
            .into_response()),
        Lookup::Absent => Err(AppError::NotFound(format!("query params of {mac}"))),
    }
}

#[derive(Debug, Serialize)]
struct PokeAccepted {
    mac: DeviceMac,
    action: String,
}

#[derive(Debug, Deserialize)]
struct PokeParams {
    doc: Option<String>,
    route: Option<String>,
}

async fn poke(
    State(state): State<AppState>,
    Path(mac): Path<String>,
    Query(params): Query<PokeParams>,
    Audit(ctx): Audit,
) -> Result<Response, AppError> {
    let mac = DeviceMac::parse(&mac)?;
    let target = PokeTarget::parse(
        params.doc.as_deref(),
        params.route.as_deref(),
        &state.poke_targets,
    )?;
    let action = target.action();
    tracing::info!(mac = %mac, audit_id = ctx.audit_id.as_str(), action = action.as_str(), "poke accepted");
    Ok((
        StatusCode::ACCEPTED,
        Json(PokeAccepted { mac, action }),
    )
        .into_response())
}
