//! # Reference Document Routes
//!
//! - `POST   /api/v1/reference/{ref_id}/document`: create or overwrite
//! - `GET    /api/v1/reference/{ref_id}/document`: raw bytes, or 404
//! - `DELETE /api/v1/reference/{ref_id}/document`: remove
//!
//! Bodies are stored verbatim with no size limit. Responses carry `Etag` =
//! content digest.

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header::{CONTENT_TYPE, ETAG};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;

use webcfg_core::Lookup;

use crate::error::AppError;
use crate::routes::{etag, APPLICATION_MSGPACK};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/v1/reference/{ref_id}/document",
        post(put_reference)
            .get(get_reference)
            .delete(delete_reference)
            .layer(DefaultBodyLimit::disable()),
    )
}

async fn put_reference(
    State(state): State<AppState>,
    Path(ref_id): Path<String>,
    body: Bytes,
) -> Result<Response, AppError> {
    let version = state.references.put(&ref_id, body.to_vec())?;
    Ok((StatusCode::OK, [(ETAG, etag(&version)?)]).into_response())
}

async fn get_reference(
    State(state): State<AppState>,
    Path(ref_id): Path<String>,
) -> Result<Response, AppError> {
    match state.references.get(&ref_id)? {
        Lookup::Present(doc) => Ok((
            StatusCode::OK,
            [
                (CONTENT_TYPE, HeaderValue::from_static(APPLICATION_MSGPACK)),
                (ETAG, etag(&doc.version)?),
            ],
            doc.bytes,
        )
            .into_response()),
        Lookup::Absent => Err(AppError::NotFound(format!("reference {ref_id}"))),
    }
}

async fn delete_reference(
    State(state): State<AppState>,
    Path(ref_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.references.delete(&ref_id)?;
    Ok(StatusCode::OK)
}
