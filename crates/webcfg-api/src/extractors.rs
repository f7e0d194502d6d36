//! # Request Context and Custom Extractors
//!
//! [`request_context`] runs on every API request: it builds the typed
//! [`RequestContext`] from inbound headers, stores it in the request
//! extensions, and echoes the audit id on the response. Handlers read it
//! back through the [`Audit`] extractor.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use webcfg_core::context::{HEADER_AUDIT_ID, HEADER_TRACEPARENT, HEADER_TRACESTATE};
use webcfg_core::RequestContext;
use webcfg_upstream::telemetry::{
    HEADER_ACCOUNT_ID, HEADER_FIRMWARE_VERSION, HEADER_MODEL_NAME, HEADER_PARTNER_ID,
    HEADER_PROFILE_VERSION, HEADER_WAN_MAC,
};
use webcfg_upstream::TelemetryQuery;

/// Middleware: attach a [`RequestContext`] and echo `X-Auditid`.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let ctx = context_from_headers(req.headers());
    let audit_id = HeaderValue::from_str(&ctx.audit_id).ok();
    req.extensions_mut().insert(ctx);

    let mut response = next.run(req).await;
    if let Some(value) = audit_id {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-auditid"), value);
    }
    response
}

/// The request's [`RequestContext`].
#[derive(Debug, Clone)]
pub struct Audit(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Audit {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| context_from_headers(&parts.headers));
        Ok(Self(ctx))
    }
}

/// Device-reported telemetry selectors from the `X-System-*` headers.
#[derive(Debug, Clone)]
pub struct TelemetryHeaders(pub TelemetryQuery);

impl<S: Send + Sync> FromRequestParts<S> for TelemetryHeaders {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let get = |name: &str| header_str(&parts.headers, name).map(str::to_string);
        Ok(Self(TelemetryQuery {
            profile_version: get(HEADER_PROFILE_VERSION),
            model: get(HEADER_MODEL_NAME),
            partner_id: get(HEADER_PARTNER_ID),
            account_id: get(HEADER_ACCOUNT_ID),
            firmware_version: get(HEADER_FIRMWARE_VERSION),
            wan_mac: get(HEADER_WAN_MAC),
        }))
    }
}

/// A header value as text; missing and non-ASCII values are `None`.
pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn context_from_headers(headers: &HeaderMap) -> RequestContext {
    RequestContext::from_parts(
        header_str(headers, HEADER_AUDIT_ID),
        header_str(headers, HEADER_TRACEPARENT),
        header_str(headers, HEADER_TRACESTATE),
    )
}
