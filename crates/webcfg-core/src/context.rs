//! # Request Context
//!
//! The typed, request-scoped values that flow from an inbound request into
//! downstream calls. Built once per request by the API layer and passed by
//! reference; nothing here is global.

use uuid::Uuid;

/// Header carrying the per-request audit id.
pub const HEADER_AUDIT_ID: &str = "X-Auditid";
/// W3C trace context header, forwarded untouched.
pub const HEADER_TRACEPARENT: &str = "traceparent";
/// W3C trace state header, forwarded untouched.
pub const HEADER_TRACESTATE: &str = "tracestate";

/// Per-request values propagated to upstream calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Audit id, taken from the inbound request or freshly generated.
    pub audit_id: String,
    /// Inbound `traceparent`, if any.
    pub traceparent: Option<String>,
    /// Inbound `tracestate`, if any.
    pub tracestate: Option<String>,
}

impl RequestContext {
    /// Build from inbound header values. A missing or blank audit id is
    /// replaced by a new 32-hex-digit id.
    pub fn from_parts(
        audit_id: Option<&str>,
        traceparent: Option<&str>,
        tracestate: Option<&str>,
    ) -> Self {
        let audit_id = audit_id
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_audit_id);
        Self {
            audit_id,
            traceparent: traceparent.map(str::to_string),
            tracestate: tracestate.map(str::to_string),
        }
    }

    /// Headers to attach to an outbound call, in a fixed order.
    pub fn outbound_headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = vec![(HEADER_AUDIT_ID, self.audit_id.as_str())];
        if let Some(tp) = &self.traceparent {
            headers.push((HEADER_TRACEPARENT, tp.as_str()));
        }
        if let Some(ts) = &self.tracestate {
            headers.push((HEADER_TRACESTATE, ts.as_str()));
        }
        headers
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::from_parts(None, None, None)
    }
}

/// A fresh 32-hex-digit audit id.
pub fn new_audit_id() -> String {
    Uuid::new_v4().simple().to_string()
}
