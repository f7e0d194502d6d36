//! # Telemetry Profile Bundle
//!
//! Builds the single-part multipart payload served on the supplementary
//! endpoint.
//!
//! ## Pipeline
//!
//! 1. Build the primary query from request headers and the device MAC
//!    ([`TelemetryQuery::to_query_string`]).
//! 2. Fetch the base catalog `{"profiles":[...]}` from xconf. A 404 is
//!    replaced by an empty catalog when the secondary source is enabled.
//! 3. When the secondary source is enabled and the device has stored
//!    query params, fetch the extra array. A 404 there is an empty array.
//! 4. Append the extra profiles to the base `profiles` array.
//! 5. Wrap the result as the `telemetry` part.
//!
//! Any other upstream failure aborts the whole operation.

use url::form_urlencoded;
use webcfg_core::multipart::{self, Multipart, Part};
use webcfg_core::{CodecError, DeviceMac, Lookup, RequestContext, SubdocId, Version};
use webcfg_store::{DeviceRootStore, StoreError};

use crate::client::UpstreamClient;
use crate::config::{TelemetryConfig, UpstreamConfig};
use crate::error::UpstreamError;
use crate::profiles::ProfilesConnector;
use crate::xconf::XconfConnector;

pub const HEADER_PROFILE_VERSION: &str = "X-System-Telemetry-Profile-Version";
pub const HEADER_MODEL_NAME: &str = "X-System-Model-Name";
pub const HEADER_PARTNER_ID: &str = "X-System-PartnerID";
pub const HEADER_ACCOUNT_ID: &str = "X-System-AccountID";
pub const HEADER_FIRMWARE_VERSION: &str = "X-System-Firmware-Version";
pub const HEADER_WAN_MAC: &str = "X-System-Wan-Mac";

/// Name of the single part in a telemetry bundle.
pub const TELEMETRY_PART: &str = "telemetry";
/// Media type of the telemetry part.
pub const APPLICATION_JSON: &str = "application/json";

const EMPTY_CATALOG: &[u8] = br#"{"profiles":[]}"#;

/// Telemetry pipeline failure.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A catalog was not the JSON shape the merge expects.
    #[error("cannot merge telemetry profiles: {0}")]
    Merge(String),
}

/// Device-reported values that select telemetry profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryQuery {
    pub profile_version: Option<String>,
    pub model: Option<String>,
    pub partner_id: Option<String>,
    pub account_id: Option<String>,
    pub firmware_version: Option<String>,
    /// Overrides the derived estb/ecm MAC pair.
    pub wan_mac: Option<String>,
}

impl TelemetryQuery {
    /// Build the primary query string.
    ///
    /// `partner_id` is the already-validated partner; `extra` is appended
    /// verbatim (it is already URL-encoded).
    pub fn to_query_string(
        &self,
        mac: &DeviceMac,
        partner_id: Option<&str>,
        extra: Option<&str>,
    ) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let mut push = |key: &str, value: Option<&str>| {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                query.append_pair(key, value);
            }
        };

        let firmware = self.firmware_version.as_deref();
        let env = firmware.and_then(|fw| {
            if fw.contains("PROD") {
                Some("PROD")
            } else if fw.contains("DEV") {
                Some("DEV")
            } else {
                None
            }
        });
        push("env", env);
        push("partnerId", partner_id);
        push("version", self.profile_version.as_deref());
        push("model", self.model.as_deref());
        push("accountId", self.account_id.as_deref());
        push("firmwareVersion", firmware);

        match self.wan_mac.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            Some(wan_mac) => push("estbMacAddress", Some(wan_mac)),
            None => {
                let estb = mac.offset(2);
                push("estbMacAddress", Some(estb.as_str()));
                push("ecmMacAddress", Some(mac.as_str()));
            }
        }

        let mut out = query.finish();
        if let Some(extra) = extra.map(|e| e.trim_start_matches('&')).filter(|e| !e.is_empty()) {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(extra);
        }
        out
    }
}

/// Append every element of the `extra` JSON array onto the `profiles`
/// array of the `base` JSON object.
///
/// An empty `extra` returns `base` unchanged.
pub fn append_profiles(base: &[u8], extra: &[u8]) -> Result<Vec<u8>, TelemetryError> {
    let extra: Vec<serde_json::Value> = if extra.iter().all(u8::is_ascii_whitespace) {
        Vec::new()
    } else {
        serde_json::from_slice(extra)
            .map_err(|e| TelemetryError::Merge(format!("extra profiles: {e}")))?
    };
    if extra.is_empty() {
        return Ok(base.to_vec());
    }

    let mut doc: serde_json::Value = serde_json::from_slice(base)
        .map_err(|e| TelemetryError::Merge(format!("base catalog: {e}")))?;
    let profiles = doc
        .as_object_mut()
        .ok_or_else(|| TelemetryError::Merge("base catalog is not a JSON object".into()))?
        .entry("profiles")
        .or_insert_with(|| serde_json::Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| TelemetryError::Merge("base \"profiles\" is not an array".into()))?;
    profiles.extend(extra);

    serde_json::to_vec(&doc).map_err(|e| TelemetryError::Merge(e.to_string()))
}

/// The encoded telemetry bundle.
#[derive(Debug, Clone)]
pub struct TelemetryBundle {
    /// Aggregate root version over the single telemetry part.
    pub root_version: Version,
    pub body: Multipart,
}

/// Fetches and merges the telemetry catalogs for one device.
#[derive(Debug, Clone)]
pub struct TelemetryProfileService {
    xconf: XconfConnector,
    /// Present when the secondary source is enabled.
    profiles: Option<ProfilesConnector>,
    roots: DeviceRootStore,
    config: TelemetryConfig,
}

impl TelemetryProfileService {
    pub fn new(
        upstream: &UpstreamConfig,
        config: TelemetryConfig,
        roots: DeviceRootStore,
    ) -> Result<Self, UpstreamError> {
        let client = UpstreamClient::new(upstream)?;
        let xconf = XconfConnector::new(
            client.clone(),
            upstream.xconf_host.clone(),
            upstream.xconf_path.clone(),
        );
        let profiles = upstream
            .profiles_enabled
            .then(|| ProfilesConnector::new(client, upstream.profiles_host.clone()));
        Ok(Self {
            xconf,
            profiles,
            roots,
            config,
        })
    }

    /// The partner id if it is one of the configured partners.
    pub fn validated_partner<'a>(&self, raw: Option<&'a str>) -> Option<&'a str> {
        let raw = raw.map(str::trim).filter(|p| !p.is_empty())?;
        self.config
            .valid_partners
            .iter()
            .any(|p| p.eq_ignore_ascii_case(raw))
            .then_some(raw)
    }

    pub async fn get_telemetry_bundle(
        &self,
        mac: &DeviceMac,
        query: &TelemetryQuery,
        ctx: &RequestContext,
    ) -> Result<TelemetryBundle, TelemetryError> {
        let stored = if self.config.supplementary_appending_enabled || self.profiles.is_some() {
            match self.roots.query_params(mac)? {
                Lookup::Present(params) if !params.is_empty() => Some(params),
                _ => None,
            }
        } else {
            None
        };

        let partner_id = self.validated_partner(query.partner_id.as_deref());
        if partner_id.is_none() && query.partner_id.is_some() {
            tracing::debug!(mac = %mac, audit_id = ctx.audit_id.as_str(), "partner id not recognised, ignored");
        }
        let appended = stored
            .as_deref()
            .filter(|_| self.config.supplementary_appending_enabled);
        let qs = query.to_query_string(mac, partner_id, appended);

        let base = match self.xconf.get_profiles(&qs, ctx).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() && self.profiles.is_some() => {
                tracing::debug!(mac = %mac, audit_id = ctx.audit_id.as_str(), "primary catalog not found, using empty catalog");
                EMPTY_CATALOG.to_vec()
            }
            Err(e) => {
                log_upstream_failure(mac, ctx, &e);
                return Err(e.into());
            }
        };

        let merged = match (&self.profiles, stored.as_deref()) {
            (Some(profiles), Some(params)) => {
                let extra = match profiles.get_profiles(mac, params, ctx).await {
                    Ok(bytes) => bytes,
                    Err(e) if e.is_not_found() => Vec::new(),
                    Err(e) => {
                        log_upstream_failure(mac, ctx, &e);
                        return Err(e.into());
                    }
                };
                append_profiles(&base, &extra)?
            }
            _ => base,
        };

        let version = Version::of_bytes(&merged);
        let id = SubdocId::new(TELEMETRY_PART);
        let root_version = Version::root([(&id, &version)]);
        let part = Part::new(TELEMETRY_PART, version, merged).with_content_type(APPLICATION_JSON);
        let body = multipart::encode(std::slice::from_ref(&part))?;
        tracing::info!(
            mac = %mac,
            audit_id = ctx.audit_id.as_str(),
            size = part.bytes.len(),
            "telemetry bundle assembled"
        );
        Ok(TelemetryBundle { root_version, body })
    }
}

fn log_upstream_failure(mac: &DeviceMac, ctx: &RequestContext, err: &UpstreamError) {
    tracing::error!(
        mac = %mac,
        audit_id = ctx.audit_id.as_str(),
        status = ?err.status(),
        "telemetry upstream failed: {err}"
    );
}
