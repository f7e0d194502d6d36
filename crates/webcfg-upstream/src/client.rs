//! Shared retrying HTTP client.

use std::time::Duration;

use url::Url;
use webcfg_core::RequestContext;

use crate::config::{RetryPolicy, UpstreamConfig};
use crate::error::UpstreamError;
use crate::retry::retry_send;

/// HTTP client used by every upstream connector.
///
/// Each call forwards the request context headers (`X-Auditid`,
/// `traceparent`, `tracestate`) and goes through the retry policy.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self {
            http,
            retry: config.retry,
        })
    }

    /// `GET url` and return the body of a 2xx response.
    ///
    /// A non-2xx final response becomes [`UpstreamError::Remote`] carrying
    /// the status and body.
    pub async fn get_bytes(
        &self,
        endpoint: &str,
        url: &Url,
        ctx: &RequestContext,
    ) -> Result<Vec<u8>, UpstreamError> {
        let resp = retry_send(&self.retry, endpoint, || {
            let mut req = self.http.get(url.clone());
            for (name, value) in ctx.outbound_headers() {
                req = req.header(name, value);
            }
            req.send()
        })
        .await
        .map_err(|e| UpstreamError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UpstreamError::Remote {
                endpoint: endpoint.into(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| UpstreamError::Http {
            endpoint: endpoint.into(),
            source: e,
        })?;
        tracing::debug!(
            endpoint,
            audit_id = ctx.audit_id.as_str(),
            status = status.as_u16(),
            size = bytes.len(),
            "upstream call succeeded"
        );
        Ok(bytes.to_vec())
    }
}
