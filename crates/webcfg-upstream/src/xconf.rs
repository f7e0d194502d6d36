//! Primary telemetry catalog source (xconf).
//!
//! `GET {host}{path}?{query}` returns a JSON object whose `profiles`
//! array holds the base catalog.

use url::Url;
use webcfg_core::RequestContext;

use crate::client::UpstreamClient;
use crate::error::UpstreamError;

const SERVICE: &str = "xconf";

#[derive(Debug, Clone)]
pub struct XconfConnector {
    client: UpstreamClient,
    host: Url,
    path: String,
}

impl XconfConnector {
    pub fn new(client: UpstreamClient, host: Url, path: impl Into<String>) -> Self {
        Self {
            client,
            host,
            path: path.into(),
        }
    }

    /// Fetch the base catalog for an already-built query string.
    pub async fn get_profiles(
        &self,
        query: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<u8>, UpstreamError> {
        let endpoint = format!("{SERVICE} GET {}", self.path);
        let mut url = self
            .host
            .join(&self.path)
            .map_err(|e| UpstreamError::InvalidUrl {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        if !query.is_empty() {
            url.set_query(Some(query));
        }
        self.client.get_bytes(&endpoint, &url, ctx).await
    }
}
