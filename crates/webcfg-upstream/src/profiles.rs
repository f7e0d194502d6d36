//! Secondary telemetry catalog source.
//!
//! `GET {host}/api/v1/device/{mac}/profiles?{params}` returns a bare JSON
//! array of extra profiles selected by the device's stored query params.

use url::Url;
use webcfg_core::{DeviceMac, RequestContext};

use crate::client::UpstreamClient;
use crate::error::UpstreamError;

const SERVICE: &str = "profiles";

#[derive(Debug, Clone)]
pub struct ProfilesConnector {
    client: UpstreamClient,
    host: Url,
}

impl ProfilesConnector {
    pub fn new(client: UpstreamClient, host: Url) -> Self {
        Self { client, host }
    }

    pub async fn get_profiles(
        &self,
        mac: &DeviceMac,
        params: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<u8>, UpstreamError> {
        let path = format!("/api/v1/device/{mac}/profiles");
        let endpoint = format!("{SERVICE} GET {path}");
        let mut url = self.host.join(&path).map_err(|e| UpstreamError::InvalidUrl {
            endpoint: endpoint.clone(),
            reason: e.to_string(),
        })?;
        if !params.is_empty() {
            url.set_query(Some(params));
        }
        self.client.get_bytes(&endpoint, &url, ctx).await
    }
}
