//! HTTP transport for signaling server discovery
//!
//! Three GET requests are involved:
//!
//! 1. own public IP from the signaling service (`{base}/calling/web/myip`)
//! 2. region/country for that IP from the public discovery service
//! 3. the ranked server list for a region/country pair
//!
//! Any non-success status is returned as [`ClientError::Http`]; the discovery
//! engine decides how to degrade.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::types::{ClientRegionInfo, IpInfo, MobiusServers};

use super::{DISCOVERY_URL, IP_ENDPOINT, URL_ENDPOINT};

pub const CISCO_DEVICE_URL: &str = "cisco-device-url";
pub const SPARK_USER_AGENT: &str = "spark-user-agent";
pub const CALLING_USER_AGENT: &str = "webex-calling/beta";

/// Requests the discovery engine needs answered
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryTransport: Send + Sync {
    /// Public IP of this client as seen by the signaling service
    async fn fetch_own_ip(&self) -> ClientResult<IpInfo>;

    /// Region and country of an IP address
    async fn fetch_region_info(&self, ip: &str) -> ClientResult<ClientRegionInfo>;

    /// Ranked signaling servers for a region/country pair
    async fn fetch_mobius_servers(&self, region: &str, country: &str) -> ClientResult<MobiusServers>;
}

/// [`DiscoveryTransport`] backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpDiscoveryTransport {
    client: reqwest::Client,
    mobius_base: String,
    discovery_url: String,
    device_url: String,
    access_token: Option<String>,
    timeout: Option<Duration>,
}

impl HttpDiscoveryTransport {
    /// Create a transport for the given service base URL and device URL
    pub fn new(mobius_base: impl Into<String>, device_url: impl Into<String>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::internal_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(client, mobius_base, device_url))
    }

    pub fn with_client(
        client: reqwest::Client,
        mobius_base: impl Into<String>,
        device_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            mobius_base: mobius_base.into().trim_end_matches('/').to_string(),
            discovery_url: DISCOVERY_URL.to_string(),
            device_url: device_url.into(),
            access_token: None,
            timeout: None,
        }
    }

    /// Override the public region discovery endpoint
    pub fn with_discovery_url(mut self, discovery_url: impl Into<String>) -> Self {
        self.discovery_url = discovery_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bearer token sent to the signaling service (never to the public discovery endpoint)
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Per-request timeout; without one the client default applies
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn get(&self, url: Url) -> RequestBuilder {
        let request = self.client.get(url);
        match self.timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    fn service_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(device_url) = HeaderValue::from_str(&self.device_url) {
            headers.insert(CISCO_DEVICE_URL, device_url);
        }
        headers.insert(SPARK_USER_AGENT, HeaderValue::from_static(CALLING_USER_AGENT));
        headers
    }

    fn parse_url(&self, raw: &str) -> ClientResult<Url> {
        Url::parse(raw).map_err(|e| {
            ClientError::invalid_configuration("mobius_base", format!("{}: {}", raw, e))
        })
    }

    async fn get_service<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        debug!(uri = %url, "GET signaling service");
        let mut request = self.get(url).headers(self.service_headers());
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl DiscoveryTransport for HttpDiscoveryTransport {
    async fn fetch_own_ip(&self) -> ClientResult<IpInfo> {
        let url = self.parse_url(&format!("{}{}{}", self.mobius_base, URL_ENDPOINT, IP_ENDPOINT))?;
        self.get_service(url).await
    }

    async fn fetch_region_info(&self, ip: &str) -> ClientResult<ClientRegionInfo> {
        let url = self.parse_url(&format!("{}/{}", self.discovery_url, ip))?;
        debug!(uri = %url, "GET region discovery");
        let response = self.get(url).send().await?.error_for_status()?;
        Ok(response.json::<ClientRegionInfo>().await?)
    }

    async fn fetch_mobius_servers(&self, region: &str, country: &str) -> ClientResult<MobiusServers> {
        let mut url = self.parse_url(&format!("{}{}", self.mobius_base, URL_ENDPOINT))?;
        url.query_pairs_mut()
            .append_pair("regionCode", region)
            .append_pair("countryCode", country);
        self.get_service(url).await
    }
}
