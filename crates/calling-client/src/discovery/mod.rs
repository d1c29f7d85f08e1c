//! Signaling server discovery
//!
//! Resolves the client's region and country, asks the signaling service for
//! the ranked server list of that region and turns it into ordered primary
//! and backup URI lists. Discovery never fails: every error path degrades to
//! the default endpoint derived from the configured service base URL.
//!
//! ```text
//! static region? ──yes──────────────────────────┐
//!      │ no                                     ▼
//!      ▼                             region && country known?
//!  own IP ──► region by IP ──────────►    │ yes          │ no
//!                                         ▼              │
//!                                  ranked server list    │
//!                                         │              │
//!                                  filter_mobius_uris    │
//!                                         │              │
//!                                         ▼              ▼
//!                              primary empty? ──yes──► [default]
//! ```

pub mod http;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::client::config::DiscoveryConfig;
use crate::error::{CallingClientError, ClientError, ClientResult, ErrorContext};
use crate::events::{CallingClientEvent, EventEmitter};
use crate::metrics::{MetricEvent, MetricType, MetricsSink, RegAction};
use crate::types::{MobiusServers, MobiusUriSet, RegionInfo};

pub use http::{DiscoveryTransport, HttpDiscoveryTransport};

/// Path of the calling API below the service base URL
pub const URL_ENDPOINT: &str = "/calling/web/";
/// Own-IP resource below [`URL_ENDPOINT`]
pub const IP_ENDPOINT: &str = "myip";
/// Public region discovery service
pub const DISCOVERY_URL: &str = "https://ds.ciscospark.com/v1/region";

const DISCOVERY_FILE: &str = "discovery";
const GET_MOBIUS_SERVERS_UTIL: &str = "get_mobius_servers";
const GET_CLIENT_REGION_INFO: &str = "get_client_region_info";

/// Default endpoint for a service base URL
pub fn default_mobius_uri(mobius_base: &str) -> String {
    format!("{}{}", mobius_base.trim_end_matches('/'), URL_ENDPOINT)
}

/// Turn a ranked server response into primary and backup URI lists
///
/// Each URI gets the calling endpoint appended, order is preserved and
/// duplicates are dropped. The default endpoint of `mobius_base` is appended
/// to the backups when neither list already contains it.
pub fn filter_mobius_uris(servers: &MobiusServers, mobius_base: &str) -> MobiusUriSet {
    fn with_endpoint(uris: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(uris.len());
        for uri in uris {
            let full = format!("{}{}", uri.trim_end_matches('/'), URL_ENDPOINT);
            if !out.contains(&full) {
                out.push(full);
            }
        }
        out
    }

    let primary = with_endpoint(&servers.primary.uris);
    let mut backup: Vec<String> = with_endpoint(&servers.backup.uris)
        .into_iter()
        .filter(|uri| !primary.contains(uri))
        .collect();

    let default_uri = default_mobius_uri(mobius_base);
    if !primary.contains(&default_uri) && !backup.contains(&default_uri) {
        backup.push(default_uri);
    }

    MobiusUriSet { primary, backup }
}

/// Region-aware signaling server discovery
pub struct DiscoveryEngine {
    transport: Arc<dyn DiscoveryTransport>,
    metrics: Arc<dyn MetricsSink>,
    emitter: EventEmitter,
    mobius_base: String,
    static_region: Option<DiscoveryConfig>,
}

impl DiscoveryEngine {
    pub fn new(
        transport: Arc<dyn DiscoveryTransport>,
        metrics: Arc<dyn MetricsSink>,
        emitter: EventEmitter,
        mobius_base: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            metrics,
            emitter,
            mobius_base: mobius_base.into(),
            static_region: None,
        }
    }

    /// Use a configured region/country instead of IP geolocation
    ///
    /// Ignored unless both region and country are non-empty.
    pub fn with_static_region(mut self, discovery: Option<DiscoveryConfig>) -> Self {
        self.static_region = discovery.filter(|d| d.is_complete());
        self
    }

    pub fn default_uri(&self) -> String {
        default_mobius_uri(&self.mobius_base)
    }

    /// Discover the signaling servers to register against
    ///
    /// The returned `primary` list is never empty.
    pub async fn discover_servers(&self) -> MobiusUriSet {
        let region = match &self.static_region {
            Some(discovery) => {
                info!(
                    file = DISCOVERY_FILE,
                    method = GET_MOBIUS_SERVERS_UTIL,
                    "Updating region and country from the client config"
                );
                RegionInfo::new(discovery.region.clone(), discovery.country.clone())
            }
            None => {
                info!(
                    file = DISCOVERY_FILE,
                    method = GET_MOBIUS_SERVERS_UTIL,
                    "Updating region and country through region discovery"
                );
                self.get_client_region_info().await
            }
        };

        let mut uris = MobiusUriSet::default();

        if region.is_resolved() {
            debug!(
                region = %region.client_region,
                country = %region.country_code,
                "Found region and country, going to fetch Mobius servers"
            );

            match self
                .transport
                .fetch_mobius_servers(&region.client_region, &region.country_code)
                .await
            {
                Ok(servers) => {
                    debug!("Mobius servers found for the region");
                    uris = filter_mobius_uris(&servers, &self.mobius_base);
                    info!(
                        primary = ?uris.primary,
                        backup = ?uris.backup,
                        "Final list of Mobius servers"
                    );
                }
                Err(e) => self.report_failure(&e, GET_MOBIUS_SERVERS_UTIL),
            }
        }

        if uris.primary.is_empty() {
            warn!("Error in finding Mobius servers. Will use the default URL.");
            let default_uri = self.default_uri();
            uris.backup.retain(|uri| uri != &default_uri);
            uris.primary = vec![default_uri];
        }

        uris
    }

    /// Region and country of this client; empty on any failure
    pub async fn get_client_region_info(&self) -> RegionInfo {
        match self.lookup_region().await {
            Ok(region) => region,
            Err(e) => {
                self.report_failure(&e, GET_CLIENT_REGION_INFO);
                RegionInfo::default()
            }
        }
    }

    async fn lookup_region(&self) -> ClientResult<RegionInfo> {
        let ip = self.transport.fetch_own_ip().await?;
        if ip.ipv4.is_empty() {
            return Err(ClientError::DecodeError {
                reason: "own IP missing from response".to_string(),
            });
        }

        let info = self.transport.fetch_region_info(&ip.ipv4).await?;
        Ok(RegionInfo::from(info))
    }

    /// Classify, count and publish a discovery failure
    fn report_failure(&self, err: &ClientError, method: &str) {
        warn!(
            error = %err,
            category = err.category(),
            file = DISCOVERY_FILE,
            method = method,
            "Discovery request failed"
        );

        let client_error =
            CallingClientError::from_client_error(err, ErrorContext::new(DISCOVERY_FILE, method));

        self.metrics.submit_registration_metric(
            MetricEvent::RegistrationError,
            RegAction::Register,
            MetricType::Behavioral,
            Some(client_error.clone()),
        );
        self.emitter.emit(CallingClientEvent::Error(client_error));
    }
}
