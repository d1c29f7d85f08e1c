//! Client configuration
//!
//! # Key Components
//!
//! - **CallingClientConfig** - top-level configuration handed to the client
//! - **DiscoveryConfig** - static region/country that bypasses IP geolocation
//! - **LoggerConfig** - log level reported by the client
//!
//! # Sources
//!
//! Configuration can be built in code with the `with_*` setters or loaded with
//! [`CallingClientConfig::load`], which layers (lowest to highest priority):
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. `CALLING__*` environment variables (`CALLING__DISCOVERY__REGION=US-EAST`)
//!
//! # Usage Examples
//!
//! ```rust
//! use rvoip_calling_client::client::config::CallingClientConfig;
//! use rvoip_calling_client::logging::LogLevel;
//!
//! let config = CallingClientConfig::new()
//!     .with_discovery("US-EAST", "US")
//!     .with_log_level(LogLevel::Info)
//!     .with_network_flap_interval_ms(500);
//!
//! assert_eq!(config.discovery.as_ref().unwrap().region, "US-EAST");
//! assert_eq!(config.network_flap_interval().as_millis(), 500);
//! ```

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::logging::LogLevel;
use crate::types::{ServiceData, ServiceIndicator};

/// Interval of the network flap check
pub const NETWORK_FLAP_TIMEOUT_MS: u64 = 2000;

/// Default capacity of the client event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

static SERVICE_DOMAIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9_-]+\.)*[A-Za-z0-9][A-Za-z0-9_-]+\.[A-Za-z]{2,11}$")
        .expect("valid service domain regex")
});

/// Static region information; skips region discovery when both are set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub country: String,
}

impl DiscoveryConfig {
    pub fn is_complete(&self) -> bool {
        !self.region.is_empty() && !self.country.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Configuration of the calling client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallingClientConfig {
    pub discovery: Option<DiscoveryConfig>,
    pub service_data: Option<ServiceData>,
    pub logger: LoggerConfig,
    /// Period of the network flap check in milliseconds
    pub network_flap_interval_ms: u64,
    pub event_channel_capacity: usize,
}

impl Default for CallingClientConfig {
    fn default() -> Self {
        Self {
            discovery: None,
            service_data: None,
            logger: LoggerConfig::default(),
            network_flap_interval_ms: NETWORK_FLAP_TIMEOUT_MS,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

impl CallingClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from defaults, an optional TOML file and the environment
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CALLING")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: CallingClientConfig = builder.build()?.try_deserialize()?;
        validate_service_data(&config.service_data())?;
        Ok(config)
    }

    pub fn with_discovery(mut self, region: impl Into<String>, country: impl Into<String>) -> Self {
        self.discovery = Some(DiscoveryConfig {
            region: region.into(),
            country: country.into(),
        });
        self
    }

    pub fn with_service_data(mut self, service_data: ServiceData) -> Self {
        self.service_data = Some(service_data);
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.logger.level = level;
        self
    }

    pub fn with_network_flap_interval_ms(mut self, interval_ms: u64) -> Self {
        self.network_flap_interval_ms = interval_ms;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Effective service data, defaulting to plain calling with no domain
    pub fn service_data(&self) -> ServiceData {
        self.service_data.clone().unwrap_or_default()
    }

    /// Static region/country, only when both are present
    pub fn static_region(&self) -> Option<&DiscoveryConfig> {
        self.discovery.as_ref().filter(|d| d.is_complete())
    }

    pub fn network_flap_interval(&self) -> Duration {
        Duration::from_millis(self.network_flap_interval_ms.max(1))
    }
}

/// Check the service indicator and domain
///
/// A non-empty domain must look like a DNS name; contact center service
/// requires one.
pub fn validate_service_data(service_data: &ServiceData) -> ClientResult<()> {
    let domain = service_data.domain.as_str();

    if service_data.indicator == ServiceIndicator::ContactCenter && domain.is_empty() {
        return Err(ClientError::invalid_configuration(
            "service_data.domain",
            format!("a domain is required for the {} service", service_data.indicator),
        ));
    }

    if !domain.is_empty() && !SERVICE_DOMAIN_REGEX.is_match(domain) {
        return Err(ClientError::invalid_configuration(
            "service_data.domain",
            format!("invalid service domain: {}", domain),
        ));
    }

    Ok(())
}
