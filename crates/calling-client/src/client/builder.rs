//! Client builder and dependency bundle
//!
//! A [`CallingClient`] does not reach for any process-wide connector. Every
//! collaborator it talks to is handed over explicitly in a [`CallingContext`],
//! which the [`CallingClientBuilder`] assembles with defaults for the parts
//! that have one (HTTP discovery transport, `metrics` counter sink).
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rvoip_calling_client::{CallingClientBuilder, CallingClientConfig, DeviceIdentity};
//! # use rvoip_calling_client::{CallManager, LineFactory, ConnectivitySource, SessionEventSource};
//! # async fn run(
//! #     call_manager: Arc<dyn CallManager>,
//! #     line_factory: Arc<dyn LineFactory>,
//! #     connectivity: Arc<dyn ConnectivitySource>,
//! #     sessions: Arc<dyn SessionEventSource>,
//! # ) -> rvoip_calling_client::ClientResult<()> {
//! let client = CallingClientBuilder::new(
//!         DeviceIdentity::new("user-1", "https://wdm.example.com/devices/1"),
//!         "https://mobius.example.com/api/v1",
//!     )
//!     .call_manager(call_manager)
//!     .line_factory(line_factory)
//!     .connectivity(connectivity)
//!     .session_events(sessions)
//!     .config(CallingClientConfig::new().with_discovery("US-EAST", "US"))
//!     .start()
//!     .await?;
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::call::CallManager;
use crate::discovery::{DiscoveryTransport, HttpDiscoveryTransport};
use crate::error::{ClientError, ClientResult};
use crate::metrics::{CounterMetricsSink, MetricsSink};
use crate::registration::LineFactory;
use crate::transport::{ConnectivitySource, SessionEventSource};

use super::CallingClient;
use super::config::CallingClientConfig;

/// Who this client registers as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub user_id: String,
    pub device_url: String,
}

impl DeviceIdentity {
    pub fn new(user_id: impl Into<String>, device_url: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            device_url: device_url.into(),
        }
    }
}

/// Everything a [`CallingClient`] depends on
#[derive(Clone)]
pub struct CallingContext {
    pub identity: DeviceIdentity,
    /// Base URL of the signaling service, also the discovery fallback
    pub mobius_base: String,
    pub call_manager: Arc<dyn CallManager>,
    pub line_factory: Arc<dyn LineFactory>,
    pub connectivity: Arc<dyn ConnectivitySource>,
    pub session_events: Arc<dyn SessionEventSource>,
    pub discovery: Arc<dyn DiscoveryTransport>,
    pub metrics: Arc<dyn MetricsSink>,
}

impl std::fmt::Debug for CallingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallingContext")
            .field("identity", &self.identity)
            .field("mobius_base", &self.mobius_base)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`CallingContext`] and [`CallingClient`]
pub struct CallingClientBuilder {
    identity: DeviceIdentity,
    mobius_base: String,
    config: CallingClientConfig,
    call_manager: Option<Arc<dyn CallManager>>,
    line_factory: Option<Arc<dyn LineFactory>>,
    connectivity: Option<Arc<dyn ConnectivitySource>>,
    session_events: Option<Arc<dyn SessionEventSource>>,
    discovery: Option<Arc<dyn DiscoveryTransport>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    access_token: Option<String>,
}

impl CallingClientBuilder {
    pub fn new(identity: DeviceIdentity, mobius_base: impl Into<String>) -> Self {
        Self {
            identity,
            mobius_base: mobius_base.into(),
            config: CallingClientConfig::default(),
            call_manager: None,
            line_factory: None,
            connectivity: None,
            session_events: None,
            discovery: None,
            metrics: None,
            access_token: None,
        }
    }

    pub fn config(mut self, config: CallingClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn call_manager(mut self, call_manager: Arc<dyn CallManager>) -> Self {
        self.call_manager = Some(call_manager);
        self
    }

    pub fn line_factory(mut self, line_factory: Arc<dyn LineFactory>) -> Self {
        self.line_factory = Some(line_factory);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivitySource>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn session_events(mut self, session_events: Arc<dyn SessionEventSource>) -> Self {
        self.session_events = Some(session_events);
        self
    }

    /// Replace the default HTTP discovery transport
    pub fn discovery_transport(mut self, discovery: Arc<dyn DiscoveryTransport>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Replace the default `metrics` counter sink
    pub fn metrics_sink(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Bearer token for the default HTTP discovery transport
    pub fn access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Assemble the dependency bundle
    pub fn build_context(self) -> ClientResult<(CallingContext, CallingClientConfig)> {
        let discovery: Arc<dyn DiscoveryTransport> = match self.discovery {
            Some(discovery) => discovery,
            None => {
                let mut transport =
                    HttpDiscoveryTransport::new(&self.mobius_base, &self.identity.device_url)?;
                if let Some(token) = self.access_token {
                    transport = transport.with_access_token(token);
                }
                Arc::new(transport)
            }
        };

        let context = CallingContext {
            call_manager: required(self.call_manager, "call_manager")?,
            line_factory: required(self.line_factory, "line_factory")?,
            connectivity: required(self.connectivity, "connectivity")?,
            session_events: required(self.session_events, "session_events")?,
            discovery,
            metrics: self.metrics.unwrap_or_else(|| Arc::new(CounterMetricsSink)),
            identity: self.identity,
            mobius_base: self.mobius_base,
        };

        Ok((context, self.config))
    }

    /// Construct the client without running discovery
    pub fn build(self) -> ClientResult<CallingClient> {
        let (context, config) = self.build_context()?;
        CallingClient::new(context, config)
    }

    /// Construct the client and run discovery, line creation and monitoring
    pub async fn start(self) -> ClientResult<CallingClient> {
        let (context, config) = self.build_context()?;
        super::create_client(context, config).await
    }
}

fn required<T: ?Sized>(value: Option<Arc<T>>, field: &str) -> ClientResult<Arc<T>> {
    value.ok_or_else(|| ClientError::invalid_configuration(field, "collaborator is required"))
}
