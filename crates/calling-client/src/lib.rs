//! # Calling Client - signaling discovery and resilience core
//!
//! This crate is the client-side core of a real-time calling signaling client:
//! - **discovery**: locates the signaling server cluster for the client's region,
//!   with ranked primary and backup servers
//! - **network monitor**: detects connectivity flaps and drives registration recovery
//! - **reconnect coordination**: serializes reconnect attempts across triggers
//! - **session events**: passes only calling sessions on to consumers
//! - **outbound calls**: validates and normalises dial strings
//!
//! The call state machine, the registration protocol and the transport event
//! bus are collaborators, reached through the traits in [`call`],
//! [`registration`] and [`transport`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rvoip_calling_client::{
//!     CallDetails, CallType, CallingClientBuilder, CallingClientConfig, CallingClientEvent,
//!     DeviceIdentity,
//! };
//! # use std::sync::Arc;
//! # use rvoip_calling_client::{CallManager, LineFactory, ConnectivitySource, SessionEventSource};
//! # async fn run(
//! #     call_manager: Arc<dyn CallManager>,
//! #     line_factory: Arc<dyn LineFactory>,
//! #     connectivity: Arc<dyn ConnectivitySource>,
//! #     sessions: Arc<dyn SessionEventSource>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let client = CallingClientBuilder::new(
//!         DeviceIdentity::new("user-1", "https://wdm.example.com/devices/1"),
//!         "https://mobius.example.com/api/v1",
//!     )
//!     .call_manager(call_manager)
//!     .line_factory(line_factory)
//!     .connectivity(connectivity)
//!     .session_events(sessions)
//!     .config(CallingClientConfig::load(None)?)
//!     .start()
//!     .await?;
//!
//! let mut events = client.subscribe();
//! client.make_call(Some(&CallDetails::new(CallType::Uri, "+1 (415) 555-0100")));
//!
//! while let Ok(event) = events.recv().await {
//!     if let CallingClientEvent::Error(err) = event {
//!         eprintln!("{:?}: {}", err.error_type, err);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod client;
pub mod discovery;
pub mod error;
pub mod events;
pub mod logging;
pub mod metrics;
pub mod registration;
pub mod transport;
pub mod types;

// Re-export main types
pub use call::{Call, CallDetails, CallDirection, CallManager, CallManagerEvent, CallType, CorrelationId};
pub use client::{
    CallingClient, CallingClientBuilder, CallingClientConfig, CallingContext, DeviceIdentity,
    MonitorTick, NetworkMonitor, ReconnectCoordinator, SessionEventFilter, create_client,
};
pub use discovery::{DiscoveryEngine, DiscoveryTransport, HttpDiscoveryTransport, filter_mobius_uris};
pub use error::{CallingClientError, ClientError, ClientResult, ErrorContext, ErrorType, MobiusStatus};
pub use events::{CallingClientEvent, EventEmitter, EventStream};
pub use logging::{LogLevel, LoggingConfig, setup_logging};
pub use self::metrics::{CounterMetricsSink, MetricEvent, MetricType, MetricsSink, RegAction};
pub use registration::{Line, LineConfig, LineEvent, LineFactory, LineId, LineRegistry, LineStatus, Registration};
pub use transport::{ConnectivitySource, SessionEventSource};
pub use types::{CallSessionEvent, MobiusUriSet, RegionInfo, ServiceData, ServiceIndicator, SessionType, UserSession};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
