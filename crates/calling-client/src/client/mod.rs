//! Calling client orchestrator
//!
//! [`CallingClient`] ties the pieces together:
//!
//! 1. [`CallingClient::new`] validates the configuration and starts the
//!    session and call-manager listeners
//! 2. [`CallingClient::init`] discovers the signaling servers, creates the line
//!    and starts the network monitor
//! 3. [`CallingClient::shutdown`] stops every background task
//!
//! [`create_client`] runs the first two steps.

pub mod builder;
pub mod calls;
pub mod config;
pub mod events;
pub mod monitor;
pub mod recovery;


use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::discovery::DiscoveryEngine;
use crate::error::{ClientError, ClientResult};
use crate::events::{CallingClientEvent, EventEmitter, EventStream};
use crate::logging::LogLevel;
use crate::registration::{Line, LineConfig, LineId, LineRegistry, LineStatus};
use crate::types::MobiusUriSet;

pub use builder::{CallingClientBuilder, CallingContext, DeviceIdentity};
pub use self::config::CallingClientConfig;
pub use events::SessionEventFilter;
pub use monitor::{FlapState, MonitorTick, NetworkMonitor};
pub use recovery::ReconnectCoordinator;

/// The calling client
pub struct CallingClient {
    context: CallingContext,
    config: CallingClientConfig,
    emitter: EventEmitter,
    lines: Arc<LineRegistry>,
    mutex: Arc<Mutex<()>>,
    /// Held for the whole of `init` so only one line is ever created
    init_lock: Mutex<()>,
    coordinator: ReconnectCoordinator,
    monitor: Arc<NetworkMonitor>,
    discovery: DiscoveryEngine,
    mobius_uris: RwLock<MobiusUriSet>,
    cancel: CancellationToken,
    tasks: SyncMutex<Vec<JoinHandle<()>>>,
}

impl CallingClient {
    /// Create the client and start its listeners
    ///
    /// Must be called from within a tokio runtime. Fails only on invalid
    /// service data.
    pub fn new(context: CallingContext, config: CallingClientConfig) -> ClientResult<Self> {
        self::config::validate_service_data(&config.service_data())?;

        let emitter = EventEmitter::new(config.event_channel_capacity.max(1));
        let lines = Arc::new(LineRegistry::new());
        let mutex = Arc::new(Mutex::new(()));
        let coordinator = ReconnectCoordinator::new(mutex.clone(), lines.clone());

        let monitor = Arc::new(NetworkMonitor::new(
            context.connectivity.clone(),
            context.call_manager.clone(),
            lines.clone(),
            coordinator.clone(),
            config.network_flap_interval(),
        ));

        let discovery = DiscoveryEngine::new(
            context.discovery.clone(),
            context.metrics.clone(),
            emitter.clone(),
            context.mobius_base.clone(),
        )
        .with_static_region(config.static_region().cloned());

        let cancel = CancellationToken::new();

        let session_listener = events::spawn_session_listener(
            context.session_events.subscribe_session_events(),
            SessionEventFilter::new(),
            emitter.clone(),
            cancel.child_token(),
        );
        let call_listener = events::spawn_call_manager_listener(
            context.call_manager.subscribe(),
            emitter.clone(),
            coordinator.clone(),
            cancel.child_token(),
        );

        debug!(user_id = %context.identity.user_id, "Calling client created");

        Ok(Self {
            context,
            config,
            emitter,
            lines,
            mutex,
            init_lock: Mutex::new(()),
            coordinator,
            monitor,
            discovery,
            mobius_uris: RwLock::new(MobiusUriSet::default()),
            cancel,
            tasks: SyncMutex::new(vec![session_listener, call_listener]),
        })
    }

    /// Discover servers, create the line and start the network monitor
    ///
    /// Discovery itself never fails; an error here comes from line creation.
    /// Concurrent calls are serialized, and every call after the first
    /// successful one returns [`ClientError::LineAlreadyExists`] without
    /// reaching the line factory.
    pub async fn init(&self) -> ClientResult<()> {
        let _init = self.init_lock.lock().await;
        if let Some(existing) = self.lines.primary() {
            return Err(ClientError::LineAlreadyExists {
                existing: existing.line_id(),
            });
        }

        let uris = self.discovery.discover_servers().await;
        *self.mobius_uris.write() = uris.clone();

        let line = self
            .context
            .line_factory
            .create_line(LineConfig {
                user_id: self.context.identity.user_id.clone(),
                device_url: self.context.identity.device_url.clone(),
                status: LineStatus::Inactive,
                mutex: self.mutex.clone(),
                primary_mobius_uris: uris.primary,
                backup_mobius_uris: uris.backup,
                log_level: self.get_logging_level(),
                service_data: self.config.service_data(),
            })
            .await?;
        let line_id = self.lines.insert(line)?;
        info!(line_id = %line_id, "Line created");

        let handle = self.monitor.clone().spawn(self.cancel.child_token());
        self.tasks.lock().push(handle);

        Ok(())
    }

    /// Stop every background task and wait for them to finish
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for result in join_all(tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "Background task ended abnormally");
            }
        }
        info!("Calling client shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Lines of this client; at most one
    pub fn get_lines(&self) -> HashMap<LineId, Arc<dyn Line>> {
        self.lines.all()
    }

    pub fn get_logging_level(&self) -> LogLevel {
        self.config.logger.level
    }

    /// Server lists found by the last discovery
    pub fn mobius_uris(&self) -> MobiusUriSet {
        self.mobius_uris.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallingClientEvent> {
        self.emitter.subscribe()
    }

    pub fn subscribe_stream(&self) -> EventStream {
        self.emitter.subscribe_stream()
    }

    pub fn network_monitor(&self) -> Arc<NetworkMonitor> {
        self.monitor.clone()
    }

    pub fn reconnect_coordinator(&self) -> &ReconnectCoordinator {
        &self.coordinator
    }

    pub fn config(&self) -> &CallingClientConfig {
        &self.config
    }
}

impl Drop for CallingClient {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for CallingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallingClient")
            .field("context", &self.context)
            .field("lines", &self.lines)
            .field("monitor", &self.monitor)
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}

/// Create a client and initialise it
pub async fn create_client(
    context: CallingContext,
    config: CallingClientConfig,
) -> ClientResult<CallingClient> {
    let client = CallingClient::new(context, config)?;
    client.init().await?;
    Ok(client)
}
