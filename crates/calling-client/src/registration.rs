//! Line and registration collaborator boundary
//!
//! The registration protocol itself (device registration handshake, keepalive
//! cadence, failover between primary and backup servers) lives outside this
//! crate. This module defines what the client needs from it:
//!
//! - **Registration** - per-line registration state and recovery procedures
//! - **Line** - a registered endpoint, owning one registration
//! - **LineFactory** - constructs the line once discovery is done
//! - **LineRegistry** - the orchestrator's mapping of line id to line
//!
//! # Single line
//!
//! Exactly one line is supported. [`LineRegistry::insert`] refuses a second
//! line instead of silently generalising to several.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{ClientError, ClientResult};
use crate::logging::LogLevel;
use crate::types::ServiceData;

/// Identifier of a line
pub type LineId = String;

/// Lifecycle status of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineStatus {
    Inactive,
    Active,
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineStatus::Inactive => write!(f, "inactive"),
            LineStatus::Active => write!(f, "active"),
        }
    }
}

/// State transitions injected into a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    Connecting,
    Registered,
    Unregistered,
    Reconnecting,
    Reconnected,
}

/// Device the line is registered as
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub status: String,
}

/// Registration details reported by the registration collaborator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(default)]
    pub device: Option<Device>,
}

impl DeviceInfo {
    pub fn device_id(&self) -> Option<String> {
        self.device.as_ref().map(|d| d.device_id.clone())
    }
}

/// Registration state and recovery procedures of one line
///
/// # Locking
///
/// [`reconnect_on_failure`](Registration::reconnect_on_failure) and
/// [`handle_connection_restoration`](Registration::handle_connection_restoration)
/// are invoked with the client-wide reconnect lock ([`LineConfig::mutex`])
/// already held. Implementations must not acquire that lock from inside
/// them; doing so deadlocks the caller.
#[async_trait]
pub trait Registration: Send + Sync {
    fn is_device_registered(&self) -> bool;

    /// A previous registration attempt did not complete and must be retried
    fn is_reconnect_pending(&self) -> bool;

    /// Re-register after a failure, `caller` names the trigger for logging
    ///
    /// Called with the reconnect lock held.
    async fn reconnect_on_failure(&self, caller: &str);

    /// Restore the registration after connectivity came back
    ///
    /// Returns `true` while recovery is still incomplete and should be retried.
    /// Called with the reconnect lock held.
    async fn handle_connection_restoration(&self, retry: bool) -> bool;

    fn clear_keepalive_timer(&self);

    fn get_device_info(&self) -> DeviceInfo;
}

/// A registered endpoint
#[async_trait]
pub trait Line: Send + Sync {
    fn line_id(&self) -> LineId;

    fn registration(&self) -> Arc<dyn Registration>;

    /// Inject a state transition into the line
    async fn emit(&self, event: LineEvent);
}

/// Everything a line needs at construction
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub user_id: String,
    pub device_url: String,
    pub status: LineStatus,
    /// The client-wide reconnect lock
    ///
    /// Already held whenever the client calls into the line's registration
    /// recovery methods; never lock it from inside them.
    pub mutex: Arc<Mutex<()>>,
    pub primary_mobius_uris: Vec<String>,
    pub backup_mobius_uris: Vec<String>,
    pub log_level: LogLevel,
    pub service_data: ServiceData,
}

/// Constructs lines once the server lists are known
#[async_trait]
pub trait LineFactory: Send + Sync {
    async fn create_line(&self, config: LineConfig) -> ClientResult<Arc<dyn Line>>;
}

/// Lines owned by the client, keyed by line id
///
/// Holds at most one entry.
#[derive(Default)]
pub struct LineRegistry {
    lines: RwLock<HashMap<LineId, Arc<dyn Line>>>,
}

impl LineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the client's line; fails if a line already exists
    pub fn insert(&self, line: Arc<dyn Line>) -> ClientResult<LineId> {
        let mut lines = self.lines.write();
        if let Some(existing) = lines.keys().next() {
            return Err(ClientError::LineAlreadyExists {
                existing: existing.clone(),
            });
        }
        let line_id = line.line_id();
        lines.insert(line_id.clone(), line);
        Ok(line_id)
    }

    /// The single line, if it has been created
    pub fn primary(&self) -> Option<Arc<dyn Line>> {
        self.lines.read().values().next().cloned()
    }

    pub fn get(&self, line_id: &str) -> Option<Arc<dyn Line>> {
        self.lines.read().get(line_id).cloned()
    }

    /// Snapshot of the mapping
    pub fn all(&self) -> HashMap<LineId, Arc<dyn Line>> {
        self.lines.read().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }
}

impl std::fmt::Debug for LineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineRegistry")
            .field("lines", &self.lines.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
