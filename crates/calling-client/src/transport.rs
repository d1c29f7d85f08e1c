//! Transport event bus boundary
//!
//! The persistent push connection to the backend is owned elsewhere. The
//! client polls its connectivity and listens to the session notifications it
//! relays.

use tokio::sync::broadcast;

use crate::types::CallSessionEvent;

/// Connectivity of the push transport, polled by the network monitor
pub trait ConnectivitySource: Send + Sync {
    fn is_connected(&self) -> bool;
}

/// Source of inclusive session notifications
pub trait SessionEventSource: Send + Sync {
    fn subscribe_session_events(&self) -> broadcast::Receiver<CallSessionEvent>;
}
