//! Event surface of the calling client
//!
//! The client publishes a closed set of events on a tokio broadcast channel:
//!
//! - **Error** - a classified [`CallingClientError`]
//! - **IncomingCall** - an inbound call forwarded from the call manager
//! - **UserSessionInfo** - a session notification, already filtered down to
//!   calling sessions
//!
//! # Usage Examples
//!
//! ```rust
//! use rvoip_calling_client::events::{CallingClientEvent, EventEmitter};
//!
//! # tokio_test::block_on(async {
//! let emitter = EventEmitter::new(16);
//! let mut events = emitter.subscribe();
//!
//! emitter.emit(CallingClientEvent::UserSessionInfo(Default::default()));
//!
//! match events.recv().await {
//!     Ok(CallingClientEvent::UserSessionInfo(event)) => assert!(event.sessions().is_empty()),
//!     other => panic!("unexpected event: {:?}", other),
//! }
//! # })
//! ```

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::call::Call;
use crate::error::CallingClientError;
use crate::types::CallSessionEvent;

/// Events emitted by the calling client
#[derive(Debug, Clone)]
pub enum CallingClientEvent {
    /// A classified client error
    Error(CallingClientError),
    /// An inbound call from the call manager
    IncomingCall(Arc<dyn Call>),
    /// A session notification containing only calling sessions
    UserSessionInfo(CallSessionEvent),
}

impl CallingClientEvent {
    /// Stable name of the event kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            CallingClientEvent::Error(_) => "error",
            CallingClientEvent::IncomingCall(_) => "incoming_call",
            CallingClientEvent::UserSessionInfo(_) => "user_session_info",
        }
    }
}

/// Event stream type
pub type EventStream = BroadcastStream<CallingClientEvent>;

/// Broadcast emitter for [`CallingClientEvent`]s
#[derive(Clone)]
pub struct EventEmitter {
    sender: broadcast::Sender<CallingClientEvent>,
}

impl EventEmitter {
    /// Create a new event emitter with the specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to every current subscriber
    pub fn emit(&self, event: CallingClientEvent) {
        tracing::trace!(kind = event.kind(), receivers = self.sender.receiver_count(), "Emitting event");
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CallingClientEvent> {
        self.sender.subscribe()
    }

    /// Subscribe as a `Stream`
    pub fn subscribe_stream(&self) -> EventStream {
        BroadcastStream::new(self.sender.subscribe())
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("receivers", &self.sender.receiver_count())
            .finish()
    }
}
