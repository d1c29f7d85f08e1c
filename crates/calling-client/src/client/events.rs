//! Background listeners of the calling client
//!
//! Three long-lived tasks feed the client's event surface:
//!
//! - the session listener, passing session notifications through
//!   [`SessionEventFilter`] before publishing them
//! - the incoming-call forwarder, republishing inbound calls
//! - the calls-cleared listener, handing over to the reconnect coordinator
//!
//! Every task stops when its cancellation token fires or its source channel
//! closes. A lagging receiver logs the number of skipped messages and keeps
//! going.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::call::CallManagerEvent;
use crate::events::{CallingClientEvent, EventEmitter};
use crate::types::CallSessionEvent;

use super::recovery::ReconnectCoordinator;

/// Gates which session notifications reach consumers
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionEventFilter;

impl SessionEventFilter {
    pub fn new() -> Self {
        Self
    }

    /// Keep only calling sessions
    ///
    /// A notification without a session list, or carrying a single
    /// non-calling session, is dropped altogether. Otherwise every non-calling
    /// session is removed and the rest, possibly nothing, is passed on.
    pub fn filter(&self, mut event: CallSessionEvent) -> Option<CallSessionEvent> {
        let sessions = event.data.user_sessions.user_sessions.as_mut()?;

        if sessions.len() == 1 && !sessions[0].is_calling() {
            return None;
        }

        sessions.retain(|session| session.is_calling());
        Some(event)
    }
}

/// Receive the next message, skipping over lag; `None` once cancelled or closed
async fn next_message<T: Clone>(
    receiver: &mut broadcast::Receiver<T>,
    cancel: &CancellationToken,
    source: &'static str,
) -> Option<T> {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return None,
            received = receiver.recv() => match received {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(source, skipped, "Listener lagged behind, messages dropped");
                }
                Err(RecvError::Closed) => {
                    debug!(source, "Source channel closed");
                    return None;
                }
            },
        }
    }
}

/// Publish filtered session notifications
pub fn spawn_session_listener(
    mut sessions: broadcast::Receiver<CallSessionEvent>,
    filter: SessionEventFilter,
    emitter: EventEmitter,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = next_message(&mut sessions, &cancel, "session_events").await {
            match filter.filter(event) {
                Some(filtered) => {
                    debug!(
                        sessions = filtered.sessions().len(),
                        "Publishing user session info"
                    );
                    emitter.emit(CallingClientEvent::UserSessionInfo(filtered));
                }
                None => debug!("Dropping non-calling session notification"),
            }
        }
        debug!("Session listener stopped");
    })
}

/// React to call manager events
///
/// Inbound calls are republished; a calls-cleared notification triggers the
/// reconnect coordinator.
pub fn spawn_call_manager_listener(
    mut calls: broadcast::Receiver<CallManagerEvent>,
    emitter: EventEmitter,
    coordinator: ReconnectCoordinator,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = next_message(&mut calls, &cancel, "call_manager").await {
            match event {
                CallManagerEvent::IncomingCall(call) => {
                    info!(
                        call_id = %call.call_id(),
                        correlation_id = %call.correlation_id(),
                        "Incoming call"
                    );
                    emitter.emit(CallingClientEvent::IncomingCall(call));
                }
                CallManagerEvent::AllCallsCleared => {
                    coordinator.on_all_calls_cleared().await;
                }
            }
        }
        debug!("Call manager listener stopped");
    })
}
