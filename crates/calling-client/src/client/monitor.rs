//! Network flap detection
//!
//! A periodic task watches the transport connection. When the connection drops
//! while no call is active, the line is marked unregistered and its keepalive
//! is stopped; once the connection is back, restoration runs through the
//! [`ReconnectCoordinator`] until the registration reports it is complete.
//!
//! ```text
//!            disconnected && !pending && no calls
//!   STABLE ───────────────────────────────────────► FLAPPED
//!     ▲                                               │
//!     └──────────── connected && restoration done ────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::call::CallManager;
use crate::registration::{LineEvent, LineRegistry};
use crate::transport::ConnectivitySource;

use super::recovery::ReconnectCoordinator;

/// Connection state as seen by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlapState {
    Stable,
    Flapped,
}

/// What a single evaluation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorTick {
    /// Nothing to do
    Idle,
    /// Connection lost, line marked unregistered
    Flapped,
    /// Connection restored and registration recovered
    Restored,
    /// Connection restored but recovery needs another attempt
    StillRecovering,
    /// No line has been created yet
    NoLine,
}

/// Periodic network flap monitor for the client's line
pub struct NetworkMonitor {
    connectivity: Arc<dyn ConnectivitySource>,
    call_manager: Arc<dyn CallManager>,
    lines: Arc<LineRegistry>,
    coordinator: ReconnectCoordinator,
    retry_pending: AtomicBool,
    interval: Duration,
}

impl NetworkMonitor {
    pub fn new(
        connectivity: Arc<dyn ConnectivitySource>,
        call_manager: Arc<dyn CallManager>,
        lines: Arc<LineRegistry>,
        coordinator: ReconnectCoordinator,
        interval: Duration,
    ) -> Self {
        Self {
            connectivity,
            call_manager,
            lines,
            coordinator,
            retry_pending: AtomicBool::new(false),
            interval,
        }
    }

    pub fn is_retry_pending(&self) -> bool {
        self.retry_pending.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> FlapState {
        if self.is_retry_pending() {
            FlapState::Flapped
        } else {
            FlapState::Stable
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Evaluate the connection once
    pub async fn tick(&self) -> MonitorTick {
        let Some(line) = self.lines.primary() else {
            debug!("Network monitor tick without a line");
            return MonitorTick::NoLine;
        };
        let registration = line.registration();
        let mut outcome = MonitorTick::Idle;

        if !self.connectivity.is_connected()
            && !self.is_retry_pending()
            && self.call_manager.active_call_count() == 0
        {
            warn!(
                line_id = %line.line_id(),
                "Network has flapped, waiting for connection to be up"
            );
            line.emit(LineEvent::Unregistered).await;
            registration.clear_keepalive_timer();
            self.retry_pending.store(true, Ordering::SeqCst);
            outcome = MonitorTick::Flapped;
        }

        if self.connectivity.is_connected() && self.is_retry_pending() {
            info!(
                line_id = %line.line_id(),
                "Connection is up again, restoring registration"
            );
            let still_pending = self
                .coordinator
                .restore_connection(registration.as_ref(), true)
                .await;
            self.retry_pending.store(still_pending, Ordering::SeqCst);

            outcome = if still_pending {
                MonitorTick::StillRecovering
            } else {
                MonitorTick::Restored
            };
        }

        outcome
    }

    /// Run [`tick`](Self::tick) every interval until `cancel` fires
    ///
    /// The first evaluation happens one interval after the call.
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            debug!(interval_ms = self.interval.as_millis() as u64, "Network monitor started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Network monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let outcome = self.tick().await;
                        if outcome != MonitorTick::Idle {
                            debug!(?outcome, "Network monitor tick");
                        }
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for NetworkMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkMonitor")
            .field("retry_pending", &self.is_retry_pending())
            .field("interval", &self.interval)
            .finish()
    }
}
