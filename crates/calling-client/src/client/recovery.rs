//! Reconnect coordination
//!
//! Two independent triggers can start a re-registration: the network monitor
//! noticing that connectivity came back, and the call manager reporting that
//! the last call ended while the line was unregistered. Both go through the
//! [`ReconnectCoordinator`], which serializes them on the client-wide lock so
//! at most one recovery procedure runs at any time.
//!
//! The same lock is handed to the line at construction. The coordinator
//! already holds it while it calls into the registration, so registration
//! code reached from here must not lock it again: the lock is not reentrant
//! and recovery would never finish. Code outside those calls may take it to
//! keep out of the way of a running recovery.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::registration::{LineRegistry, Registration};

/// Caller tag passed to `reconnect_on_failure` by the calls-cleared trigger
pub const CALLS_CLEARED_HANDLER: &str = "callsClearedHandler";

/// Serializes reconnect attempts across triggers
#[derive(Debug, Clone)]
pub struct ReconnectCoordinator {
    mutex: Arc<Mutex<()>>,
    lines: Arc<LineRegistry>,
}

impl ReconnectCoordinator {
    pub fn new(mutex: Arc<Mutex<()>>, lines: Arc<LineRegistry>) -> Self {
        Self { mutex, lines }
    }

    /// The lock shared with the line
    pub fn mutex(&self) -> Arc<Mutex<()>> {
        self.mutex.clone()
    }

    /// Re-register after the last active call ended
    ///
    /// Only acts when the line's device is not registered. The pending flag is
    /// checked again after the lock is taken, since the monitor may have
    /// completed recovery while this trigger was waiting.
    pub async fn on_all_calls_cleared(&self) {
        let Some(line) = self.lines.primary() else {
            debug!("All calls cleared but no line exists, nothing to reconnect");
            return;
        };

        let registration = line.registration();
        if registration.is_device_registered() {
            debug!(line_id = %line.line_id(), "All calls cleared, line still registered");
            return;
        }

        let _guard = self.mutex.lock().await;
        if registration.is_reconnect_pending() {
            info!(
                line_id = %line.line_id(),
                caller = CALLS_CLEARED_HANDLER,
                "All calls cleared, retrying registration"
            );
            registration.reconnect_on_failure(CALLS_CLEARED_HANDLER).await;
        } else {
            debug!(line_id = %line.line_id(), "All calls cleared, no reconnect pending");
        }
    }

    /// Restore a registration after connectivity came back
    ///
    /// Holds the lock only around the restoration call and returns its result:
    /// `true` while recovery still needs another attempt.
    pub async fn restore_connection(&self, registration: &dyn Registration, retry: bool) -> bool {
        let _guard = self.mutex.lock().await;
        registration.handle_connection_restoration(retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{DeviceInfo, Line, LineEvent, LineId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct TestRegistration {
        registered: AtomicBool,
        pending: AtomicBool,
        reconnects: AtomicUsize,
        restorations: AtomicUsize,
    }

    #[async_trait]
    impl Registration for TestRegistration {
        fn is_device_registered(&self) -> bool {
            self.registered.load(Ordering::SeqCst)
        }
        fn is_reconnect_pending(&self) -> bool {
            self.pending.load(Ordering::SeqCst)
        }
        async fn reconnect_on_failure(&self, caller: &str) {
            assert_eq!(caller, CALLS_CLEARED_HANDLER);
            self.reconnects.fetch_add(1, Ordering::SeqCst);
        }
        async fn handle_connection_restoration(&self, retry: bool) -> bool {
            self.restorations.fetch_add(1, Ordering::SeqCst);
            !retry
        }
        fn clear_keepalive_timer(&self) {}
        fn get_device_info(&self) -> DeviceInfo {
            DeviceInfo::default()
        }
    }

    struct TestLine(Arc<TestRegistration>);

    #[async_trait]
    impl Line for TestLine {
        fn line_id(&self) -> LineId {
            "line-1".to_string()
        }
        fn registration(&self) -> Arc<dyn Registration> {
            self.0.clone()
        }
        async fn emit(&self, _event: LineEvent) {}
    }

    fn coordinator_with(registration: Arc<TestRegistration>) -> ReconnectCoordinator {
        let lines = Arc::new(LineRegistry::new());
        lines.insert(Arc::new(TestLine(registration))).unwrap();
        ReconnectCoordinator::new(Arc::new(Mutex::new(())), lines)
    }

    #[tokio::test]
    async fn test_calls_cleared_without_line_is_noop() {
        let coordinator =
            ReconnectCoordinator::new(Arc::new(Mutex::new(())), Arc::new(LineRegistry::new()));
        coordinator.on_all_calls_cleared().await;
    }

    #[tokio::test]
    async fn test_calls_cleared_reconnects_only_when_pending() {
        let registration = Arc::new(TestRegistration::default());
        let coordinator = coordinator_with(registration.clone());

        coordinator.on_all_calls_cleared().await;
        assert_eq!(registration.reconnects.load(Ordering::SeqCst), 0);

        registration.pending.store(true, Ordering::SeqCst);
        coordinator.on_all_calls_cleared().await;
        assert_eq!(registration.reconnects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_calls_cleared_skips_registered_line() {
        let registration = Arc::new(TestRegistration::default());
        registration.registered.store(true, Ordering::SeqCst);
        registration.pending.store(true, Ordering::SeqCst);
        let coordinator = coordinator_with(registration.clone());

        coordinator.on_all_calls_cleared().await;
        assert_eq!(registration.reconnects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_restore_connection_returns_registration_result() {
        let registration = Arc::new(TestRegistration::default());
        let coordinator = coordinator_with(registration.clone());

        assert!(coordinator.restore_connection(registration.as_ref(), false).await);
        assert!(!coordinator.restore_connection(registration.as_ref(), true).await);
        assert_eq!(registration.restorations.load(Ordering::SeqCst), 2);
    }
}
