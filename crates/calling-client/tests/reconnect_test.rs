//! Mutual exclusion between the two reconnect triggers

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time::{sleep, timeout};

use rvoip_calling_client::{
    CallManagerEvent, CallingClient, CallingClientConfig, MonitorTick, create_client,
};

mod common;
use common::{FakeDiscovery, Fakes};

/// Client whose periodic monitor never fires during a test
async fn quiet_client(fakes: &Fakes) -> CallingClient {
    let config = CallingClientConfig::new().with_network_flap_interval_ms(3_600_000);
    create_client(fakes.context(FakeDiscovery::ranked(&["https://m1.example.com"], &[])), config)
        .await
        .unwrap()
}

/// Put the line into the flapped, unregistered, reconnect-pending state
async fn flap(fakes: &Fakes, client: &CallingClient) {
    fakes.connectivity.set(false);
    assert_eq!(client.network_monitor().tick().await, MonitorTick::Flapped);
    fakes.registration.registered.store(false, Ordering::SeqCst);
    fakes.registration.pending.store(true, Ordering::SeqCst);
    fakes.connectivity.set(true);
}

#[tokio::test(start_paused = true)]
async fn test_restoration_and_calls_cleared_never_overlap() {
    let fakes = Fakes::new();
    let client = quiet_client(&fakes).await;
    flap(&fakes, &client).await;
    fakes.registration.set_work(Duration::from_millis(500));

    let monitor = client.network_monitor();
    let (tick, ()) = tokio::join!(
        monitor.tick(),
        client.reconnect_coordinator().on_all_calls_cleared()
    );

    assert_eq!(tick, MonitorTick::Restored);
    assert_eq!(fakes.registration.restorations.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.registration.reconnects.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.registration.max_concurrent.load(Ordering::SeqCst), 1);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_calls_cleared_event_waits_for_restoration() {
    let fakes = Fakes::new();
    let client = Arc::new(quiet_client(&fakes).await);
    flap(&fakes, &client).await;
    fakes.registration.set_work(Duration::from_millis(500));

    let monitor = client.network_monitor();
    let restoring = tokio::spawn(async move { monitor.tick().await });
    tokio::task::yield_now().await;

    fakes.call_manager.publish(CallManagerEvent::AllCallsCleared);

    assert_eq!(restoring.await.unwrap(), MonitorTick::Restored);
    sleep(Duration::from_secs(2)).await;

    assert_eq!(fakes.registration.restorations.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.registration.reconnects.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.registration.max_concurrent.load(Ordering::SeqCst), 1);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_calls_cleared_ignored_while_registered() {
    let fakes = Fakes::new();
    let client = quiet_client(&fakes).await;
    fakes.registration.registered.store(true, Ordering::SeqCst);
    fakes.registration.pending.store(true, Ordering::SeqCst);

    fakes.call_manager.publish(CallManagerEvent::AllCallsCleared);
    sleep(Duration::from_millis(100)).await;

    assert_eq!(fakes.registration.reconnects.load(Ordering::SeqCst), 0);
    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_calls_cleared_without_pending_reconnect() {
    let fakes = Fakes::new();
    let client = quiet_client(&fakes).await;

    fakes.call_manager.publish(CallManagerEvent::AllCallsCleared);
    sleep(Duration::from_millis(100)).await;

    assert_eq!(fakes.registration.reconnects.load(Ordering::SeqCst), 0);
    client.shutdown().await;
}

#[tokio::test]
async fn test_line_shares_the_reconnect_lock() {
    let fakes = Fakes::new();
    let client = quiet_client(&fakes).await;

    let config = fakes.line_factory.config.lock().clone().unwrap();
    let guard = config.mutex.lock().await;
    assert!(client.reconnect_coordinator().mutex().try_lock().is_err());
    drop(guard);

    client.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_recovery_runs_with_the_line_lock_held() {
    let fakes = Fakes::new();
    let client = quiet_client(&fakes).await;
    flap(&fakes, &client).await;

    let tick = timeout(Duration::from_secs(2), client.network_monitor().tick())
        .await
        .expect("restoration finishes while the registration inspects the shared lock");
    assert_eq!(tick, MonitorTick::Restored);

    timeout(
        Duration::from_secs(2),
        client.reconnect_coordinator().on_all_calls_cleared(),
    )
    .await
    .expect("calls-cleared reconnect finishes");

    assert_eq!(fakes.registration.restorations.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.registration.reconnects.load(Ordering::SeqCst), 1);
    assert_eq!(fakes.registration.ran_under_lock.load(Ordering::SeqCst), 2);

    // Released again once recovery returns
    let config = fakes.line_factory.config.lock().clone().unwrap();
    assert!(config.mutex.try_lock().is_ok());

    client.shutdown().await;
}
