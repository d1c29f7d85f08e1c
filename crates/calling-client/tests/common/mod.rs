//! Hand-written collaborators shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use rvoip_calling_client::registration::{Device, DeviceInfo};
use rvoip_calling_client::types::{ClientRegionInfo, IpInfo, MobiusServerGroup, MobiusServers};
use rvoip_calling_client::{
    Call, CallDetails, CallDirection, CallManager, CallManagerEvent, CallSessionEvent,
    CallingClientError, CallingContext, ClientError, ClientResult, ConnectivitySource,
    CorrelationId, DeviceIdentity, DiscoveryTransport, Line, LineConfig, LineEvent, LineFactory,
    LineId, MetricEvent, MetricType, MetricsSink, RegAction, Registration, SessionEventSource,
};

pub const MOBIUS_BASE: &str = "https://mobius.example.com/api/v1";

// ===== REGISTRATION =====

/// Registration that records how often, and how concurrently, recovery ran
#[derive(Default)]
pub struct FakeRegistration {
    pub registered: AtomicBool,
    pub pending: AtomicBool,
    pub reconnects: AtomicUsize,
    pub restorations: AtomicUsize,
    pub keepalive_cleared: AtomicUsize,
    /// Results handed out by `handle_connection_restoration`, `false` once drained
    pub restoration_results: Mutex<VecDeque<bool>>,
    pub work: Mutex<Duration>,
    in_critical: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    /// The reconnect lock handed over in `LineConfig`
    pub shared_lock: Mutex<Option<Arc<tokio::sync::Mutex<()>>>>,
    /// Recovery calls that found the reconnect lock already taken
    pub ran_under_lock: AtomicUsize,
}

impl FakeRegistration {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_work(&self, work: Duration) {
        *self.work.lock() = work;
    }

    async fn critical_section(&self) {
        let shared = self.shared_lock.lock().clone();
        if let Some(lock) = shared {
            if lock.try_lock().is_err() {
                self.ran_under_lock.fetch_add(1, Ordering::SeqCst);
            }
        }

        let now = self.in_critical.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now, Ordering::SeqCst);
        let work = *self.work.lock();
        if !work.is_zero() {
            tokio::time::sleep(work).await;
        }
        self.in_critical.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Registration for FakeRegistration {
    fn is_device_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    fn is_reconnect_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    async fn reconnect_on_failure(&self, _caller: &str) {
        self.critical_section().await;
        self.reconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn handle_connection_restoration(&self, _retry: bool) -> bool {
        self.critical_section().await;
        self.restorations.fetch_add(1, Ordering::SeqCst);
        self.restoration_results.lock().pop_front().unwrap_or(false)
    }

    fn clear_keepalive_timer(&self) {
        self.keepalive_cleared.fetch_add(1, Ordering::SeqCst);
    }

    fn get_device_info(&self) -> DeviceInfo {
        DeviceInfo {
            device: Some(Device {
                device_id: "device-1".to_string(),
                ..Default::default()
            }),
        }
    }
}

// ===== LINE =====

pub struct FakeLine {
    pub registration: Arc<FakeRegistration>,
    pub events: Mutex<Vec<LineEvent>>,
}

impl FakeLine {
    pub fn new(registration: Arc<FakeRegistration>) -> Arc<Self> {
        Arc::new(Self {
            registration,
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn count(&self, event: LineEvent) -> usize {
        self.events.lock().iter().filter(|e| **e == event).count()
    }
}

#[async_trait]
impl Line for FakeLine {
    fn line_id(&self) -> LineId {
        "line-1".to_string()
    }

    fn registration(&self) -> Arc<dyn Registration> {
        self.registration.clone()
    }

    async fn emit(&self, event: LineEvent) {
        self.events.lock().push(event);
    }
}

pub struct FakeLineFactory {
    pub line: Arc<FakeLine>,
    pub config: Mutex<Option<LineConfig>>,
}

impl FakeLineFactory {
    pub fn new(line: Arc<FakeLine>) -> Arc<Self> {
        Arc::new(Self {
            line,
            config: Mutex::new(None),
        })
    }
}

#[async_trait]
impl LineFactory for FakeLineFactory {
    async fn create_line(&self, config: LineConfig) -> ClientResult<Arc<dyn Line>> {
        *self.line.registration.shared_lock.lock() = Some(config.mutex.clone());
        *self.config.lock() = Some(config);
        Ok(self.line.clone())
    }
}

// ===== CALLS =====

#[derive(Debug)]
pub struct FakeCall {
    pub id: String,
    pub direction: CallDirection,
    pub dest: Option<CallDetails>,
    pub device_id: Option<String>,
}

impl FakeCall {
    pub fn inbound(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            direction: CallDirection::Inbound,
            dest: None,
            device_id: None,
        })
    }
}

impl Call for FakeCall {
    fn call_id(&self) -> String {
        self.id.clone()
    }

    fn correlation_id(&self) -> CorrelationId {
        format!("corr-{}", self.id)
    }

    fn direction(&self) -> CallDirection {
        self.direction
    }

    fn destination(&self) -> Option<CallDetails> {
        self.dest.clone()
    }
}

pub struct FakeCallManager {
    pub events: broadcast::Sender<CallManagerEvent>,
    pub active: Mutex<HashMap<CorrelationId, Arc<dyn Call>>>,
    pub created: Mutex<Vec<Arc<FakeCall>>>,
}

impl FakeCallManager {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            events,
            active: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
        })
    }

    pub fn set_active(&self, call: Arc<dyn Call>) {
        self.active.lock().insert(call.correlation_id(), call);
    }

    pub fn clear_active(&self) {
        self.active.lock().clear();
    }

    pub fn publish(&self, event: CallManagerEvent) {
        let _ = self.events.send(event);
    }
}

impl CallManager for FakeCallManager {
    fn get_active_calls(&self) -> HashMap<CorrelationId, Arc<dyn Call>> {
        self.active.lock().clone()
    }

    fn create_call(&self, dest: &CallDetails, direction: CallDirection, device_id: Option<String>) -> Arc<dyn Call> {
        let call = Arc::new(FakeCall {
            id: format!("out-{}", self.created.lock().len() + 1),
            direction,
            dest: Some(dest.clone()),
            device_id,
        });
        self.created.lock().push(call.clone());
        call
    }

    fn get_call(&self, correlation_id: &CorrelationId) -> Option<Arc<dyn Call>> {
        self.created
            .lock()
            .iter()
            .find(|c| &c.correlation_id() == correlation_id)
            .map(|c| c.clone() as Arc<dyn Call>)
    }

    fn subscribe(&self) -> broadcast::Receiver<CallManagerEvent> {
        self.events.subscribe()
    }
}

// ===== TRANSPORT =====

pub struct FakeConnectivity(pub AtomicBool);

impl FakeConnectivity {
    pub fn new(connected: bool) -> Arc<Self> {
        Arc::new(Self(AtomicBool::new(connected)))
    }

    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::SeqCst);
    }
}

impl ConnectivitySource for FakeConnectivity {
    fn is_connected(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct FakeSessionSource {
    pub sender: broadcast::Sender<CallSessionEvent>,
}

impl FakeSessionSource {
    pub fn new() -> Arc<Self> {
        let (sender, _) = broadcast::channel(16);
        Arc::new(Self { sender })
    }
}

impl SessionEventSource for FakeSessionSource {
    fn subscribe_session_events(&self) -> broadcast::Receiver<CallSessionEvent> {
        self.sender.subscribe()
    }
}

// ===== DISCOVERY AND METRICS =====

/// Discovery transport answering from canned results
pub struct FakeDiscovery {
    pub ip: ClientResult<IpInfo>,
    pub region: ClientResult<ClientRegionInfo>,
    pub servers: ClientResult<MobiusServers>,
}

impl FakeDiscovery {
    pub fn ranked(primary: &[&str], backup: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            ip: Ok(IpInfo {
                ipv4: "198.51.100.4".to_string(),
            }),
            region: Ok(ClientRegionInfo {
                client_region: Some("US-EAST".to_string()),
                country_code: Some("US".to_string()),
                ..Default::default()
            }),
            servers: Ok(MobiusServers {
                primary: MobiusServerGroup {
                    region: "US-EAST".to_string(),
                    uris: primary.iter().map(|s| s.to_string()).collect(),
                },
                backup: MobiusServerGroup {
                    region: "US-WEST".to_string(),
                    uris: backup.iter().map(|s| s.to_string()).collect(),
                },
            }),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        let err = ClientError::NetworkError {
            reason: "connection refused".to_string(),
        };
        Arc::new(Self {
            ip: Err(err.clone()),
            region: Err(err.clone()),
            servers: Err(err),
        })
    }
}

#[async_trait]
impl DiscoveryTransport for FakeDiscovery {
    async fn fetch_own_ip(&self) -> ClientResult<IpInfo> {
        self.ip.clone()
    }

    async fn fetch_region_info(&self, _ip: &str) -> ClientResult<ClientRegionInfo> {
        self.region.clone()
    }

    async fn fetch_mobius_servers(&self, _region: &str, _country: &str) -> ClientResult<MobiusServers> {
        self.servers.clone()
    }
}

#[derive(Default)]
pub struct RecordingMetrics {
    pub submitted: Mutex<Vec<(MetricEvent, RegAction, MetricType, Option<CallingClientError>)>>,
}

impl MetricsSink for RecordingMetrics {
    fn submit_registration_metric(
        &self,
        event: MetricEvent,
        action: RegAction,
        metric_type: MetricType,
        error: Option<CallingClientError>,
    ) {
        self.submitted.lock().push((event, action, metric_type, error));
    }
}

// ===== CONTEXT =====

pub struct Fakes {
    pub registration: Arc<FakeRegistration>,
    pub line: Arc<FakeLine>,
    pub line_factory: Arc<FakeLineFactory>,
    pub call_manager: Arc<FakeCallManager>,
    pub connectivity: Arc<FakeConnectivity>,
    pub sessions: Arc<FakeSessionSource>,
    pub metrics: Arc<RecordingMetrics>,
}

impl Fakes {
    pub fn new() -> Self {
        let registration = FakeRegistration::new();
        let line = FakeLine::new(registration.clone());
        Self {
            registration,
            line_factory: FakeLineFactory::new(line.clone()),
            line,
            call_manager: FakeCallManager::new(),
            connectivity: FakeConnectivity::new(true),
            sessions: FakeSessionSource::new(),
            metrics: Arc::new(RecordingMetrics::default()),
        }
    }

    pub fn context(&self, discovery: Arc<dyn DiscoveryTransport>) -> CallingContext {
        CallingContext {
            identity: DeviceIdentity::new("user-1", "https://wdm.example.com/devices/1"),
            mobius_base: MOBIUS_BASE.to_string(),
            call_manager: self.call_manager.clone(),
            line_factory: self.line_factory.clone(),
            connectivity: self.connectivity.clone(),
            session_events: self.sessions.clone(),
            discovery,
            metrics: self.metrics.clone(),
        }
    }
}
