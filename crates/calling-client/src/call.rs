//! Call-management collaborator boundary
//!
//! The call state machine and its media transport live outside this crate.
//! The client only needs to create outbound calls, look calls up, count the
//! active ones and react to the [`CallManagerEvent`]s the manager publishes.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Identifier the call manager uses to key calls
pub type CorrelationId = String;

/// Direction of a call relative to this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

/// Addressing scheme of a dial target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Uri,
    Tel,
}

/// Destination of an outbound call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDetails {
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub address: String,
}

impl CallDetails {
    pub fn new(call_type: CallType, address: impl Into<String>) -> Self {
        Self {
            call_type,
            address: address.into(),
        }
    }
}

/// A call owned by the call manager
pub trait Call: std::fmt::Debug + Send + Sync {
    fn call_id(&self) -> String;

    fn correlation_id(&self) -> CorrelationId;

    fn direction(&self) -> CallDirection;

    /// Destination the call was placed to, if outbound
    fn destination(&self) -> Option<CallDetails> {
        None
    }
}

/// Notifications published by the call manager
#[derive(Debug, Clone)]
pub enum CallManagerEvent {
    /// A new inbound call arrived
    IncomingCall(Arc<dyn Call>),
    /// The last active call went away
    AllCallsCleared,
}

/// Call-management collaborator
pub trait CallManager: Send + Sync {
    /// All calls that have not yet been torn down
    fn get_active_calls(&self) -> HashMap<CorrelationId, Arc<dyn Call>>;

    /// Construct a call; the manager owns it from then on
    fn create_call(
        &self,
        dest: &CallDetails,
        direction: CallDirection,
        device_id: Option<String>,
    ) -> Arc<dyn Call>;

    fn get_call(&self, correlation_id: &CorrelationId) -> Option<Arc<dyn Call>>;

    /// Subscribe to incoming-call and calls-cleared notifications
    fn subscribe(&self) -> broadcast::Receiver<CallManagerEvent>;

    fn active_call_count(&self) -> usize {
        self.get_active_calls().len()
    }
}
