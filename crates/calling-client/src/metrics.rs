//! Behavioral metrics emitted by the calling client
//!
//! The client reports through the [`MetricsSink`] trait. [`CounterMetricsSink`]
//! forwards to the `metrics` facade so any installed recorder (Prometheus
//! exporter, statsd, ...) picks the counters up.

use serde::{Deserialize, Serialize};

use crate::error::CallingClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricEvent {
    Registration,
    RegistrationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegAction {
    Register,
    Deregister,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Behavioral,
    Operational,
}

impl MetricEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricEvent::Registration => "registration",
            MetricEvent::RegistrationError => "registration_error",
        }
    }
}

impl RegAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegAction::Register => "register",
            RegAction::Deregister => "deregister",
        }
    }
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Behavioral => "behavioral",
            MetricType::Operational => "operational",
        }
    }
}

/// Receiver of registration metrics
#[cfg_attr(test, mockall::automock)]
pub trait MetricsSink: Send + Sync {
    fn submit_registration_metric(
        &self,
        event: MetricEvent,
        action: RegAction,
        metric_type: MetricType,
        error: Option<CallingClientError>,
    );
}

/// Name of the counter incremented by [`CounterMetricsSink`]
pub const REGISTRATION_METRIC: &str = "calling_client_registration_total";

/// [`MetricsSink`] backed by the `metrics` facade
#[derive(Debug, Clone, Default)]
pub struct CounterMetricsSink;

impl MetricsSink for CounterMetricsSink {
    fn submit_registration_metric(
        &self,
        event: MetricEvent,
        action: RegAction,
        metric_type: MetricType,
        error: Option<CallingClientError>,
    ) {
        let error_type = error
            .as_ref()
            .map(|e| format!("{:?}", e.error_type))
            .unwrap_or_else(|| "none".to_string());

        ::metrics::counter!(
            REGISTRATION_METRIC,
            "event" => event.as_str(),
            "action" => action.as_str(),
            "type" => metric_type.as_str(),
            "error_type" => error_type
        )
        .increment(1);
    }
}
