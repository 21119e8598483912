//! Probes and metric sources polled by the monitoring session.
//!
//! Every concrete adapter wraps an external collaborator (an HTTP endpoint or
//! a cloud CLI) and reports failures as `ProbeError`, which the aggregator
//! records as an `Unreachable` dependency instead of aborting the cycle.

pub mod command_probe;
pub mod http_health_probe;
pub mod http_metric_source;

pub use command_probe::CommandProbe;
pub use http_health_probe::HttpHealthProbe;
pub use http_metric_source::HttpMetricSource;

use crate::domain::health::{DependencyHealth, HealthStatus, ProbeError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Health probe for one monitored dependency.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns the dependency name this probe reports under
    fn name(&self) -> &str;

    /// Performs the check
    async fn check(&self) -> Result<ProbeOutcome, ProbeError>;

    /// Upper bound the aggregator waits for `check` before marking the
    /// dependency unreachable
    fn timeout(&self) -> Duration {
        DEFAULT_PROBE_TIMEOUT
    }
}

/// What a probe observed about its dependency
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
    /// Sub-dependencies the checked service reported on itself, keyed by
    /// their own name. The aggregator records each as `<probe>/<entry>`.
    pub entries: BTreeMap<String, DependencyHealth>,
}

impl ProbeOutcome {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            latency_ms: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_status(status: HealthStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            latency_ms: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_entries(mut self, entries: BTreeMap<String, DependencyHealth>) -> Self {
        self.entries = entries;
        self
    }
}

/// Source of externally sampled metrics (CPU, memory, error rate, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn collect(&self) -> Result<BTreeMap<String, f64>, ProbeError>;
}
