use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Health status levels, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
    Unreachable,
}

impl HealthStatus {
    /// Unhealthy and unreachable dependencies both fail the overall check.
    pub fn is_failing(self) -> bool {
        matches!(self, Self::Unhealthy | Self::Unreachable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Degraded => "Degraded",
            Self::Unhealthy => "Unhealthy",
            Self::Unreachable => "Unreachable",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single probed dependency within one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyHealth {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

impl DependencyHealth {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unreachable,
            message: Some(message.into()),
            latency_ms: None,
        }
    }
}

/// One point-in-time capture of every dependency's health.
///
/// Built once per poll cycle by the aggregator and never mutated afterwards;
/// fields are private so a sample cannot be edited once it is in a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    id: Uuid,
    timestamp: DateTime<Utc>,
    overall: HealthStatus,
    latency_ms: Option<u64>,
    response_time_ms: Option<u64>,
    dependencies: BTreeMap<String, DependencyHealth>,
    error: Option<String>,
}

impl HealthSample {
    /// Builds a sample from per-dependency results, deriving the overall status.
    pub fn from_dependencies(
        dependencies: BTreeMap<String, DependencyHealth>,
        latency_ms: Option<u64>,
    ) -> Self {
        let overall = overall_status(dependencies.values().map(|d| d.status));
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            overall,
            latency_ms,
            response_time_ms: None,
            dependencies,
            error: None,
        }
    }

    /// Sets the monitored application's own response time, as opposed to
    /// `latency_ms`, which covers every probe in the cycle.
    pub fn with_response_time(mut self, response_time_ms: Option<u64>) -> Self {
        self.response_time_ms = response_time_ms;
        self
    }

    /// Sample for a cycle where the aggregator itself could not finish.
    ///
    /// The application did not answer within `latency_ms`, so that bound is
    /// also its response time.
    pub fn unreachable(error: impl Into<String>, latency_ms: Option<u64>) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            overall: HealthStatus::Unreachable,
            latency_ms,
            response_time_ms: latency_ms,
            dependencies: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn overall(&self) -> HealthStatus {
        self.overall
    }

    pub fn latency_ms(&self) -> Option<u64> {
        self.latency_ms
    }

    pub fn response_time_ms(&self) -> Option<u64> {
        self.response_time_ms
    }

    pub fn dependencies(&self) -> &BTreeMap<String, DependencyHealth> {
        &self.dependencies
    }

    pub fn dependency(&self, name: &str) -> Option<&DependencyHealth> {
        self.dependencies.get(name)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn count_with(&self, predicate: impl Fn(HealthStatus) -> bool) -> usize {
        self.dependencies
            .values()
            .filter(|d| predicate(d.status))
            .count()
    }
}

/// Worst-case-wins: any failing dependency makes the whole set unhealthy,
/// otherwise any non-healthy one degrades it.
pub fn overall_status<I>(statuses: I) -> HealthStatus
where
    I: IntoIterator<Item = HealthStatus>,
{
    let mut overall = HealthStatus::Healthy;
    for status in statuses {
        if status.is_failing() {
            return HealthStatus::Unhealthy;
        }
        if status != HealthStatus::Healthy {
            overall = HealthStatus::Degraded;
        }
    }
    overall
}
