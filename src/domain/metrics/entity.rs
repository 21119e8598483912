use crate::domain::health::{HealthSample, HealthStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub const RESPONSE_TIME_MS: &str = "response_time_ms";
pub const AGGREGATION_TIME_MS: &str = "aggregation_time_ms";
pub const FAILING_DEPENDENCIES: &str = "failing_dependencies";
pub const DEGRADED_DEPENDENCIES: &str = "degraded_dependencies";
pub const HEALTHY_RATIO_PERCENT: &str = "healthy_ratio_percent";

/// Metric names that `MetricSample::from_health` can produce.
pub const HEALTH_METRICS: [&str; 5] = [
    RESPONSE_TIME_MS,
    AGGREGATION_TIME_MS,
    FAILING_DEPENDENCIES,
    DEGRADED_DEPENDENCIES,
    HEALTHY_RATIO_PERCENT,
];

/// One point-in-time capture of named numeric metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    id: Uuid,
    timestamp: DateTime<Utc>,
    values: BTreeMap<String, f64>,
}

impl MetricSample {
    pub fn new(values: BTreeMap<String, f64>) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            values,
        }
    }

    /// Metrics derived from a health sample. The sample's id and timestamp
    /// are reused so alerts raised on these values point back to it.
    ///
    /// `response_time_ms` is the application's own response time and
    /// `aggregation_time_ms` the whole cycle; each is left out when the
    /// sample does not carry it.
    pub fn from_health(sample: &HealthSample) -> Self {
        let total = sample.dependencies().len();
        let healthy = sample.count_with(|s| s == HealthStatus::Healthy);

        let mut values = BTreeMap::new();
        if let Some(response_time) = sample.response_time_ms() {
            values.insert(RESPONSE_TIME_MS.to_string(), response_time as f64);
        }
        if let Some(latency) = sample.latency_ms() {
            values.insert(AGGREGATION_TIME_MS.to_string(), latency as f64);
        }
        // An aggregator-level failure counts as one failing dependency.
        let failing = if sample.error().is_some() {
            1
        } else {
            sample.count_with(HealthStatus::is_failing)
        };
        values.insert(FAILING_DEPENDENCIES.to_string(), failing as f64);
        values.insert(
            DEGRADED_DEPENDENCIES.to_string(),
            sample.count_with(|s| s == HealthStatus::Degraded) as f64,
        );
        let ratio = if total > 0 {
            healthy as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        values.insert(HEALTHY_RATIO_PERCENT.to_string(), ratio);

        Self {
            id: sample.id(),
            timestamp: sample.timestamp(),
            values,
        }
    }

    /// Returns a copy with `other` merged in. Existing names are overwritten.
    pub fn merged(&self, other: BTreeMap<String, f64>) -> Self {
        let mut values = self.values.clone();
        values.extend(other);
        Self {
            id: self.id,
            timestamp: self.timestamp,
            values,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }
}
