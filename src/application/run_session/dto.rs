use crate::domain::alert::{Alert, AlertCategory, AlertSeverity};
use crate::domain::health::{HealthSample, HealthStatus};
use crate::domain::metrics::MetricSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Timing and retention settings for one monitoring session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionSettings {
    /// Total run time; zero means the session stops before the first cycle
    pub duration_seconds: u64,

    /// Pause between the end of one cycle and the start of the next
    #[validate(range(min = 1, max = 86_400))]
    pub interval_seconds: u64,

    /// Samples kept for trend display and export
    #[validate(range(min = 1, max = 10_000))]
    pub history_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            duration_seconds: 300,
            interval_seconds: 30,
            history_capacity: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    DurationElapsed,
    Cancelled,
    Failed(String),
}

/// Everything produced by a single poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    pub cycle: u64,
    pub health: HealthSample,
    pub metrics: MetricSample,
    pub alerts: Vec<Alert>,
}

pub const EXIT_CLEAN: u8 = 0;
pub const EXIT_WARNINGS: u8 = 1;
/// Critical alerts, a failed session, or a run that could not start.
pub const EXIT_FAILED: u8 = 2;

/// Session statistics computed over every cycle, not just the retained history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub environment: String,
    pub state: SessionState,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub configured_duration_seconds: u64,
    pub elapsed_seconds: f64,
    pub sample_count: u64,
    pub samples_by_status: BTreeMap<HealthStatus, u64>,
    pub health_percentage: f64,
    pub average_latency_ms: Option<f64>,
    pub alert_count: u64,
    pub alerts_by_severity: BTreeMap<AlertSeverity, u64>,
    pub alerts_by_category: BTreeMap<AlertCategory, u64>,
    pub stop_reason: Option<StopReason>,
}

impl SessionSummary {
    pub fn alerts_with(&self, severity: AlertSeverity) -> u64 {
        self.alerts_by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn failed(&self) -> bool {
        matches!(self.stop_reason, Some(StopReason::Failed(_)))
    }

    /// Process exit code: 2 for critical alerts or a failed session, 1 for
    /// warnings only, 0 when clean.
    pub fn exit_code(&self) -> u8 {
        if self.failed() || self.alerts_with(AlertSeverity::Critical) > 0 {
            EXIT_FAILED
        } else if self.alerts_with(AlertSeverity::Warning) > 0 {
            EXIT_WARNINGS
        } else {
            EXIT_CLEAN
        }
    }
}

/// Finished session handed to a `ReportSink`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub summary: SessionSummary,
    pub exit_code: u8,
    pub health_history: Vec<HealthSample>,
    pub metric_history: Vec<MetricSample>,
    pub alerts: Vec<Alert>,
}
