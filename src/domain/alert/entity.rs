use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Area of the system an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertCategory {
    Health,
    Performance,
    Reliability,
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Health => "Health",
            Self::Performance => "Performance",
            Self::Reliability => "Reliability",
        };
        f.write_str(label)
    }
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Warning => "Warning",
            Self::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// A threshold breach observed on one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub category: AlertCategory,
    pub severity: AlertSeverity,
    pub metric: String,
    pub current_value: f64,
    pub threshold: f64,
    pub message: String,
    /// Id of the sample whose value crossed the threshold
    pub sample_id: Uuid,
}
