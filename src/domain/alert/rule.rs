//! Static threshold rules evaluated against every metric sample.

use super::entity::{AlertCategory, AlertSeverity};
use crate::domain::metrics::{DEGRADED_DEPENDENCIES, FAILING_DEPENDENCIES, RESPONSE_TIME_MS};
use crate::domain::shared::errors::MonitorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
    LessThan,
}

impl Comparison {
    /// Strict comparison: a value equal to the bound never fires.
    pub fn holds(self, observed: f64, bound: f64) -> bool {
        match self {
            Self::GreaterThan => observed > bound,
            Self::LessThan => observed < bound,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::GreaterThan => ">",
            Self::LessThan => "<",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `metric <op> bound → severity` rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ThresholdRule {
    #[validate(length(min = 1, max = 128))]
    pub metric: String,
    pub comparison: Comparison,
    pub bound: f64,
    pub severity: AlertSeverity,
    pub category: AlertCategory,
}

impl ThresholdRule {
    pub fn new(
        metric: impl Into<String>,
        comparison: Comparison,
        bound: f64,
        severity: AlertSeverity,
        category: AlertCategory,
    ) -> Result<Self, MonitorError> {
        let rule = Self {
            metric: metric.into(),
            comparison,
            bound,
            severity,
            category,
        };
        rule.check()?;
        Ok(rule)
    }

    pub fn above(
        metric: impl Into<String>,
        bound: f64,
        severity: AlertSeverity,
        category: AlertCategory,
    ) -> Result<Self, MonitorError> {
        Self::new(metric, Comparison::GreaterThan, bound, severity, category)
    }

    pub fn below(
        metric: impl Into<String>,
        bound: f64,
        severity: AlertSeverity,
        category: AlertCategory,
    ) -> Result<Self, MonitorError> {
        Self::new(metric, Comparison::LessThan, bound, severity, category)
    }

    /// Validates a rule that was deserialized rather than constructed.
    pub fn check(&self) -> Result<(), MonitorError> {
        self.validate().map_err(|e| {
            MonitorError::Configuration(format!("invalid rule for '{}': {}", self.metric, e))
        })?;
        if !self.bound.is_finite() {
            return Err(MonitorError::Configuration(format!(
                "invalid rule for '{}': bound must be finite",
                self.metric
            )));
        }
        Ok(())
    }

    pub fn is_breached_by(&self, observed: f64) -> bool {
        self.comparison.holds(observed, self.bound)
    }

    pub fn describe_breach(&self, observed: f64) -> String {
        format!(
            "{} is {} ({} threshold {})",
            self.metric,
            format_value(observed),
            self.comparison,
            format_value(self.bound)
        )
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Threshold defaults applied when no rules file is configured.
///
/// Resource rules are only included when an external metric source supplies
/// `cpu_percent`, `memory_percent` and `error_rate_percent`. There is no
/// default rule on `aggregation_time_ms`: slow cloud CLI probes lengthen a
/// cycle without saying anything about the application.
pub fn default_rules(with_resource_metrics: bool) -> Vec<ThresholdRule> {
    use AlertCategory::*;
    use AlertSeverity::*;

    let mut rules = vec![
        rule(RESPONSE_TIME_MS, 2000.0, Warning, Performance),
        rule(RESPONSE_TIME_MS, 5000.0, Critical, Performance),
        rule(FAILING_DEPENDENCIES, 0.0, Critical, Health),
        rule(DEGRADED_DEPENDENCIES, 0.0, Warning, Health),
    ];
    if with_resource_metrics {
        rules.extend([
            rule("cpu_percent", 80.0, Warning, Performance),
            rule("cpu_percent", 90.0, Critical, Performance),
            rule("memory_percent", 85.0, Warning, Performance),
            rule("error_rate_percent", 5.0, Critical, Reliability),
        ]);
    }
    rules
}

fn rule(metric: &str, bound: f64, severity: AlertSeverity, category: AlertCategory) -> ThresholdRule {
    ThresholdRule {
        metric: metric.to_string(),
        comparison: Comparison::GreaterThan,
        bound,
        severity,
        category,
    }
}
