use crate::domain::alert::{Alert, AlertLog, ThresholdRule};
use crate::domain::metrics::MetricSample;
use crate::domain::shared::errors::MonitorError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Compares metric samples against a fixed rule set.
///
/// There is no cooldown: a rule that stays breached raises a new alert on
/// every evaluated sample.
pub struct ThresholdEvaluator {
    rules: Vec<ThresholdRule>,
}

impl ThresholdEvaluator {
    /// # Errors
    ///
    /// Returns a configuration error if any rule fails validation.
    pub fn new(rules: Vec<ThresholdRule>) -> Result<Self, MonitorError> {
        for rule in &rules {
            rule.check()?;
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    /// Evaluates every rule against `sample`.
    ///
    /// # Errors
    ///
    /// Fails fast with `RuleEvaluation` when a rule names a metric the sample
    /// does not carry; no alerts are returned in that case.
    pub fn evaluate(&self, sample: &MetricSample) -> Result<Vec<Alert>, MonitorError> {
        self.evaluate_matching(sample, |_| true)
    }

    /// Evaluates only the rules accepted by `filter`.
    pub fn evaluate_matching<F>(
        &self,
        sample: &MetricSample,
        filter: F,
    ) -> Result<Vec<Alert>, MonitorError>
    where
        F: Fn(&ThresholdRule) -> bool,
    {
        let mut alerts = Vec::new();

        for rule in self.rules.iter().filter(|r| filter(r)) {
            let observed = sample.get(&rule.metric).ok_or_else(|| MonitorError::RuleEvaluation {
                metric: rule.metric.clone(),
                reason: format!("metric missing from sample {}", sample.id()),
            })?;

            if !rule.is_breached_by(observed) {
                continue;
            }

            let alert = Alert {
                id: Uuid::now_v7(),
                created_at: chrono::Utc::now(),
                category: rule.category,
                severity: rule.severity,
                metric: rule.metric.clone(),
                current_value: observed,
                threshold: rule.bound,
                message: rule.describe_breach(observed),
                sample_id: sample.id(),
            };
            warn!(
                severity = %alert.severity,
                category = %alert.category,
                metric = %alert.metric,
                "{}",
                alert.message
            );
            alerts.push(alert);
        }

        debug!(rules = self.rules.len(), fired = alerts.len(), "thresholds evaluated");
        Ok(alerts)
    }

    /// Evaluates and appends the resulting alerts to `log`.
    ///
    /// Nothing is appended when evaluation fails.
    pub fn evaluate_into(
        &self,
        sample: &MetricSample,
        log: &mut AlertLog,
    ) -> Result<usize, MonitorError> {
        let alerts = self.evaluate(sample)?;
        let fired = alerts.len();
        log.extend(alerts);
        Ok(fired)
    }
}
