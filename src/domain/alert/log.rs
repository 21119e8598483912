use super::entity::{Alert, AlertCategory, AlertSeverity};
use std::collections::BTreeMap;

/// Append-only record of every alert raised during a session.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    pub fn extend(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        self.alerts.extend(alerts);
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn count_severity(&self, severity: AlertSeverity) -> u64 {
        self.alerts.iter().filter(|a| a.severity == severity).count() as u64
    }

    pub fn by_severity(&self) -> BTreeMap<AlertSeverity, u64> {
        let mut counts = BTreeMap::new();
        for alert in &self.alerts {
            *counts.entry(alert.severity).or_insert(0) += 1;
        }
        counts
    }

    pub fn by_category(&self) -> BTreeMap<AlertCategory, u64> {
        let mut counts = BTreeMap::new();
        for alert in &self.alerts {
            *counts.entry(alert.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn highest_severity(&self) -> Option<AlertSeverity> {
        self.alerts.iter().map(|a| a.severity).max()
    }
}
