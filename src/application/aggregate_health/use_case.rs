use crate::domain::health::{DependencyHealth, HealthSample, ProbeError};
use crate::domain::shared::errors::MonitorError;
use crate::infrastructure::monitoring::Probe;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Polls every registered probe in order and folds the answers into one
/// `HealthSample`.
///
/// The first probe is the monitored application itself: its latency becomes
/// the sample's response time. Sub-dependencies a probe reports (for example
/// the `results` of an ASP.NET `/health` body) are recorded as
/// `<probe>/<entry>` and count towards the overall status like any other
/// dependency.
pub struct HealthAggregator {
    probes: Vec<Arc<dyn Probe>>,
    cycle_timeout: Option<Duration>,
}

impl HealthAggregator {
    /// # Errors
    ///
    /// Returns a configuration error when no probes are given, a probe name
    /// is empty or contains `/`, or two probes share a name.
    pub fn new(probes: Vec<Arc<dyn Probe>>) -> Result<Self, MonitorError> {
        if probes.is_empty() {
            return Err(MonitorError::Configuration(
                "at least one probe is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for probe in &probes {
            let name = probe.name();
            if name.is_empty() || name.contains(ENTRY_SEPARATOR) {
                return Err(MonitorError::Configuration(format!(
                    "invalid probe name '{}'",
                    name
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(MonitorError::Configuration(format!(
                    "duplicate probe name '{}'",
                    name
                )));
            }
        }
        Ok(Self {
            probes,
            cycle_timeout: None,
        })
    }

    /// Bounds the whole aggregation; exceeding it yields an `Unreachable` sample.
    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = Some(timeout);
        self
    }

    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Runs one aggregation. Never fails: probe errors become `Unreachable`
    /// dependencies and an aggregation timeout becomes an `Unreachable` sample.
    #[instrument(skip(self), fields(probes = self.probes.len()))]
    pub async fn aggregate(&self) -> HealthSample {
        let start_time = Instant::now();

        let dependencies = match self.cycle_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.poll_all()).await {
                Ok(dependencies) => dependencies,
                Err(_) => {
                    warn!(timeout = ?limit, "health aggregation timed out");
                    return HealthSample::unreachable(
                        format!("health aggregation exceeded {:?}", limit),
                        Some(elapsed_ms(start_time)),
                    );
                }
            },
            None => self.poll_all().await,
        };

        let response_time = self
            .probes
            .first()
            .and_then(|p| dependencies.get(p.name()))
            .and_then(|d| d.latency_ms);
        let sample = HealthSample::from_dependencies(dependencies, Some(elapsed_ms(start_time)))
            .with_response_time(response_time);
        debug!(
            overall = %sample.overall(),
            latency_ms = ?sample.latency_ms(),
            response_time_ms = ?sample.response_time_ms(),
            "health aggregated"
        );
        sample
    }

    async fn poll_all(&self) -> BTreeMap<String, DependencyHealth> {
        let mut dependencies = BTreeMap::new();

        for probe in &self.probes {
            let probe_start = Instant::now();
            let result = tokio::time::timeout(probe.timeout(), probe.check()).await;
            let measured = elapsed_ms(probe_start);

            let health = match result {
                Ok(Ok(outcome)) => {
                    for (entry, health) in outcome.entries {
                        dependencies.insert(
                            format!("{}{}{}", probe.name(), ENTRY_SEPARATOR, entry),
                            health,
                        );
                    }
                    DependencyHealth {
                        status: outcome.status,
                        message: outcome.message,
                        latency_ms: Some(outcome.latency_ms.unwrap_or(measured)),
                    }
                }
                Ok(Err(e)) => {
                    warn!(probe = probe.name(), error = %e, "probe failed");
                    DependencyHealth {
                        latency_ms: Some(measured),
                        ..DependencyHealth::unreachable(e.to_string())
                    }
                }
                Err(_) => {
                    let e = ProbeError::Timeout(probe.timeout());
                    warn!(probe = probe.name(), error = %e, "probe timed out");
                    DependencyHealth {
                        latency_ms: Some(measured),
                        ..DependencyHealth::unreachable(e.to_string())
                    }
                }
            };
            dependencies.insert(probe.name().to_string(), health);
        }

        dependencies
    }
}

const ENTRY_SEPARATOR: char = '/';

fn elapsed_ms(start_time: Instant) -> u64 {
    start_time.elapsed().as_millis() as u64
}
