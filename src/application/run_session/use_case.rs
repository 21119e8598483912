use super::dto::{
    CycleRecord, SessionReport, SessionSettings, SessionState, SessionSummary, StopReason,
};
use super::ports::{CycleObserver, ReportSink};
use crate::application::aggregate_health::HealthAggregator;
use crate::application::evaluate_thresholds::ThresholdEvaluator;
use crate::domain::alert::AlertLog;
use crate::domain::health::{HealthSample, HealthStatus};
use crate::domain::metrics::{HEALTH_METRICS, MetricSample};
use crate::domain::shared::errors::MonitorError;
use crate::domain::shared::history::BoundedHistory;
use crate::infrastructure::monitoring::MetricSource;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

/// Drives the poll → evaluate → record → render loop for one session.
///
/// The session owns its histories and alert log outright; nothing else writes
/// to them while it runs. State moves `Idle → Running → Stopped` exactly once.
pub struct MonitoringSession {
    environment: String,
    settings: SessionSettings,
    aggregator: HealthAggregator,
    evaluator: ThresholdEvaluator,
    metric_source: Option<Arc<dyn MetricSource>>,
    observer: Option<Arc<dyn CycleObserver>>,
    state: SessionState,
    health_history: BoundedHistory<HealthSample>,
    metric_history: BoundedHistory<MetricSample>,
    alert_log: AlertLog,
    stats: SessionStats,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    elapsed: Duration,
    stop_reason: Option<StopReason>,
}

/// Running totals kept for the summary; the bounded histories forget.
#[derive(Debug, Default)]
struct SessionStats {
    cycles: u64,
    by_status: BTreeMap<HealthStatus, u64>,
    latency_total_ms: u64,
    latency_samples: u64,
}

impl SessionStats {
    fn record(&mut self, sample: &HealthSample) {
        self.cycles += 1;
        *self.by_status.entry(sample.overall()).or_insert(0) += 1;
        if let Some(latency) = sample.latency_ms() {
            self.latency_total_ms += latency;
            self.latency_samples += 1;
        }
    }

    fn health_percentage(&self) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        let healthy = self.by_status.get(&HealthStatus::Healthy).copied().unwrap_or(0);
        healthy as f64 / self.cycles as f64 * 100.0
    }

    fn average_latency_ms(&self) -> Option<f64> {
        if self.latency_samples == 0 {
            None
        } else {
            Some(self.latency_total_ms as f64 / self.latency_samples as f64)
        }
    }
}

impl MonitoringSession {
    /// # Errors
    ///
    /// Returns a configuration error when the settings are out of range or a
    /// rule needs an external metric but no metric source is configured.
    pub fn new(
        environment: impl Into<String>,
        settings: SessionSettings,
        aggregator: HealthAggregator,
        evaluator: ThresholdEvaluator,
        metric_source: Option<Arc<dyn MetricSource>>,
    ) -> Result<Self, MonitorError> {
        validator::Validate::validate(&settings)
            .map_err(|e| MonitorError::Configuration(format!("session settings: {}", e)))?;

        if metric_source.is_none() {
            if let Some(rule) = evaluator
                .rules()
                .iter()
                .find(|r| !HEALTH_METRICS.contains(&r.metric.as_str()))
            {
                return Err(MonitorError::Configuration(format!(
                    "rule on '{}' needs a metric source",
                    rule.metric
                )));
            }
        }

        Ok(Self {
            environment: environment.into(),
            health_history: BoundedHistory::new(settings.history_capacity),
            metric_history: BoundedHistory::new(settings.history_capacity),
            settings,
            aggregator,
            evaluator,
            metric_source,
            observer: None,
            state: SessionState::Idle,
            alert_log: AlertLog::new(),
            stats: SessionStats::default(),
            started_at: None,
            ended_at: None,
            elapsed: Duration::ZERO,
            stop_reason: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn CycleObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn health_history(&self) -> &BoundedHistory<HealthSample> {
        &self.health_history
    }

    pub fn metric_history(&self) -> &BoundedHistory<MetricSample> {
        &self.metric_history
    }

    pub fn alert_log(&self) -> &AlertLog {
        &self.alert_log
    }

    /// Runs cycles until the duration elapses, `stop` turns true, or a fatal
    /// error occurs, then returns the summary.
    ///
    /// The stop flag is checked once per iteration; a probe already in
    /// flight runs to its own timeout.
    ///
    /// # Errors
    ///
    /// Only `InvalidState` when the session has already been run. Failures
    /// during the run end the session and are reported in the summary.
    pub async fn run(
        &mut self,
        mut stop: watch::Receiver<bool>,
    ) -> Result<SessionSummary, MonitorError> {
        if self.state != SessionState::Idle {
            return Err(MonitorError::InvalidState(format!(
                "session already {:?}",
                self.state
            )));
        }

        self.state = SessionState::Running;
        self.started_at = Some(Utc::now());
        let started = Instant::now();
        info!(
            environment = %self.environment,
            duration_seconds = self.settings.duration_seconds,
            interval_seconds = self.settings.interval_seconds,
            probes = ?self.aggregator.probe_names(),
            "monitoring session started"
        );

        let reason = self.drive(started, &mut stop).await;

        self.elapsed = started.elapsed();
        self.ended_at = Some(Utc::now());
        self.state = SessionState::Stopped;
        match &reason {
            StopReason::Failed(message) => error!(%message, "monitoring session failed"),
            other => info!(reason = ?other, cycles = self.stats.cycles, "monitoring session stopped"),
        }
        self.stop_reason = Some(reason);

        let summary = self.summary();
        if let Some(observer) = &self.observer {
            observer.on_summary(&summary);
        }
        Ok(summary)
    }

    async fn drive(&mut self, started: Instant, stop: &mut watch::Receiver<bool>) -> StopReason {
        let Some(deadline) = started.checked_add(Duration::from_secs(self.settings.duration_seconds))
        else {
            return StopReason::Failed("session deadline out of range".to_string());
        };
        let interval = Duration::from_secs(self.settings.interval_seconds);

        loop {
            if *stop.borrow() {
                return StopReason::Cancelled;
            }
            if Instant::now() >= deadline {
                return StopReason::DurationElapsed;
            }

            if let Err(e) = self.run_cycle().await {
                return StopReason::Failed(e.to_string());
            }

            let now = Instant::now();
            if now >= deadline {
                return StopReason::DurationElapsed;
            }
            let wake = now + interval.min(deadline - now);
            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {}
                _ = stop_requested(stop) => {}
            }
        }
    }

    #[instrument(skip(self), fields(environment = %self.environment, cycle = self.stats.cycles + 1))]
    async fn run_cycle(&mut self) -> Result<(), MonitorError> {
        let health = self.aggregator.aggregate().await;

        // Evaluate before recording anything so a failed cycle leaves the
        // stats, both histories and the alert log untouched.
        let derived = MetricSample::from_health(&health);
        let (metrics, alerts) = match &self.metric_source {
            Some(source) => match source.collect().await {
                Ok(values) => {
                    let metrics = derived.merged(values);
                    let alerts = self.evaluator.evaluate(&metrics)?;
                    (metrics, alerts)
                }
                Err(e) => {
                    warn!(error = %e, "metric source unavailable, evaluating health rules only");
                    let alerts = self
                        .evaluator
                        .evaluate_matching(&derived, |r| HEALTH_METRICS.contains(&r.metric.as_str()))?;
                    (derived, alerts)
                }
            },
            None => {
                let alerts = self.evaluator.evaluate(&derived)?;
                (derived, alerts)
            }
        };

        self.stats.record(&health);
        self.health_history.push(health.clone());
        self.metric_history.push(metrics.clone());
        self.alert_log.extend(alerts.iter().cloned());

        info!(
            overall = %health.overall(),
            latency_ms = ?health.latency_ms(),
            alerts = alerts.len(),
            "cycle complete"
        );

        if let Some(observer) = &self.observer {
            let record = CycleRecord {
                cycle: self.stats.cycles,
                health,
                metrics,
                alerts,
            };
            observer.on_cycle(&record);
        }
        Ok(())
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            environment: self.environment.clone(),
            state: self.state,
            started_at: self.started_at,
            ended_at: self.ended_at,
            configured_duration_seconds: self.settings.duration_seconds,
            elapsed_seconds: self.elapsed.as_secs_f64(),
            sample_count: self.stats.cycles,
            samples_by_status: self.stats.by_status.clone(),
            health_percentage: self.stats.health_percentage(),
            average_latency_ms: self.stats.average_latency_ms(),
            alert_count: self.alert_log.len() as u64,
            alerts_by_severity: self.alert_log.by_severity(),
            alerts_by_category: self.alert_log.by_category(),
            stop_reason: self.stop_reason.clone(),
        }
    }

    pub fn report(&self) -> SessionReport {
        let summary = self.summary();
        SessionReport {
            exit_code: summary.exit_code(),
            summary,
            health_history: self.health_history.snapshot(),
            metric_history: self.metric_history.snapshot(),
            alerts: self.alert_log.alerts().to_vec(),
        }
    }

    /// Hands the finished session to `sink`.
    ///
    /// # Errors
    ///
    /// `InvalidState` before the session has stopped, or a configuration
    /// error wrapping the sink's failure.
    pub async fn publish(&self, sink: &dyn ReportSink) -> Result<String, MonitorError> {
        if self.state != SessionState::Stopped {
            return Err(MonitorError::InvalidState(
                "report requested before session stopped".to_string(),
            ));
        }
        sink.publish(&self.report())
            .await
            .map_err(|e| MonitorError::Driver(format!("report sink failed: {:#}", e)))
    }
}

/// Resolves once the stop flag reads `true`. Never resolves if the sender
/// is dropped first, since no stop can arrive after that.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    if stop.wait_for(|stopped| *stopped).await.is_err() {
        std::future::pending::<()>().await;
    }
}
