use super::helpers::{DEGRADED_REPORT, HEALTHY_REPORT, spawn_app};
use axum::http::StatusCode;
use healthwatch::{
    application::{
        aggregate_health::HealthAggregator,
        evaluate_thresholds::ThresholdEvaluator,
        run_session::{MonitoringSession, SessionSettings, SessionState, StopReason},
    },
    domain::alert::{AlertSeverity, default_rules},
    domain::health::HealthStatus,
    infrastructure::monitoring::{HttpHealthProbe, HttpMetricSource, MetricSource, Probe},
};
use std::sync::Arc;
use tokio::sync::watch;

fn settings(duration_seconds: u64) -> SessionSettings {
    SessionSettings {
        duration_seconds,
        interval_seconds: 1,
        history_capacity: 5,
    }
}

fn aggregator(url: String) -> HealthAggregator {
    let probes: Vec<Arc<dyn Probe>> =
        vec![Arc::new(HttpHealthProbe::new("application", url).unwrap())];
    HealthAggregator::new(probes).unwrap()
}

#[tokio::test]
async fn zero_duration_session_runs_no_cycles() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let mut session = MonitoringSession::new(
        "test",
        settings(0),
        aggregator(app.url("/health")),
        ThresholdEvaluator::new(default_rules(false)).unwrap(),
        None,
    )
    .unwrap();

    let (_stop_tx, stop_rx) = watch::channel(false);
    let summary = session.run(stop_rx).await.unwrap();

    assert_eq!(summary.sample_count, 0);
    assert_eq!(summary.state, SessionState::Stopped);
    assert_eq!(summary.stop_reason, Some(StopReason::DurationElapsed));
    assert_eq!(summary.exit_code(), 0);
    assert!(session.health_history().is_empty());
}

#[tokio::test]
async fn healthy_session_exits_clean() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let mut session = MonitoringSession::new(
        "test",
        settings(1),
        aggregator(app.url("/health")),
        ThresholdEvaluator::new(default_rules(false)).unwrap(),
        None,
    )
    .unwrap();

    let (_stop_tx, stop_rx) = watch::channel(false);
    let summary = session.run(stop_rx).await.unwrap();

    assert_eq!(summary.sample_count, 1);
    assert_eq!(summary.health_percentage, 100.0);
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(
        session.health_history().latest().map(|s| s.overall()),
        Some(HealthStatus::Healthy)
    );
}

#[tokio::test]
async fn degraded_application_raises_warning() {
    let app = spawn_app(StatusCode::OK, DEGRADED_REPORT).await;
    let mut session = MonitoringSession::new(
        "test",
        settings(1),
        aggregator(app.url("/health")),
        ThresholdEvaluator::new(default_rules(false)).unwrap(),
        None,
    )
    .unwrap();

    let (_stop_tx, stop_rx) = watch::channel(false);
    let summary = session.run(stop_rx).await.unwrap();

    assert_eq!(summary.alerts_with(AlertSeverity::Warning), 1);
    assert_eq!(summary.alerts_with(AlertSeverity::Critical), 0);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn external_cpu_breach_is_critical() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let source: Arc<dyn MetricSource> = Arc::new(HttpMetricSource::new(app.url("/metrics")).unwrap());
    let mut session = MonitoringSession::new(
        "test",
        settings(1),
        aggregator(app.url("/health")),
        ThresholdEvaluator::new(default_rules(true)).unwrap(),
        Some(source),
    )
    .unwrap();

    let (_stop_tx, stop_rx) = watch::channel(false);
    let summary = session.run(stop_rx).await.unwrap();

    // cpu_percent 93 breaches both the 80 warning and the 90 critical rule
    assert_eq!(summary.alerts_with(AlertSeverity::Critical), 1);
    assert_eq!(summary.alerts_with(AlertSeverity::Warning), 1);
    assert_eq!(summary.exit_code(), 2);
    assert!(
        session
            .alert_log()
            .alerts()
            .iter()
            .any(|a| a.message.contains("93"))
    );
}

#[tokio::test]
async fn stop_signal_cancels_before_first_cycle() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let mut session = MonitoringSession::new(
        "test",
        settings(60),
        aggregator(app.url("/health")),
        ThresholdEvaluator::new(default_rules(false)).unwrap(),
        None,
    )
    .unwrap();

    let (stop_tx, stop_rx) = watch::channel(false);
    stop_tx.send(true).unwrap();
    let summary = session.run(stop_rx).await.unwrap();

    assert_eq!(summary.sample_count, 0);
    assert_eq!(summary.stop_reason, Some(StopReason::Cancelled));
}
