use super::helpers::{HEALTHY_REPORT, spawn_app};
use axum::http::StatusCode;
use healthwatch::{
    application::{
        aggregate_health::HealthAggregator,
        evaluate_thresholds::ThresholdEvaluator,
        run_session::{MonitoringSession, SessionSettings},
    },
    domain::{alert::default_rules, shared::errors::MonitorError},
    infrastructure::{
        monitoring::{HttpHealthProbe, Probe},
        reporting::JsonFileReportSink,
    },
};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::watch;

fn session(url: String) -> MonitoringSession {
    let probes: Vec<Arc<dyn Probe>> =
        vec![Arc::new(HttpHealthProbe::new("application", url).unwrap())];
    MonitoringSession::new(
        "staging",
        SessionSettings {
            duration_seconds: 1,
            interval_seconds: 1,
            history_capacity: 5,
        },
        HealthAggregator::new(probes).unwrap(),
        ThresholdEvaluator::new(default_rules(false)).unwrap(),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn report_is_written_as_json_after_session() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonFileReportSink::new(dir.path().join("reports"));

    let mut session = session(app.url("/health"));
    let (_stop_tx, stop_rx) = watch::channel(false);
    session.run(stop_rx).await.unwrap();

    let location = session.publish(&sink).await.unwrap();
    assert!(location.contains("monitoring-report-staging-"));

    let written: Value = serde_json::from_slice(&std::fs::read(&location).unwrap()).unwrap();
    assert_eq!(written["exit_code"], 0);
    assert_eq!(written["summary"]["sample_count"], 1);
    assert_eq!(written["health_history"].as_array().map(Vec::len), Some(1));
    assert_eq!(written["alerts"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn report_before_run_is_rejected() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let dir = tempfile::tempdir().unwrap();
    let sink = JsonFileReportSink::new(dir.path());

    let session = session(app.url("/health"));
    let err = session.publish(&sink).await.unwrap_err();
    assert!(matches!(err, MonitorError::InvalidState(_)));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}
