use super::helpers::{
    DEGRADED_REPORT, HEALTHY_REPORT, UNHEALTHY_ENTRY_REPORT, closed_addr, spawn_app,
};
use axum::http::StatusCode;
use healthwatch::{
    application::aggregate_health::HealthAggregator,
    domain::health::{HealthStatus, ProbeError},
    domain::metrics::{FAILING_DEPENDENCIES, MetricSample},
    infrastructure::monitoring::{HttpHealthProbe, HttpMetricSource, MetricSource, Probe},
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn http_probe_reads_healthy_report() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let probe = HttpHealthProbe::new("application", app.url("/health")).unwrap();

    let outcome = probe.check().await.unwrap();
    assert_eq!(outcome.status, HealthStatus::Healthy);
    assert!(outcome.message.is_none());
    assert!(outcome.latency_ms.is_some());
}

#[tokio::test]
async fn http_probe_surfaces_degraded_entries() {
    let app = spawn_app(StatusCode::OK, DEGRADED_REPORT).await;
    let probe = HttpHealthProbe::new("application", app.url("/health")).unwrap();

    let outcome = probe.check().await.unwrap();
    assert_eq!(outcome.status, HealthStatus::Degraded);
    let servicebus = &outcome.entries["servicebus"];
    assert_eq!(servicebus.status, HealthStatus::Degraded);
    assert_eq!(servicebus.message.as_deref(), Some("slow sender"));
}

#[tokio::test]
async fn unhealthy_entry_in_health_report_fails_the_sample() {
    let app = spawn_app(StatusCode::OK, UNHEALTHY_ENTRY_REPORT).await;
    let probes: Vec<Arc<dyn Probe>> =
        vec![Arc::new(HttpHealthProbe::new("application", app.url("/health")).unwrap())];
    let aggregator = HealthAggregator::new(probes).unwrap();

    let sample = aggregator.aggregate().await;
    assert_eq!(sample.overall(), HealthStatus::Unhealthy);
    assert_eq!(
        sample.dependency("application").map(|d| d.status),
        Some(HealthStatus::Degraded)
    );
    assert_eq!(
        sample.dependency("application/keyvault").map(|d| d.status),
        Some(HealthStatus::Unhealthy)
    );
    assert_eq!(
        MetricSample::from_health(&sample).get(FAILING_DEPENDENCIES),
        Some(1.0)
    );
}

#[tokio::test]
async fn slow_endpoint_maps_to_timeout() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let limit = Duration::from_millis(200);

    let probe = HttpHealthProbe::with_timeout("application", app.url("/slow"), limit).unwrap();
    assert!(matches!(probe.check().await, Err(ProbeError::Timeout(t)) if t == limit));

    let source = HttpMetricSource::with_timeout(app.url("/slow"), limit).unwrap();
    assert!(matches!(source.collect().await, Err(ProbeError::Timeout(t)) if t == limit));
}

#[tokio::test]
async fn http_probe_treats_bare_503_as_unhealthy() {
    let app = spawn_app(StatusCode::SERVICE_UNAVAILABLE, "maintenance").await;
    let probe = HttpHealthProbe::new("application", app.url("/health")).unwrap();

    let outcome = probe.check().await.unwrap();
    assert_eq!(outcome.status, HealthStatus::Unhealthy);
    assert_eq!(outcome.message.as_deref(), Some("HTTP 503"));
}

#[tokio::test]
async fn http_probe_reports_other_error_statuses() {
    let app = spawn_app(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let probe = HttpHealthProbe::new("application", app.url("/health")).unwrap();

    let err = probe.check().await.unwrap_err();
    assert!(matches!(err, ProbeError::Status(500)));
}

#[tokio::test]
async fn aggregator_marks_unreachable_dependency_and_fails_overall() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let down = closed_addr().await;

    let probes: Vec<Arc<dyn Probe>> = vec![
        Arc::new(HttpHealthProbe::new("database", app.url("/health")).unwrap()),
        Arc::new(
            HttpHealthProbe::with_timeout(
                "queue",
                format!("http://{}/health", down),
                Duration::from_secs(2),
            )
            .unwrap(),
        ),
    ];
    let aggregator = HealthAggregator::new(probes).unwrap();

    let sample = aggregator.aggregate().await;
    assert_eq!(sample.overall(), HealthStatus::Unhealthy);
    assert_eq!(
        sample.dependency("database").map(|d| d.status),
        Some(HealthStatus::Healthy)
    );
    let queue = sample.dependency("queue").unwrap();
    assert_eq!(queue.status, HealthStatus::Unreachable);
    assert!(queue.message.is_some());
}

#[tokio::test]
async fn metric_source_reads_numeric_object() {
    let app = spawn_app(StatusCode::OK, HEALTHY_REPORT).await;
    let source = HttpMetricSource::new(app.url("/metrics")).unwrap();

    let values = source.collect().await.unwrap();
    assert_eq!(values.get("cpu_percent"), Some(&93.0));
    assert_eq!(values.len(), 3);
}
