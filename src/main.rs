use healthwatch::{
    application::{
        aggregate_health::HealthAggregator, evaluate_thresholds::ThresholdEvaluator,
        run_session::{EXIT_FAILED, MonitoringSession},
    },
    config::Config,
    infrastructure::{
        monitoring::{
            MetricSource, Probe, command_probe::CommandProbe,
            http_health_probe::HttpHealthProbe, http_metric_source::HttpMetricSource,
        },
        reporting::JsonFileReportSink,
    },
    presentation::console::ConsoleDashboard,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Uses RUST_LOG if set, otherwise sensible defaults
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,healthwatch=debug"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "monitoring failed");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

async fn run() -> anyhow::Result<u8> {
    let config = Config::from_env()?;
    let probe_timeout = Duration::from_secs(config.probe_timeout_seconds);

    let mut probes: Vec<Arc<dyn Probe>> = vec![Arc::new(HttpHealthProbe::with_timeout(
        "application",
        config.health_url(),
        probe_timeout,
    )?)];
    for (name, url) in &config.extra_endpoints {
        probes.push(Arc::new(HttpHealthProbe::with_timeout(
            name.as_str(),
            url.as_str(),
            probe_timeout,
        )?));
    }
    for (name, command_line) in &config.command_probes {
        let probe = CommandProbe::from_command_line(name.as_str(), command_line)
            .ok_or_else(|| anyhow::anyhow!("invalid command for probe '{}'", name))?
            .with_timeout(probe_timeout);
        probes.push(Arc::new(probe));
    }

    let metric_source = match &config.metrics_url {
        Some(url) => Some(
            Arc::new(HttpMetricSource::with_timeout(url.as_str(), probe_timeout)?)
                as Arc<dyn MetricSource>,
        ),
        None => None,
    };

    let mut aggregator = HealthAggregator::new(probes)?;
    if let Some(seconds) = config.cycle_timeout_seconds {
        aggregator = aggregator.with_cycle_timeout(Duration::from_secs(seconds));
    }
    let evaluator = ThresholdEvaluator::new(config.threshold_rules()?)?;

    let mut session = MonitoringSession::new(
        config.environment.clone(),
        config.session_settings(),
        aggregator,
        evaluator,
        metric_source,
    )?
    .with_observer(Arc::new(ConsoleDashboard));

    tracing::info!(
        environment = %config.environment,
        target = %config.health_url(),
        duration_seconds = config.duration_seconds,
        interval_seconds = config.interval_seconds,
        "MONITORING STARTED"
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = stop_tx.send(true);
    });

    let summary = session.run(stop_rx).await?;

    let sink = JsonFileReportSink::new(config.report_dir.clone());
    match session.publish(&sink).await {
        Ok(location) => tracing::info!(%location, "report published"),
        Err(e) => tracing::warn!(error = %e, "failed to publish session report"),
    }

    Ok(summary.exit_code())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, stopping after the current cycle");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, stopping after the current cycle");
        }
    }
}
