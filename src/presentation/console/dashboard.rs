//! Plain-text rendering of cycles and the final session summary.

use crate::application::run_session::{CycleObserver, CycleRecord, SessionSummary, StopReason};
use crate::domain::alert::AlertSeverity;
use crate::domain::health::HealthStatus;
use std::fmt::Write;

/// Prints one block per cycle and a closing summary to stdout.
#[derive(Debug, Default)]
pub struct ConsoleDashboard;

impl CycleObserver for ConsoleDashboard {
    fn on_cycle(&self, record: &CycleRecord) {
        println!("{}", format_cycle(record));
    }

    fn on_summary(&self, summary: &SessionSummary) {
        println!("{}", format_summary(summary));
    }
}

fn status_marker(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "[ OK ]",
        HealthStatus::Degraded => "[WARN]",
        HealthStatus::Unhealthy => "[FAIL]",
        HealthStatus::Unreachable => "[DOWN]",
    }
}

pub fn format_cycle(record: &CycleRecord) -> String {
    let health = &record.health;
    let mut out = String::new();

    let latency = health
        .latency_ms()
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| "n/a".to_string());
    let _ = writeln!(
        out,
        "#{} {} {} overall={} latency={}",
        record.cycle,
        health.timestamp().format("%H:%M:%S"),
        status_marker(health.overall()),
        health.overall(),
        latency
    );

    if let Some(error) = health.error() {
        let _ = writeln!(out, "    error: {}", error);
    }
    for (name, dependency) in health.dependencies() {
        let _ = write!(out, "    {} {}", status_marker(dependency.status), name);
        if let Some(message) = &dependency.message {
            let _ = write!(out, " - {}", message);
        }
        out.push('\n');
    }
    for alert in &record.alerts {
        let _ = writeln!(out, "    ALERT {} [{}] {}", alert.severity, alert.category, alert.message);
    }

    out.trim_end().to_string()
}

pub fn format_summary(summary: &SessionSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Monitoring summary ({})", summary.environment);
    let _ = writeln!(
        out,
        "  duration: {:.0}s of {}s",
        summary.elapsed_seconds, summary.configured_duration_seconds
    );
    let _ = writeln!(out, "  samples: {}", summary.sample_count);
    let _ = writeln!(out, "  healthy: {:.1}%", summary.health_percentage);
    if let Some(avg) = summary.average_latency_ms {
        let _ = writeln!(out, "  average latency: {:.0} ms", avg);
    }
    let _ = writeln!(
        out,
        "  alerts: {} ({} critical, {} warning)",
        summary.alert_count,
        summary.alerts_with(AlertSeverity::Critical),
        summary.alerts_with(AlertSeverity::Warning)
    );
    let reason = match &summary.stop_reason {
        Some(StopReason::DurationElapsed) => "duration elapsed".to_string(),
        Some(StopReason::Cancelled) => "cancelled".to_string(),
        Some(StopReason::Failed(message)) => format!("failed: {}", message),
        None => "not run".to_string(),
    };
    let _ = write!(out, "  stopped: {}", reason);
    out
}
