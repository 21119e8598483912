use super::{DEFAULT_PROBE_TIMEOUT, Probe, ProbeOutcome};
use crate::domain::health::{DependencyHealth, HealthStatus, ProbeError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probes an HTTP `/health`-style endpoint.
///
/// Accepts either a JSON report (`{"status": "...", "results": {...}}`, the
/// shape ASP.NET health checks emit) or a bare status string as the body.
pub struct HttpHealthProbe {
    name: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct HealthReport {
    status: ReportedStatus,
    #[serde(default, alias = "entries")]
    results: BTreeMap<String, HealthEntry>,
}

#[derive(Debug, Deserialize)]
struct HealthEntry {
    status: ReportedStatus,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
enum ReportedStatus {
    #[serde(alias = "healthy")]
    Healthy,
    #[serde(alias = "degraded")]
    Degraded,
    #[serde(alias = "unhealthy")]
    Unhealthy,
}

impl From<ReportedStatus> for HealthStatus {
    fn from(status: ReportedStatus) -> Self {
        match status {
            ReportedStatus::Healthy => HealthStatus::Healthy,
            ReportedStatus::Degraded => HealthStatus::Degraded,
            ReportedStatus::Unhealthy => HealthStatus::Unhealthy,
        }
    }
}

impl HttpHealthProbe {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self, ProbeError> {
        Self::with_timeout(name, url, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(
        name: impl Into<String>,
        url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            name: name.into(),
            url: url.into(),
            client,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Probe for HttpHealthProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let start_time = Instant::now();
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProbeError::from_request(e, self.timeout))?;
        let status_code = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::from_request(e, self.timeout))?;
        let latency_ms = start_time.elapsed().as_millis() as u64;

        debug!(probe = %self.name, status = status_code.as_u16(), latency_ms, "health endpoint responded");

        let outcome = match parse_body(&body) {
            Ok(outcome) => outcome,
            Err(_) if status_code == StatusCode::SERVICE_UNAVAILABLE => ProbeOutcome::with_status(
                HealthStatus::Unhealthy,
                Some(format!("HTTP {}", status_code.as_u16())),
            ),
            Err(_) if !status_code.is_success() => {
                return Err(ProbeError::Status(status_code.as_u16()));
            }
            Err(err) => return Err(err),
        };

        Ok(outcome.latency(latency_ms))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_body(body: &[u8]) -> Result<ProbeOutcome, ProbeError> {
    match serde_json::from_slice::<HealthReport>(body) {
        Ok(report) => Ok(outcome_from_report(report)),
        Err(json_err) => {
            let text = String::from_utf8_lossy(body);
            serde_json::from_value::<ReportedStatus>(serde_json::Value::String(
                text.trim().to_string(),
            ))
            .map(|status| ProbeOutcome::with_status(status.into(), None))
            .map_err(|_| ProbeError::InvalidResponse(json_err.to_string()))
        }
    }
}

fn outcome_from_report(report: HealthReport) -> ProbeOutcome {
    let entries = report
        .results
        .into_iter()
        .map(|(name, entry)| {
            let health = DependencyHealth {
                status: entry.status.into(),
                message: entry.description,
                latency_ms: None,
            };
            (name, health)
        })
        .collect();

    ProbeOutcome::with_status(report.status.into(), None).with_entries(entries)
}
