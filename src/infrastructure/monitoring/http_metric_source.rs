use super::{DEFAULT_PROBE_TIMEOUT, MetricSource};
use crate::domain::health::ProbeError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Reads a flat JSON object of `metric name → number` from an HTTP endpoint,
/// e.g. `{"cpu_percent": 41.5, "memory_percent": 63.0, "error_rate_percent": 0.2}`.
pub struct HttpMetricSource {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpMetricSource {
    pub fn new(url: impl Into<String>) -> Result<Self, ProbeError> {
        Self::with_timeout(url, DEFAULT_PROBE_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
            timeout,
        })
    }
}

#[async_trait]
impl MetricSource for HttpMetricSource {
    async fn collect(&self) -> Result<BTreeMap<String, f64>, ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProbeError::from_request(e, self.timeout))?;
        if !response.status().is_success() {
            return Err(ProbeError::Status(response.status().as_u16()));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| ProbeError::from_request(e, self.timeout))?;
        parse_metrics(&body)
    }
}

fn parse_metrics(body: &[u8]) -> Result<BTreeMap<String, f64>, ProbeError> {
    Ok(serde_json::from_slice(body)?)
}
