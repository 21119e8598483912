use super::{DEFAULT_PROBE_TIMEOUT, Probe, ProbeOutcome};
use crate::domain::health::{HealthStatus, ProbeError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Queries a cloud resource's state through a CLI command.
///
/// The command must exit zero and print a JSON object with either a `state`
/// field (e.g. `az webapp show`) or `properties.provisioningState`
/// (e.g. `az group show`, `az keyvault show`).
pub struct CommandProbe {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ResourceState {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    properties: Option<ResourceProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceProperties {
    #[serde(default)]
    provisioning_state: Option<String>,
}

impl CommandProbe {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parses `"program arg arg"`. Arguments split on whitespace unless
    /// wrapped in single or double quotes, e.g. `--query "[0].state"`.
    /// There are no escapes and no shell expansion.
    ///
    /// Returns `None` for an empty line or an unterminated quote.
    pub fn from_command_line(name: impl Into<String>, command_line: &str) -> Option<Self> {
        let mut parts = split_command_line(command_line)?.into_iter();
        let program = parts.next()?;
        Some(Self::new(name, program, parts.collect()))
    }
}

#[async_trait]
impl Probe for CommandProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let start_time = Instant::now();
        let output = Command::new(&self.program)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProbeError::Command(format!("{}: {}", self.program, e)))?;
        let latency_ms = start_time.elapsed().as_millis() as u64;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Command(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let state = resource_state(&output.stdout)?;
        debug!(probe = %self.name, state = %state, latency_ms, "resource state queried");

        let status = classify_state(&state);
        let message = if status == HealthStatus::Healthy {
            None
        } else {
            Some(format!("resource state is {}", state))
        };
        Ok(ProbeOutcome::with_status(status, message).latency(latency_ms))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn resource_state(stdout: &[u8]) -> Result<String, ProbeError> {
    let parsed: ResourceState = serde_json::from_slice(stdout)?;
    parsed
        .state
        .or_else(|| parsed.properties.and_then(|p| p.provisioning_state))
        .ok_or_else(|| {
            ProbeError::InvalidResponse("neither state nor provisioningState present".to_string())
        })
}

fn split_command_line(line: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    parts.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return None;
    }
    if in_word {
        parts.push(current);
    }
    Some(parts)
}

/// Maps a cloud resource state onto a health status.
pub fn classify_state(state: &str) -> HealthStatus {
    match state.to_ascii_lowercase().as_str() {
        "running" | "succeeded" | "enabled" | "active" | "ready" => HealthStatus::Healthy,
        "stopped" | "failed" | "disabled" | "deleting" | "canceled" => HealthStatus::Unhealthy,
        _ => HealthStatus::Degraded,
    }
}
