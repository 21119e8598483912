//! Monitor configuration loading from environment variables.
//!
//! All configuration is read from the environment at startup (a `.env` file is
//! honoured through `dotenvy` in `main`).
//!
//! # Environment Variables
//!
//! ## Required Variables
//! - `MONITOR_BASE_URL`: Base URL of the monitored application
//!
//! ## Optional Variables
//! - `RUST_LOG`: Logging level (default: "info,healthwatch=debug")
//! - `MONITOR_ENVIRONMENT`: Environment label used in logs and reports (default: "dev")
//! - `MONITOR_HEALTH_PATH`: Health endpoint path appended to the base URL (default: "/health")
//! - `MONITOR_EXTRA_ENDPOINTS`: Extra HTTP probes as `name=url,name=url`
//! - `MONITOR_COMMAND_PROBES`: Cloud status probes as `name=program arg arg;name=...`
//!   (quote an argument with `"` or `'` to keep spaces in it)
//! - `MONITOR_METRICS_URL`: Endpoint returning a JSON object of numeric metrics
//! - `MONITOR_DURATION_SECONDS`: Session length (default: 300)
//! - `MONITOR_INTERVAL_SECONDS`: Pause between cycles (default: 30)
//! - `MONITOR_HISTORY_CAPACITY`: Samples kept for trend display (default: 20)
//! - `MONITOR_PROBE_TIMEOUT_SECONDS`: Per-probe timeout (default: 10)
//! - `MONITOR_CYCLE_TIMEOUT_SECONDS`: Optional bound on one whole aggregation
//! - `MONITOR_RULES_PATH`: JSON file of threshold rules (default: built-in rules)
//! - `MONITOR_REPORT_DIR`: Directory for session reports (default: "./reports")

use crate::application::run_session::SessionSettings;
use crate::domain::alert::{ThresholdRule, default_rules};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Complete monitor configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment label (dev, staging, prod)
    pub environment: String,

    /// Base URL of the monitored application (e.g., `https://app-dev.azurewebsites.net`)
    pub base_url: String,

    /// Path of the application's health endpoint
    pub health_path: String,

    /// Additional named HTTP health endpoints
    pub extra_endpoints: Vec<(String, String)>,

    /// Named CLI commands reporting cloud resource state
    pub command_probes: Vec<(String, String)>,

    /// Endpoint returning externally sampled metrics
    pub metrics_url: Option<String>,

    pub duration_seconds: u64,
    pub interval_seconds: u64,
    pub history_capacity: usize,
    pub probe_timeout_seconds: u64,
    pub cycle_timeout_seconds: Option<u64>,

    /// Threshold rules file; built-in defaults when unset
    pub rules_path: Option<PathBuf>,

    /// Where finished session reports are written
    pub report_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = env_required(&lookup, "MONITOR_BASE_URL")?;
        Ok(Self {
            environment: env_or(&lookup, "MONITOR_ENVIRONMENT", "dev".to_string())?,
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path: env_or(&lookup, "MONITOR_HEALTH_PATH", "/health".to_string())?,
            extra_endpoints: parse_pairs(
                lookup("MONITOR_EXTRA_ENDPOINTS").as_deref(),
                ',',
                "MONITOR_EXTRA_ENDPOINTS",
            )?,
            command_probes: parse_pairs(
                lookup("MONITOR_COMMAND_PROBES").as_deref(),
                ';',
                "MONITOR_COMMAND_PROBES",
            )?,
            metrics_url: lookup("MONITOR_METRICS_URL").filter(|v| !v.trim().is_empty()),
            duration_seconds: env_or(&lookup, "MONITOR_DURATION_SECONDS", 300)?,
            interval_seconds: env_or(&lookup, "MONITOR_INTERVAL_SECONDS", 30)?,
            history_capacity: env_or(&lookup, "MONITOR_HISTORY_CAPACITY", 20)?,
            probe_timeout_seconds: env_or(&lookup, "MONITOR_PROBE_TIMEOUT_SECONDS", 10)?,
            cycle_timeout_seconds: lookup("MONITOR_CYCLE_TIMEOUT_SECONDS")
                .map(|v| {
                    v.parse::<u64>()
                        .map_err(|e| anyhow::anyhow!("Failed to parse MONITOR_CYCLE_TIMEOUT_SECONDS: {}", e))
                })
                .transpose()?,
            rules_path: lookup("MONITOR_RULES_PATH").map(PathBuf::from),
            report_dir: env_or(&lookup, "MONITOR_REPORT_DIR", "./reports".to_string())?.into(),
        })
    }

    pub fn health_url(&self) -> String {
        let path = self.health_path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            duration_seconds: self.duration_seconds,
            interval_seconds: self.interval_seconds,
            history_capacity: self.history_capacity,
        }
    }

    /// Rules from `rules_path`, or the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the rules file cannot be read, parsed, or contains
    /// an invalid rule.
    pub fn threshold_rules(&self) -> anyhow::Result<Vec<ThresholdRule>> {
        match &self.rules_path {
            Some(path) => load_rules(path),
            None => Ok(default_rules(self.metrics_url.is_some())),
        }
    }
}

/// Reads a JSON array of threshold rules.
///
/// # Errors
///
/// Returns an error if the file is unreadable, is not a rule array, or any
/// rule fails validation.
pub fn load_rules(path: &Path) -> anyhow::Result<Vec<ThresholdRule>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading rules file {}", path.display()))?;
    let rules: Vec<ThresholdRule> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing rules file {}", path.display()))?;
    for rule in &rules {
        rule.check()?;
    }
    Ok(rules)
}

/// Load a required environment variable.
///
/// # Errors
///
/// Returns an error if the variable is not set.
fn env_required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| anyhow::anyhow!("Missing required environment variable: {}", key))
}

/// Load an environment variable with a default value.
///
/// # Errors
///
/// Returns an error if the variable is set but cannot be parsed.
fn env_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e)),
        None => Ok(default),
    }
}

/// Parses `name=value` entries separated by `separator`.
fn parse_pairs(
    raw: Option<&str>,
    separator: char,
    key: &str,
) -> anyhow::Result<Vec<(String, String)>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(separator)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("Invalid entry '{}' in {}: expected name=value", entry, key))?;
            let (name, value) = (name.trim(), value.trim());
            if name.is_empty() || value.is_empty() {
                anyhow::bail!("Invalid entry '{}' in {}: empty name or value", entry, key);
            }
            Ok((name.to_string(), value.to_string()))
        })
        .collect()
}
