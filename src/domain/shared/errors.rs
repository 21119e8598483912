use thiserror::Error;

/// Non-recoverable monitoring errors.
///
/// Probe failures are never reported through this type; they are folded into
/// the health sample as `Unreachable` dependencies.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Rule evaluation failed for '{metric}': {reason}")]
    RuleEvaluation { metric: String, reason: String },
    #[error("Driver error: {0}")]
    Driver(String),
    #[error("Invalid session state: {0}")]
    InvalidState(String),
}
