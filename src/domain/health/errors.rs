use std::time::Duration;
use thiserror::Error;

/// Recoverable failure of a single probe or metric source.
///
/// The aggregator turns every variant into an `Unreachable` dependency; none
/// of them ends a monitoring session.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("command failed: {0}")]
    Command(String),
}

impl ProbeError {
    /// Maps a failed request made with a client-side `timeout`.
    pub fn from_request(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProbeError::Timeout(timeout)
        } else {
            err.into()
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProbeError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ProbeError::Status(status.as_u16())
        } else {
            ProbeError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::InvalidResponse(err.to_string())
    }
}
