use super::dto::{CycleRecord, SessionReport, SessionSummary};
use async_trait::async_trait;

/// Receives each cycle as it completes, for live rendering.
pub trait CycleObserver: Send + Sync {
    fn on_cycle(&self, record: &CycleRecord);

    fn on_summary(&self, _summary: &SessionSummary) {}
}

/// Persists a finished session.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Returns a human-readable location of the stored report
    async fn publish(&self, report: &SessionReport) -> anyhow::Result<String>;
}
