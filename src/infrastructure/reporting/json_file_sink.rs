use crate::application::run_session::{ReportSink, SessionReport};
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes each finished session as a pretty-printed JSON file named
/// `monitoring-report-<environment>-<YYYYmmdd-HHMMSS>.json`.
pub struct JsonFileReportSink {
    directory: PathBuf,
}

impl JsonFileReportSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn file_path(&self, report: &SessionReport) -> PathBuf {
        let finished = report
            .summary
            .ended_at
            .unwrap_or_else(chrono::Utc::now)
            .format("%Y%m%d-%H%M%S");
        let environment: String = report
            .summary
            .environment
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.directory
            .join(format!("monitoring-report-{}-{}.json", environment, finished))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl ReportSink for JsonFileReportSink {
    async fn publish(&self, report: &SessionReport) -> anyhow::Result<String> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .with_context(|| format!("creating report directory {}", self.directory.display()))?;

        let path = self.file_path(report);
        let body = serde_json::to_vec_pretty(report).context("serializing session report")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("writing report {}", path.display()))?;

        info!(path = %path.display(), "session report written");
        Ok(path.display().to_string())
    }
}
