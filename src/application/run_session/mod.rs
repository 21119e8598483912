pub mod dto;
pub mod ports;
pub mod use_case;

pub use dto::{
    CycleRecord, EXIT_CLEAN, EXIT_FAILED, EXIT_WARNINGS, SessionReport, SessionSettings,
    SessionState, SessionSummary, StopReason,
};
pub use ports::{CycleObserver, ReportSink};
pub use use_case::MonitoringSession;
