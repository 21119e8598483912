pub mod monitoring;
pub mod reporting;
