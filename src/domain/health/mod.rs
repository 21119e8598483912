pub mod entity;
pub mod errors;

pub use entity::{DependencyHealth, HealthSample, HealthStatus, overall_status};
pub use errors::ProbeError;
