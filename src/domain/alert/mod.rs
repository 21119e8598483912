pub mod entity;
pub mod log;
pub mod rule;

pub use entity::{Alert, AlertCategory, AlertSeverity};
pub use log::AlertLog;
pub use rule::{Comparison, ThresholdRule, default_rules};
