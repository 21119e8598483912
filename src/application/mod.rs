pub mod aggregate_health;
pub mod evaluate_thresholds;
pub mod run_session;
