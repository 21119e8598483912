pub mod entity;

pub use entity::{
    AGGREGATION_TIME_MS, DEGRADED_DEPENDENCIES, FAILING_DEPENDENCIES, HEALTH_METRICS, HEALTHY_RATIO_PERCENT,
    MetricSample, RESPONSE_TIME_MS,
};
