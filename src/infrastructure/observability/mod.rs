//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{
    record_cache_degraded, record_cache_hit, record_cache_miss, record_invalidated_keys,
    record_source_read, DegradedOperation,
};
