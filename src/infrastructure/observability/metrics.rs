//! Cache source metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding application installs a recorder.

use metrics::counter;

/// Backend operations whose failure the cache source absorbs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradedOperation {
    /// Reading a cached result failed or returned garbage
    Get,
    /// Writing a fetched result failed
    Set,
    /// Reading or writing the invalidation map failed on the read path
    Map,
    /// Deleting an entry during invalidation failed
    Delete,
}

impl DegradedOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegradedOperation::Get => "get",
            DegradedOperation::Set => "set",
            DegradedOperation::Map => "map",
            DegradedOperation::Delete => "delete",
        }
    }
}

pub fn record_cache_hit(source: &str, entity: &str) {
    let labels = [("source", source.to_string()), ("entity", entity.to_string())];
    counter!("cacher_cache_hits_total", &labels).increment(1);
}

pub fn record_cache_miss(source: &str, entity: &str) {
    let labels = [("source", source.to_string()), ("entity", entity.to_string())];
    counter!("cacher_cache_misses_total", &labels).increment(1);
}

pub fn record_source_read(source: &str, success: bool) {
    let labels = [
        ("source", source.to_string()),
        ("status", if success { "success" } else { "error" }.to_string()),
    ];
    counter!("cacher_source_reads_total", &labels).increment(1);
}

pub fn record_cache_degraded(operation: DegradedOperation) {
    counter!("cacher_cache_degraded_total", "operation" => operation.as_str()).increment(1);
}

pub fn record_invalidated_keys(source: &str, entity: &str, count: usize) {
    let labels = [("source", source.to_string()), ("entity", entity.to_string())];
    counter!("cacher_invalidated_keys_total", &labels).increment(count as u64);
}
