//! Observability hooks for store operations.
//!
//! [`CacheMetrics`] is the tracer handle an [`EntityStore`](crate::EntityStore)
//! receives at construction. It is called for every cache hit, miss, write,
//! invalidation and repository call, and for every error, with the request's
//! trace id so a collector can correlate events without ambient state.
//!
//! ```
//! use user_store::observability::CacheMetrics;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct HitCounter(AtomicU64);
//!
//! impl CacheMetrics for HitCounter {
//!     fn record_hit(&self, _trace_id: &str, _key: &str, _duration: Duration) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```
//!
//! The provided methods log through the `log` crate, so an implementation
//! only overrides what it collects. [`NoOpMetrics`] discards everything and
//! is the store's default.

use std::time::Duration;

/// Trait for store metrics and tracing.
pub trait CacheMetrics: Send + Sync {
    /// Record a cache hit.
    fn record_hit(&self, trace_id: &str, key: &str, duration: Duration) {
        debug!("[{}] Cache HIT: {} took {:?}", trace_id, key, duration);
    }

    /// Record a cache miss.
    fn record_miss(&self, trace_id: &str, key: &str, duration: Duration) {
        debug!("[{}] Cache MISS: {} took {:?}", trace_id, key, duration);
    }

    /// Record a cache write.
    fn record_set(&self, trace_id: &str, key: &str, duration: Duration) {
        debug!("[{}] Cache SET: {} took {:?}", trace_id, key, duration);
    }

    /// Record a cache invalidation.
    fn record_delete(&self, trace_id: &str, key: &str, duration: Duration) {
        debug!("[{}] Cache DELETE: {} took {:?}", trace_id, key, duration);
    }

    /// Record a repository call, e.g. `operation = "fetch_by_id"`.
    fn record_repository(&self, trace_id: &str, operation: &str, duration: Duration) {
        debug!("[{}] Repository {} took {:?}", trace_id, operation, duration);
    }

    /// Record an error.
    fn record_error(&self, trace_id: &str, key: &str, error: &str) {
        warn!("[{}] Store ERROR for {}: {}", trace_id, key, error);
    }
}

/// Metrics implementation that discards every event.
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _trace_id: &str, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _trace_id: &str, _key: &str, _duration: Duration) {}
    fn record_set(&self, _trace_id: &str, _key: &str, _duration: Duration) {}
    fn record_delete(&self, _trace_id: &str, _key: &str, _duration: Duration) {}
    fn record_repository(&self, _trace_id: &str, _operation: &str, _duration: Duration) {}
    fn record_error(&self, _trace_id: &str, _key: &str, _error: &str) {}
}

/// Metrics implementation that logs every event via the provided methods.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl CacheMetrics for LogMetrics {}
