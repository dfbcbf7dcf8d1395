//! # Handler Pool Module
//!
//! Best-effort reuse cache for handler instances, one pool per registered
//! handler name.
//!
//! ## Contract
//!
//! - **Non-blocking**: [`HandlerPool::take`] returns `None` immediately when
//!   no instance is idle; callers construct a fresh one instead of waiting.
//! - **Unbounded**: [`HandlerPool::put`] always succeeds. The pool caps
//!   nothing; dispatch latency is bounded by construction cost, not by
//!   contention.
//! - **Exclusive checkout**: an instance is moved out on `take` and moved
//!   back on `put`, so two dispatches can never hold the same instance.
//! - **Clean before put**: whoever returns an instance must already have run
//!   its `clean` step.
//!
//! Backed by a lock-free `SegQueue`, so concurrent take/put from many
//! dispatches never serialize on a mutex.

use crossbeam::queue::SegQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for a handler pool
#[derive(Debug, Default)]
pub struct PoolMetrics {
    /// Dispatches routed to this handler name
    pub dispatched_count: AtomicU64,
    /// Instances built by the factory
    pub constructed_count: AtomicU64,
    /// Checkouts served from an idle instance
    pub reused_count: AtomicU64,
    /// Instances returned after a clean step
    pub returned_count: AtomicU64,
    /// Instances parked by prewarming, before serving any request
    pub prewarmed_count: AtomicU64,
    /// Panics caught while this handler was executing
    pub panic_count: AtomicU64,
}

impl PoolMetrics {
    pub fn record_dispatch(&self) {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_construct(&self) {
        self.constructed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reuse(&self) {
        self.reused_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_return(&self) {
        self.returned_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prewarm(&self) {
        self.prewarmed_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_panic(&self) {
        self.panic_count.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of a pool's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub dispatched: u64,
    pub constructed: u64,
    pub reused: u64,
    pub returned: u64,
    pub prewarmed: u64,
    pub panics: u64,
    /// Instances idle in the pool right now (approximate under concurrency)
    pub idle: usize,
}

/// Non-blocking, unbounded pool of reusable instances
#[derive(Debug)]
pub struct HandlerPool<T> {
    idle: SegQueue<T>,
    metrics: PoolMetrics,
}

impl<T> Default for HandlerPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandlerPool<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            idle: SegQueue::new(),
            metrics: PoolMetrics::default(),
        }
    }

    /// Take an idle instance if one is available. Never blocks.
    pub fn take(&self) -> Option<T> {
        let item = self.idle.pop();
        if item.is_some() {
            self.metrics.record_reuse();
        }
        item
    }

    /// Park a cleaned instance for the next dispatch.
    pub fn put(&self, item: T) {
        self.idle.push(item);
        self.metrics.record_return();
    }

    /// Park a freshly built instance that has not served a request yet.
    pub fn prefill(&self, item: T) {
        self.idle.push(item);
        self.metrics.record_prewarm();
    }

    /// Number of idle instances
    #[must_use]
    pub fn idle(&self) -> usize {
        self.idle.len()
    }

    #[must_use]
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let m = &self.metrics;
        PoolSnapshot {
            dispatched: m.dispatched_count.load(Ordering::Relaxed),
            constructed: m.constructed_count.load(Ordering::Relaxed),
            reused: m.reused_count.load(Ordering::Relaxed),
            returned: m.returned_count.load(Ordering::Relaxed),
            prewarmed: m.prewarmed_count.load(Ordering::Relaxed),
            panics: m.panic_count.load(Ordering::Relaxed),
            idle: self.idle(),
        }
    }
}
