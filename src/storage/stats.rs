use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the submit path and the aggregator
#[derive(Debug, Default)]
pub struct StoreCounters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    dropped: AtomicU64,
    aggregated: AtomicU64,
}

impl StoreCounters {
    pub fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the drop count before this one
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    pub fn record_aggregated(&self) {
        self.aggregated.fetch_add(1, Ordering::Release);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn aggregated(&self) -> u64 {
        self.aggregated.load(Ordering::Acquire)
    }
}

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    /// Decoded submissions handed to the queue (accepted or dropped)
    pub submitted: u64,
    /// Submissions that failed to decode
    pub rejected: u64,
    /// Submissions lost to a full or closed queue
    pub dropped: u64,
    /// Submissions folded into the table
    pub aggregated: u64,
    /// Distinct action names
    pub actions: usize,
    /// Submissions waiting in the queue
    pub pending: usize,
    pub queue_size: usize,
    pub running: bool,
}
