//! Receiver counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by clones of a receiver
#[derive(Debug, Default)]
pub struct DispatchStats {
    executed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    idle: AtomicU64,
}

/// Point-in-time copy of [`DispatchStats`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Payloads that ran to completion
    pub executed: u64,
    /// Payloads that failed to parse or raised
    pub failed: u64,
    /// Polls abandoned on a store error
    pub skipped: u64,
    /// Polls that found nothing pending
    pub idle: u64,
}

impl StatsSnapshot {
    /// Payloads consumed, whether or not they succeeded
    pub fn consumed(&self) -> u64 {
        self.executed + self.failed
    }
}

impl DispatchStats {
    pub(crate) fn record_executed(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_idle(&self) {
        self.idle.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            executed: self.executed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            idle: self.idle.load(Ordering::Relaxed),
        }
    }
}
