//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Tables published successfully
    tables_published: AtomicU64,
    /// Data rows published (header excluded)
    rows_published: AtomicU64,
    /// Cells reported as updated by the destination
    cells_updated: AtomicU64,
    /// Failed publish attempts
    failure_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful publish
    pub fn record_published(&self, rows: usize, cells: usize) {
        self.tables_published.fetch_add(1, Ordering::Relaxed);
        self.rows_published.fetch_add(rows as u64, Ordering::Relaxed);
        self.cells_updated.fetch_add(cells as u64, Ordering::Relaxed);
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tables_published(&self) -> u64 {
        self.tables_published.load(Ordering::Relaxed)
    }

    pub fn rows_published(&self) -> u64 {
        self.rows_published.load(Ordering::Relaxed)
    }

    pub fn cells_updated(&self) -> u64 {
        self.cells_updated.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tables_published: self.tables_published(),
            rows_published: self.rows_published(),
            cells_updated: self.cells_updated(),
            failure_count: self.failure_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tables_published: u64,
    pub rows_published: u64,
    pub cells_updated: u64,
    pub failure_count: u64,
}
