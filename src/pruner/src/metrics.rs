//! Sweep metrics tracking
//!
//! Thread-safe counters shared by every tenant task of a sweep.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Thread-safe metrics for tracking a sweep
#[derive(Debug, Clone)]
pub struct SweepMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    tenants_swept: AtomicUsize,
    tenants_skipped: AtomicUsize,
    directories_visited: AtomicUsize,
    directories_deleted: AtomicUsize,
    files_skipped: AtomicUsize,
    path_errors: AtomicUsize,
}

impl Default for SweepMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                tenants_swept: AtomicUsize::new(0),
                tenants_skipped: AtomicUsize::new(0),
                directories_visited: AtomicUsize::new(0),
                directories_deleted: AtomicUsize::new(0),
                files_skipped: AtomicUsize::new(0),
                path_errors: AtomicUsize::new(0),
            }),
        }
    }

    pub fn record_tenant_swept(&self) {
        self.inner.tenants_swept.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tenant_skipped(&self) {
        self.inner.tenants_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_directory_visited(&self) {
        self.inner
            .directories_visited
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_directory_deleted(&self) {
        self.inner
            .directories_deleted
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_files_skipped(&self, count: usize) {
        self.inner.files_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_path_error(&self) {
        self.inner.path_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tenants_swept(&self) -> usize {
        self.inner.tenants_swept.load(Ordering::Relaxed)
    }

    pub fn tenants_skipped(&self) -> usize {
        self.inner.tenants_skipped.load(Ordering::Relaxed)
    }

    pub fn directories_visited(&self) -> usize {
        self.inner.directories_visited.load(Ordering::Relaxed)
    }

    pub fn directories_deleted(&self) -> usize {
        self.inner.directories_deleted.load(Ordering::Relaxed)
    }

    pub fn files_skipped(&self) -> usize {
        self.inner.files_skipped.load(Ordering::Relaxed)
    }

    pub fn path_errors(&self) -> usize {
        self.inner.path_errors.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            tenants_swept: self.tenants_swept(),
            tenants_skipped: self.tenants_skipped(),
            directories_visited: self.directories_visited(),
            directories_deleted: self.directories_deleted(),
            files_skipped: self.files_skipped(),
            path_errors: self.path_errors(),
        }
    }
}

/// Snapshot of sweep metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSummary {
    pub tenants_swept: usize,
    pub tenants_skipped: usize,
    pub directories_visited: usize,
    pub directories_deleted: usize,
    pub files_skipped: usize,
    pub path_errors: usize,
}

impl MetricsSummary {
    /// Log the summary in human-readable form
    pub fn log(&self) {
        tracing::info!("=== Sweep Metrics Summary ===");
        tracing::info!(
            "Tenants: {} swept, {} skipped",
            self.tenants_swept,
            self.tenants_skipped
        );
        tracing::info!(
            "Directories: {} visited, {} deleted",
            self.directories_visited,
            self.directories_deleted
        );
        tracing::info!(
            "Files left in place: {}, path errors: {}",
            self.files_skipped,
            self.path_errors
        );
    }
}
