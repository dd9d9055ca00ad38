//! Depth-first prune of a single tenant tree.
//!
//! Each directory is mapped to its boundary instant. Expired directories are
//! removed as a whole and never descended into; everything else is listed and
//! its subdirectories are queued. Files are never touched individually.
//!
//! Errors are absorbed per path: a failed listing or delete is logged and
//! recorded in the [`PruneReport`], and the walk carries on with the rest of
//! the tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, trace, warn};

use crate::fs::{DirEntryInfo, TenantFilesystem};
use crate::inference::{infer_boundary, path_depth};
use crate::metrics::SweepMetrics;
use crate::retention::RetentionCutoff;

/// Result of pruning one tenant tree
#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    pub tenant_id: String,
    pub directories_visited: usize,
    pub directories_deleted: usize,
    pub files_skipped: usize,
    /// One message per path that could not be read or deleted.
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// What happened to a single visited directory.
#[derive(Debug)]
enum NodeOutcome {
    /// Kept; these are its subdirectories, in name order.
    Kept(Vec<PathBuf>),
    Deleted,
    Failed(String),
}

/// Walks tenant trees and removes expired dated directories.
#[derive(Clone)]
pub struct PruneWalker {
    fs: Arc<dyn TenantFilesystem>,
    metrics: SweepMetrics,
}

impl PruneWalker {
    pub fn new(fs: Arc<dyn TenantFilesystem>, metrics: SweepMetrics) -> Self {
        Self { fs, metrics }
    }

    /// Prune `tenant_root` against `cutoff`.
    ///
    /// Never fails: every filesystem error is logged and reported in the
    /// returned [`PruneReport`].
    pub async fn prune(&self, tenant_root: &Path, cutoff: &RetentionCutoff) -> PruneReport {
        let started = Instant::now();
        let base_depth = path_depth(tenant_root);
        let mut report = PruneReport {
            tenant_id: cutoff.tenant_id.clone(),
            ..Default::default()
        };

        info!(
            tenant_id = %cutoff.tenant_id,
            tenant_root = %tenant_root.display(),
            cutoff = %cutoff.cutoff_timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            retention_days = cutoff.retention_days,
            source = %cutoff.source,
            "Starting tenant prune"
        );

        let mut pending = vec![tenant_root.to_path_buf()];
        while let Some(path) = pending.pop() {
            report.directories_visited += 1;
            self.metrics.record_directory_visited();

            match self.visit(&path, base_depth, cutoff, &mut report).await {
                NodeOutcome::Kept(children) => {
                    // Reverse so the lowest name is popped first.
                    pending.extend(children.into_iter().rev());
                }
                NodeOutcome::Deleted => {
                    report.directories_deleted += 1;
                    self.metrics.record_directory_deleted();
                }
                NodeOutcome::Failed(message) => {
                    report.errors.push(message);
                    self.metrics.record_path_error();
                }
            }
        }

        report.duration = started.elapsed();

        info!(
            tenant_id = %cutoff.tenant_id,
            directories_visited = report.directories_visited,
            directories_deleted = report.directories_deleted,
            files_skipped = report.files_skipped,
            errors = report.errors.len(),
            duration_ms = report.duration.as_millis() as u64,
            "Tenant prune completed"
        );

        report
    }

    async fn visit(
        &self,
        path: &Path,
        base_depth: usize,
        cutoff: &RetentionCutoff,
        report: &mut PruneReport,
    ) -> NodeOutcome {
        let boundary = infer_boundary(path, base_depth, cutoff.evaluated_at);
        trace!(
            tenant_id = %cutoff.tenant_id,
            path = %path.display(),
            boundary = %boundary.to_rfc3339(),
            cutoff = %cutoff.cutoff_timestamp.to_rfc3339(),
            "Visiting directory"
        );

        if cutoff.is_expired(boundary) {
            // A failed delete is not descended into: every child would be
            // expired as well and was already part of the attempt.
            return match self.fs.remove_dir_all(path).await {
                Ok(()) => {
                    info!(
                        tenant_id = %cutoff.tenant_id,
                        path = %path.display(),
                        boundary = %boundary.to_rfc3339(),
                        "Removed expired directory"
                    );
                    NodeOutcome::Deleted
                }
                Err(e) => {
                    error!(
                        tenant_id = %cutoff.tenant_id,
                        path = %path.display(),
                        error = %e,
                        "Failed to remove expired directory"
                    );
                    NodeOutcome::Failed(format!("Error removing path {}: {e}", path.display()))
                }
            };
        }

        match self.fs.read_dir(path).await {
            Ok(listing) => {
                for failure in listing.failures {
                    warn!(
                        tenant_id = %cutoff.tenant_id,
                        path = %failure.path.display(),
                        error = %failure.error,
                        "Failed to inspect directory entry, skipping"
                    );
                    report.errors.push(format!(
                        "Error in path {}: {}",
                        failure.path.display(),
                        failure.error
                    ));
                    self.metrics.record_path_error();
                }

                let (dirs, files): (Vec<DirEntryInfo>, Vec<DirEntryInfo>) =
                    listing.entries.into_iter().partition(|entry| entry.is_dir);

                if !files.is_empty() {
                    debug!(
                        tenant_id = %cutoff.tenant_id,
                        path = %path.display(),
                        files = files.len(),
                        "Leaving files in place"
                    );
                    report.files_skipped += files.len();
                    self.metrics.record_files_skipped(files.len());
                }

                NodeOutcome::Kept(dirs.into_iter().map(|entry| entry.path).collect())
            }
            Err(e) => {
                warn!(
                    tenant_id = %cutoff.tenant_id,
                    path = %path.display(),
                    error = %e,
                    "Failed to read directory, skipping"
                );
                NodeOutcome::Failed(format!("Error in path {}: {e}", path.display()))
            }
        }
    }
}
