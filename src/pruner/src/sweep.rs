//! Sweep orchestration across tenants.
//!
//! Every immediate subdirectory of the sweep root is one tenant. Each tenant
//! gets its cutoff computed up front and its own prune task; the sweep returns
//! only once every task has finished. Tenants share nothing but the metrics
//! counters, so the tasks need no coordination.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::fs::TenantFilesystem;
use crate::metrics::SweepMetrics;
use crate::retention::{RetentionPolicyError, RetentionPolicyResolver};
use crate::walker::{PruneReport, PruneWalker};

/// A tenant that was not swept because its policy could not be resolved.
#[derive(Debug, Clone)]
pub struct SkippedTenant {
    pub tenant_id: String,
    pub error: RetentionPolicyError,
}

/// Result of a complete sweep across all tenants
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub sweep_root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Per-tenant results, in completion order.
    pub tenant_results: Vec<PruneReport>,
    pub skipped_tenants: Vec<SkippedTenant>,
    /// Tenant tasks that panicked instead of completing.
    pub failed_tasks: usize,
}

impl SweepReport {
    pub fn total_deleted(&self) -> usize {
        self.tenant_results
            .iter()
            .map(|r| r.directories_deleted)
            .sum()
    }

    pub fn total_errors(&self) -> usize {
        self.tenant_results.iter().map(|r| r.errors.len()).sum()
    }

    pub fn tenant(&self, tenant_id: &str) -> Option<&PruneReport> {
        self.tenant_results
            .iter()
            .find(|report| report.tenant_id == tenant_id)
    }
}

/// Errors that abort a sweep before any tenant work starts.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Could not open base directory {}: {source}", .path.display())]
    SweepRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs one prune task per tenant directory and joins them all.
pub struct SweepOrchestrator {
    fs: Arc<dyn TenantFilesystem>,
    resolver: Arc<RetentionPolicyResolver>,
    metrics: SweepMetrics,
}

impl SweepOrchestrator {
    pub fn new(
        fs: Arc<dyn TenantFilesystem>,
        resolver: RetentionPolicyResolver,
        metrics: SweepMetrics,
    ) -> Self {
        Self {
            fs,
            resolver: Arc::new(resolver),
            metrics,
        }
    }

    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// Sweep every tenant under `sweep_root` relative to `now`.
    ///
    /// # Errors
    ///
    /// Only an unreadable sweep root is an error. Tenant resolution failures
    /// and per-path failures are logged and reported in the [`SweepReport`].
    pub async fn run(
        &self,
        sweep_root: &Path,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, SweepError> {
        let started_at = Utc::now();

        let listing =
            self.fs
                .read_dir(sweep_root)
                .await
                .map_err(|source| SweepError::SweepRootUnreadable {
                    path: sweep_root.to_path_buf(),
                    source,
                })?;

        info!(
            sweep_root = %sweep_root.display(),
            entries = listing.entries.len(),
            now = %now.to_rfc3339(),
            "Starting sweep"
        );

        for failure in &listing.failures {
            error!(
                path = %failure.path.display(),
                error = %failure.error,
                "Failed to inspect sweep root entry, skipping"
            );
            self.metrics.record_path_error();
        }

        let walker = PruneWalker::new(self.fs.clone(), self.metrics.clone());
        let mut tasks = JoinSet::new();
        let mut skipped_tenants = Vec::new();

        for entry in listing.entries.into_iter().filter(|entry| entry.is_dir) {
            let tenant_id = entry.name();

            let cutoff = match self.resolver.compute_cutoff(&tenant_id, now) {
                Ok(cutoff) => cutoff,
                Err(e) => {
                    error!(
                        tenant_id = %tenant_id,
                        error = %e,
                        "Skipping tenant, retention policy could not be resolved"
                    );
                    self.metrics.record_tenant_skipped();
                    skipped_tenants.push(SkippedTenant {
                        tenant_id,
                        error: e,
                    });
                    continue;
                }
            };

            debug!(cutoff = %cutoff.display(), "Resolved tenant retention");

            let walker = walker.clone();
            let tenant_root = entry.path;
            tasks.spawn(async move { walker.prune(&tenant_root, &cutoff).await });
        }

        let mut tenant_results = Vec::with_capacity(tasks.len());
        let mut failed_tasks = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => {
                    self.metrics.record_tenant_swept();
                    tenant_results.push(report);
                }
                Err(e) => {
                    error!(error = %e, "Tenant prune task failed");
                    failed_tasks += 1;
                }
            }
        }

        let report = SweepReport {
            sweep_root: sweep_root.to_path_buf(),
            started_at,
            completed_at: Utc::now(),
            tenant_results,
            skipped_tenants,
            failed_tasks,
        };

        info!(
            sweep_root = %sweep_root.display(),
            tenants_swept = report.tenant_results.len(),
            tenants_skipped = report.skipped_tenants.len(),
            directories_deleted = report.total_deleted(),
            path_errors = report.total_errors(),
            duration_ms = (report.completed_at - report.started_at).num_milliseconds(),
            "Sweep completed"
        );

        Ok(report)
    }
}
