//! dirprune core library
//!
//! Deletes dated directory subtrees that fell out of their tenant's
//! retention window. Tenant trees are laid out as
//! `<sweep root>/<tenant>/<year>/<month>/<day>/<hour>/<minute>` and may stop
//! at any level.
//!
//! - `inference`: boundary instant of a (possibly partial) dated path
//! - `walker`: depth-first prune of one tenant tree
//! - `retention`: tenant policy lookup and cutoff computation
//! - `sweep`: one concurrent prune task per tenant, joined at the end
//! - `fs`: the filesystem seam used by the walker and the sweep
//! - `metrics`: counters shared across tenant tasks

pub mod fs;
pub mod inference;
pub mod metrics;
pub mod retention;
pub mod sweep;
pub mod walker;

// Re-export commonly used types
pub use fs::{DirEntryInfo, DirListing, EntryFailure, LocalFilesystem, TenantFilesystem};
pub use inference::{DatePrefix, Precision, infer_boundary, path_depth};
pub use metrics::{MetricsSummary, SweepMetrics};
pub use retention::{PolicyMap, RetentionCutoff, RetentionPolicyError, RetentionPolicyResolver};
pub use sweep::{SkippedTenant, SweepError, SweepOrchestrator, SweepReport};
pub use walker::{PruneReport, PruneWalker};
