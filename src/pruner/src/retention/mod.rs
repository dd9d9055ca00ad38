//! Per-tenant retention resolution.
//!
//! - `config`: the in-memory tenant policy map handed over by the config provider
//! - `policy`: resolution of a tenant's retention days and its cutoff instant
//!
//! ## Usage
//!
//! ```no_run
//! use chrono::Utc;
//! use common::config::Configuration;
//! use pruner::retention::{PolicyMap, RetentionPolicyResolver};
//!
//! let config = Configuration::default();
//! let resolver = RetentionPolicyResolver::new(PolicyMap::from_configuration(&config));
//!
//! let cutoff = resolver.compute_cutoff("acme", Utc::now())?;
//! println!("Retention cutoff: {}", cutoff.cutoff_timestamp);
//! # Ok::<(), pruner::retention::RetentionPolicyError>(())
//! ```

pub mod config;
pub mod policy;

pub use config::{PolicyMap, RetentionPolicySource};
pub use policy::{ResolvedRetention, RetentionCutoff, RetentionPolicyError, RetentionPolicyResolver};
