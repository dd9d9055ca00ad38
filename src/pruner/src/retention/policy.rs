//! Retention policy resolution with default fallback.

use super::config::{PolicyMap, RetentionPolicySource};
use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// A tenant's retention after lookup and parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRetention {
    /// Tenant whose directory is being swept.
    pub tenant_id: String,
    /// Name from the governing policy (the default policy's name on fallback).
    pub tenant_name: String,
    pub retention_days: u32,
    pub source: RetentionPolicySource,
}

/// Computed retention cutoff for one tenant sweep.
#[derive(Debug, Clone)]
pub struct RetentionCutoff {
    pub tenant_id: String,
    pub tenant_name: String,
    pub retention_days: u32,
    pub source: RetentionPolicySource,

    /// The sweep's "now". Directories that carry no date map to this instant.
    pub evaluated_at: DateTime<Utc>,

    /// Directories whose boundary is strictly before this are deleted.
    pub cutoff_timestamp: DateTime<Utc>,
}

impl RetentionCutoff {
    /// Check if a directory boundary is expired.
    pub fn is_expired(&self, boundary: DateTime<Utc>) -> bool {
        boundary < self.cutoff_timestamp
    }

    /// Human-readable representation for logging.
    pub fn display(&self) -> String {
        format!(
            "tenant={} [{}], retention_days={}, source={}, cutoff={}",
            self.tenant_id,
            self.tenant_name,
            self.retention_days,
            self.source,
            self.cutoff_timestamp.to_rfc3339(),
        )
    }
}

/// Resolves tenant retention against a [`PolicyMap`].
///
/// Resolution order:
/// 1. Tenant-specific policy (if exists)
/// 2. Default policy
#[derive(Debug, Clone)]
pub struct RetentionPolicyResolver {
    policies: PolicyMap,
}

impl RetentionPolicyResolver {
    pub fn new(policies: PolicyMap) -> Self {
        Self { policies }
    }

    /// Resolve the retention days that apply to `tenant_id`.
    ///
    /// # Errors
    ///
    /// - [`RetentionPolicyError::MissingDefaultPolicy`] if the tenant has no
    ///   policy and no default exists
    /// - [`RetentionPolicyError::InvalidRetentionValue`] if the governing
    ///   policy's retention is not a non-negative integer
    pub fn resolve(&self, tenant_id: &str) -> Result<ResolvedRetention, RetentionPolicyError> {
        let (policy, source) = self.policies.lookup(tenant_id).ok_or_else(|| {
            RetentionPolicyError::MissingDefaultPolicy {
                tenant_id: tenant_id.to_string(),
            }
        })?;

        let retention_days = policy.parse_retention_days().map_err(|_| {
            RetentionPolicyError::InvalidRetentionValue {
                raw: policy.retention_days.clone(),
                tenant_id: tenant_id.to_string(),
                tenant_name: policy.company_name.clone(),
            }
        })?;

        Ok(ResolvedRetention {
            tenant_id: tenant_id.to_string(),
            tenant_name: policy.company_name.clone(),
            retention_days,
            source,
        })
    }

    /// Compute the cutoff for `tenant_id`: `now` minus its retention days.
    ///
    /// Called once per tenant before its walk starts; the walk never
    /// re-reads the clock.
    pub fn compute_cutoff(
        &self,
        tenant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RetentionCutoff, RetentionPolicyError> {
        let resolved = self.resolve(tenant_id)?;

        let cutoff_timestamp = TimeDelta::try_days(i64::from(resolved.retention_days))
            .and_then(|retention| now.checked_sub_signed(retention))
            .ok_or_else(|| RetentionPolicyError::CutoffUnderflow {
                tenant_id: tenant_id.to_string(),
                retention_days: resolved.retention_days,
            })?;

        Ok(RetentionCutoff {
            tenant_id: resolved.tenant_id,
            tenant_name: resolved.tenant_name,
            retention_days: resolved.retention_days,
            source: resolved.source,
            evaluated_at: now,
            cutoff_timestamp,
        })
    }
}

/// Errors that skip a single tenant. None of these abort the sweep.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetentionPolicyError {
    /// The governing policy's retention value is not a non-negative integer.
    #[error("Retention time [{raw}] for company {tenant_name} [{tenant_id}] is not a number")]
    InvalidRetentionValue {
        raw: String,
        tenant_id: String,
        tenant_name: String,
    },

    /// No tenant policy and no default policy.
    #[error("No retention policy for tenant {tenant_id} and no default policy configured")]
    MissingDefaultPolicy { tenant_id: String },

    /// Subtracting the retention period leaves the representable time range.
    #[error("Cutoff timestamp underflow for {tenant_id} with retention of {retention_days} days")]
    CutoffUnderflow {
        tenant_id: String,
        retention_days: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::config::{DEFAULT_POLICY_KEY, RetentionPolicy};
    use common::testing::TestConfigBuilder;
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
    }

    fn resolver() -> RetentionPolicyResolver {
        let config = TestConfigBuilder::new()
            .with_default_retention("7")
            .with_named_company("acme", "Acme Corp", "30")
            .with_named_company("initech", "Initech", "abc")
            .build();
        RetentionPolicyResolver::new(PolicyMap::from_configuration(&config))
    }

    #[test]
    fn test_resolve_tenant_policy() {
        let resolved = resolver().resolve("acme").unwrap();
        assert_eq!(resolved.retention_days, 30);
        assert_eq!(resolved.tenant_name, "Acme Corp");
        assert_eq!(resolved.source, RetentionPolicySource::Tenant);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        let resolved = resolver().resolve("unknownco").unwrap();
        assert_eq!(resolved.tenant_id, "unknownco");
        assert_eq!(resolved.retention_days, 7);
        assert_eq!(resolved.source, RetentionPolicySource::Default);
    }

    #[test]
    fn test_invalid_retention_value() {
        let err = resolver().resolve("initech").unwrap_err();
        assert_eq!(
            err,
            RetentionPolicyError::InvalidRetentionValue {
                raw: "abc".to_string(),
                tenant_id: "initech".to_string(),
                tenant_name: "Initech".to_string(),
            }
        );
        assert!(err.to_string().contains("[abc]"));
    }

    #[test]
    fn test_negative_retention_is_invalid() {
        let config = TestConfigBuilder::new().with_company("acme", "-3").build();
        let resolver = RetentionPolicyResolver::new(PolicyMap::from_configuration(&config));
        assert!(matches!(
            resolver.resolve("acme"),
            Err(RetentionPolicyError::InvalidRetentionValue { .. })
        ));
    }

    #[test]
    fn test_missing_default_policy() {
        let mut policies = HashMap::new();
        policies.insert(
            "acme".to_string(),
            RetentionPolicy::new("acme", "Acme", "30"),
        );
        let resolver = RetentionPolicyResolver::new(PolicyMap::new(policies));

        assert!(resolver.resolve("acme").is_ok());
        assert!(matches!(
            resolver.resolve("unknownco"),
            Err(RetentionPolicyError::MissingDefaultPolicy { .. })
        ));
    }

    #[test]
    fn test_compute_cutoff() {
        let resolver = resolver();

        let acme = resolver.compute_cutoff("acme", now()).unwrap();
        assert_eq!(
            acme.cutoff_timestamp,
            Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap()
        );
        assert_eq!(acme.evaluated_at, now());

        let unknown = resolver.compute_cutoff("unknownco", now()).unwrap();
        assert_eq!(
            unknown.cutoff_timestamp,
            Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap()
        );
        assert_eq!(unknown.source, RetentionPolicySource::Default);
    }

    #[test]
    fn test_zero_retention_cutoff_is_now() {
        let config = TestConfigBuilder::new().with_company("acme", "0").build();
        let resolver = RetentionPolicyResolver::new(PolicyMap::from_configuration(&config));

        let cutoff = resolver.compute_cutoff("acme", now()).unwrap();
        assert_eq!(cutoff.cutoff_timestamp, now());
        assert!(!cutoff.is_expired(now()));
    }

    #[test]
    fn test_huge_retention_underflows() {
        let config = TestConfigBuilder::new()
            .with_company("acme", &u32::MAX.to_string())
            .build();
        let resolver = RetentionPolicyResolver::new(PolicyMap::from_configuration(&config));

        assert!(matches!(
            resolver.compute_cutoff("acme", now()),
            Err(RetentionPolicyError::CutoffUnderflow { .. })
        ));
    }

    #[test]
    fn test_is_expired_is_strict() {
        let cutoff = resolver().compute_cutoff("acme", now()).unwrap();

        let before = cutoff.cutoff_timestamp - TimeDelta::seconds(1);
        assert!(cutoff.is_expired(before));
        assert!(!cutoff.is_expired(cutoff.cutoff_timestamp));
        assert!(!cutoff.is_expired(cutoff.cutoff_timestamp + TimeDelta::days(1)));
    }

    #[test]
    fn test_default_key_resolves_as_default() {
        let resolved = resolver().resolve(DEFAULT_POLICY_KEY).unwrap();
        assert_eq!(resolved.source, RetentionPolicySource::Default);
    }
}
