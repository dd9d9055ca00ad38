//! Tenant policy map.

use common::config::{Configuration, DEFAULT_POLICY_KEY, RetentionPolicy};
use std::collections::HashMap;
use std::fmt;

/// Immutable map from tenant id to its retention policy.
///
/// The fallback policy is stored under [`DEFAULT_POLICY_KEY`]. Built once per
/// run and shared read-only by every tenant task.
#[derive(Debug, Clone, Default)]
pub struct PolicyMap {
    policies: HashMap<String, RetentionPolicy>,
}

impl PolicyMap {
    pub fn new(policies: HashMap<String, RetentionPolicy>) -> Self {
        Self { policies }
    }

    pub fn from_configuration(config: &Configuration) -> Self {
        Self::new(config.policy_map())
    }

    /// Look up the policy governing `tenant_id`, falling back to the default.
    pub fn lookup(&self, tenant_id: &str) -> Option<(&RetentionPolicy, RetentionPolicySource)> {
        if let Some(policy) = self.policies.get(tenant_id) {
            let source = if tenant_id == DEFAULT_POLICY_KEY {
                RetentionPolicySource::Default
            } else {
                RetentionPolicySource::Tenant
            };
            return Some((policy, source));
        }

        self.policies
            .get(DEFAULT_POLICY_KEY)
            .map(|policy| (policy, RetentionPolicySource::Default))
    }
}

impl From<HashMap<String, RetentionPolicy>> for PolicyMap {
    fn from(policies: HashMap<String, RetentionPolicy>) -> Self {
        Self::new(policies)
    }
}

/// Where a tenant's retention came from, for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicySource {
    /// Explicit entry for the tenant.
    Tenant,
    /// Fallback default policy.
    Default,
}

impl fmt::Display for RetentionPolicySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionPolicySource::Tenant => write!(f, "tenant"),
            RetentionPolicySource::Default => write!(f, "default"),
        }
    }
}
