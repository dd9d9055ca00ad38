//! Test configuration builder for creating sweep setups quickly.

use std::path::Path;

use crate::config::{Configuration, RetentionPolicy};

/// Builder for creating test configurations.
///
/// Starts from [`Configuration::default`] with no company policies.
#[derive(Debug, Clone)]
pub struct TestConfigBuilder {
    config: Configuration,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
        }
    }

    /// Set the sweep root, typically a `TempDir` path.
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.base_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the raw retention value of the default policy.
    pub fn with_default_retention(mut self, retention_days: &str) -> Self {
        self.config.default.retention_days = retention_days.to_string();
        self
    }

    /// Add a company policy, using the id as its display name.
    pub fn with_company(self, company_id: &str, retention_days: &str) -> Self {
        self.with_named_company(company_id, company_id, retention_days)
    }

    /// Add a company policy with an explicit display name.
    pub fn with_named_company(
        mut self,
        company_id: &str,
        company_name: &str,
        retention_days: &str,
    ) -> Self {
        self.config.companies.push(RetentionPolicy::new(
            company_id,
            company_name,
            retention_days,
        ));
        self
    }

    pub fn build(self) -> Configuration {
        self.config
    }
}
