use std::collections::HashMap;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use figment::{
    Figment, Profile, Provider,
    providers::{Env, Format, Json, Serialized, Toml},
    value::{Dict, Value},
};

/// Key under which the fallback policy lives in the tenant policy map.
pub const DEFAULT_POLICY_KEY: &str = "default";

/// Configuration file read by [`Configuration::load`].
pub const DEFAULT_CONFIG_FILE: &str = "dirprune.toml";

/// Prefix for environment variable overrides, nested keys split on `__`.
pub const ENV_PREFIX: &str = "DIRPRUNE__";

/// Retention policy for a single company (tenant).
///
/// `retention_days` is kept exactly as configured. It is only interpreted when
/// the tenant is swept, so a bad value skips that tenant instead of failing
/// the whole run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Tenant identifier, matching the tenant's directory name under `base_dir`.
    pub company_id: String,
    /// Human-readable tenant name, used in diagnostics only.
    #[serde(default)]
    pub company_name: String,
    /// Number of days dated directories are kept, as configured.
    ///
    /// Env: DIRPRUNE__DEFAULT__RETENTION_DAYS
    #[serde(deserialize_with = "deserialize_retention_days")]
    pub retention_days: String,
}

impl RetentionPolicy {
    pub fn new(
        company_id: impl Into<String>,
        company_name: impl Into<String>,
        retention_days: impl Into<String>,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            company_name: company_name.into(),
            retention_days: retention_days.into(),
        }
    }

    /// Parse the configured retention as a non-negative day count.
    pub fn parse_retention_days(&self) -> Result<u32, ParseIntError> {
        self.retention_days.parse::<u32>()
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_POLICY_KEY, "Default", "30")
    }
}

/// Accepts both `retention_days = "30"` and `retention_days = 30`.
fn deserialize_retention_days<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawRetentionDays {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawRetentionDays::deserialize(deserializer)? {
        RawRetentionDays::Text(text) => text,
        RawRetentionDays::Signed(days) => days.to_string(),
        RawRetentionDays::Unsigned(days) => days.to_string(),
    })
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Configuration {
    /// Sweep root: every immediate subdirectory is one tenant.
    ///
    /// Env: DIRPRUNE__BASE_DIR
    pub base_dir: PathBuf,
    /// Policy applied to tenants without an entry in `companies`.
    pub default: RetentionPolicy,
    /// Per-tenant policies.
    #[serde(default)]
    pub companies: Vec<RetentionPolicy>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/tmp/foo"),
            default: RetentionPolicy::default(),
            companies: Vec::new(),
        }
    }
}

impl Configuration {
    /// Load `dirprune.toml` from the working directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a TOML or JSON file (by extension), layered
    /// over the defaults and overridden by `DIRPRUNE__*` environment variables.
    ///
    /// Keys may be written in camelCase (`companyId`, `retentionDays`) as well
    /// as snake_case.
    ///
    /// A missing or unreadable file is an error: the sweep must not run
    /// against policies it never saw.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let invalid = |source: figment::Error| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: Box::new(source),
        };

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let mut data = if is_json(path) {
            Json::string(&contents).data()
        } else {
            Toml::string(&contents).data()
        }
        .map_err(invalid)?;
        let file = normalize_keys(data.remove(&Profile::Default).unwrap_or_default());

        Figment::from(Serialized::defaults(Configuration::default()))
            .merge(Serialized::defaults(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(invalid)
    }

    /// Tenant policy map: the default policy under [`DEFAULT_POLICY_KEY`],
    /// then every company keyed by its id. Later duplicates win.
    pub fn policy_map(&self) -> HashMap<String, RetentionPolicy> {
        let mut policies = HashMap::with_capacity(self.companies.len() + 1);
        policies.insert(DEFAULT_POLICY_KEY.to_string(), self.default.clone());
        for company in &self.companies {
            policies.insert(company.company_id.clone(), company.clone());
        }
        policies
    }

    /// Structural checks that must hold before a sweep starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "base_dir cannot be empty".to_string(),
            ));
        }

        for company in &self.companies {
            if company.company_id.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "company '{}' has an empty company_id",
                    company.company_name
                )));
            }
            if company.company_id == DEFAULT_POLICY_KEY {
                return Err(ConfigError::Validation(format!(
                    "company id '{DEFAULT_POLICY_KEY}' is reserved for the default policy"
                )));
            }
        }

        Ok(())
    }

    /// Policies whose retention value will not parse. Those tenants are
    /// skipped at sweep time.
    pub fn invalid_policies(&self) -> Vec<&RetentionPolicy> {
        std::iter::once(&self.default)
            .chain(self.companies.iter())
            .filter(|policy| policy.parse_retention_days().is_err())
            .collect()
    }
}

/// Rewrite every key in `dict`, recursively, to snake_case.
fn normalize_keys(dict: Dict) -> Dict {
    dict.into_iter()
        .map(|(key, value)| (snake_case(&key), normalize_value(value)))
        .collect()
}

fn normalize_value(value: Value) -> Value {
    match value {
        Value::Dict(tag, dict) => Value::Dict(tag, normalize_keys(dict)),
        Value::Array(tag, values) => {
            Value::Array(tag, values.into_iter().map(normalize_value).collect())
        }
        other => other,
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read configuration file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: Box<figment::Error>,
    },

    #[error("Invalid configuration: {0}")]
    Validation(String),
}
