// Secret Bootstrap Configuration Module
//
// This module builds the bootstrap configuration from the process
// environment, optionally layered over a YAML file (secret-bootstrap.yaml).
// Environment variables always win over file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Region of the secrets store. Unset means "do not load secrets".
pub const REGION_ENV: &str = "AWS_REGION";
/// Any value, even empty or `false`, skips loading.
pub const DISABLE_ENV: &str = "DISABLE_AWS_SECRETS";
/// Full secrets prefix, overriding `{app_name}/{runtime_env}`.
pub const PREFIX_ENV: &str = "AWS_SECRETS_PREFIX";
/// Custom Secrets Manager endpoint (LocalStack and similar).
pub const ENDPOINT_ENV: &str = "AWS_SECRETS_ENDPOINT";
/// `strict` or `lenient`, see [`OthersPolicy`].
pub const OTHERS_POLICY_ENV: &str = "AWS_SECRETS_OTHERS_POLICY";
/// Runtime environment names, checked in order.
pub const RUNTIME_ENV_VARS: [&str; 2] = ["RAILS_ENV", "APP_ENV"];

pub const DEFAULT_APP_NAME: &str = "app_1";
pub const DEFAULT_RUNTIME_ENV: &str = "development";
pub const DEFAULT_DATABASE_VAR: &str = "DATABASE_URL";
pub const DEFAULT_DATABASE_SCHEME: &str = "postgres";
/// Page size for secret listings. Secrets Manager accepts 1..=100.
pub const DEFAULT_MAX_RESULTS: i32 = 100;

/// How a malformed `others` secret is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OthersPolicy {
    /// Abort the bootstrap.
    #[default]
    Strict,
    /// Treat it like any other secret: raw value under `OTHERS`.
    Lenient,
}

impl FromStr for OthersPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(OthersPolicy::Strict),
            "lenient" => Ok(OthersPolicy::Lenient),
            other => anyhow::bail!(
                "Unsupported others policy: '{}'. Expected 'strict' or 'lenient'.",
                other
            ),
        }
    }
}

/// Optional settings read from a YAML file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub region: Option<String>,
    pub disabled: Option<bool>,
    pub prefix: Option<String>,
    /// First segment of the default prefix (default `app_1`)
    pub app_name: Option<String>,
    /// Second segment of the default prefix (default from `RAILS_ENV`)
    pub runtime_env: Option<String>,
    /// Variable receiving the database connection string
    pub database_var: Option<String>,
    /// URL scheme for connection strings built from JSON
    pub database_scheme: Option<String>,
    pub max_results: Option<i32>,
    pub endpoint_url: Option<String>,
    pub others_policy: Option<OthersPolicy>,
}

impl FileConfig {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: FileConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        Ok(config)
    }
}

/// Everything the bootstrapper needs, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub region: Option<String>,
    pub disabled: bool,
    pub prefix: String,
    pub database_var: String,
    /// Pre-existing value of `database_var`, used when no `database` secret exists
    pub database_fallback: Option<String>,
    pub database_scheme: String,
    pub max_results: i32,
    pub endpoint_url: Option<String>,
    pub others_policy: OthersPolicy,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            region: None,
            disabled: false,
            prefix: default_prefix(DEFAULT_APP_NAME, DEFAULT_RUNTIME_ENV),
            database_var: DEFAULT_DATABASE_VAR.to_string(),
            database_fallback: None,
            database_scheme: DEFAULT_DATABASE_SCHEME.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            endpoint_url: None,
            others_policy: OthersPolicy::Strict,
        }
    }
}

impl BootstrapConfig {
    /// Resolve from the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(FileConfig::default(), |key| std::env::var(key).ok())
    }

    /// Resolve from a YAML file overlaid with the process environment.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let file = match config_path {
            Some(path) => {
                let path = expand_path(path)?;
                FileConfig::from_file(&path)?
            }
            None => FileConfig::default(),
        };

        Self::from_lookup(file, |key| std::env::var(key).ok())
    }

    /// Resolve from file settings and an environment lookup function.
    ///
    /// Empty environment values count as unset, except for
    /// `DISABLE_AWS_SECRETS`, where presence alone disables loading.
    pub fn from_lookup<F>(file: FileConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let disabled = lookup(DISABLE_ENV).is_some() || file.disabled.unwrap_or(false);

        let runtime_env = RUNTIME_ENV_VARS
            .iter()
            .find_map(|&key| env(key))
            .or(file.runtime_env)
            .unwrap_or_else(|| DEFAULT_RUNTIME_ENV.to_string());

        let prefix = env(PREFIX_ENV).or(file.prefix).unwrap_or_else(|| {
            default_prefix(
                file.app_name.as_deref().unwrap_or(DEFAULT_APP_NAME),
                &runtime_env,
            )
        });

        let others_policy = match env(OTHERS_POLICY_ENV) {
            Some(value) => value
                .parse::<OthersPolicy>()
                .with_context(|| format!("Invalid {}", OTHERS_POLICY_ENV))?,
            None => file.others_policy.unwrap_or_default(),
        };

        let database_var = file
            .database_var
            .unwrap_or_else(|| DEFAULT_DATABASE_VAR.to_string());
        let database_fallback = env(&database_var);

        let config = Self {
            region: env(REGION_ENV).or(file.region),
            disabled,
            prefix,
            database_var,
            database_fallback,
            database_scheme: file
                .database_scheme
                .unwrap_or_else(|| DEFAULT_DATABASE_SCHEME.to_string()),
            max_results: file.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
            endpoint_url: env(ENDPOINT_ENV).or(file.endpoint_url),
            others_policy,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim_matches('/').is_empty() {
            anyhow::bail!("Secrets prefix cannot be empty");
        }

        if !(1..=100).contains(&self.max_results) {
            anyhow::bail!(
                "max_results must be between 1 and 100, got {}",
                self.max_results
            );
        }

        if self.database_var.is_empty() {
            anyhow::bail!("database_var cannot be empty");
        }

        if self.database_var.contains(|c: char| c == '=' || c == '\0') {
            anyhow::bail!(
                "Invalid database_var: '{}'. Variable names cannot contain '=' or NUL.",
                self.database_var.escape_debug()
            );
        }

        if self.database_scheme.is_empty() || self.database_scheme.contains("://") {
            anyhow::bail!(
                "Invalid database scheme: '{}'. Use a bare scheme such as 'postgres'.",
                self.database_scheme
            );
        }

        Ok(())
    }
}

/// Default prefix: `{app_name}/{runtime_env}`.
pub fn default_prefix(app_name: &str, runtime_env: &str) -> String {
    format!("{}/{}", app_name, runtime_env)
}

/// Resolve a config path, expanding a leading `~` to the home directory
fn expand_path(path: &str) -> Result<PathBuf> {
    if let Some(rest) = path.strip_prefix('~') {
        let home = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(home.join(rest.trim_start_matches(['/', '\\'])))
    } else {
        Ok(PathBuf::from(path))
    }
}
