//! The bootstrap pass: list, fetch, derive.
//!
//! Secrets under `{prefix}/` are fetched and keyed by their short name.
//! Three short names are special:
//!
//! - `database`: a JSON object with connection fields becomes a URL in the
//!   connection-string variable; anything else is copied verbatim.
//! - `others`: a JSON object whose pairs are written as top-level variables.
//! - `database_url`: never written.
//!
//! Every other secret is written under its own name, or flattened into
//! `{NAME}_{KEY}` variables when it holds a JSON object.

use crate::config::{BootstrapConfig, OthersPolicy, DISABLE_ENV, REGION_ENV};
use crate::environment::EnvironmentMap;
use crate::error::{BootstrapError, BootstrapResult};
use crate::naming::{env_var_name, nested_env_var_name, strip_prefix, PREFIX_SEPARATOR};
use crate::provider::{SecretEntry, SecretsProvider};
use crate::value::{database_url, flatten, parse_object, SecretValue};
use std::collections::BTreeMap;

pub const DATABASE_KEY: &str = "database";
pub const DATABASE_URL_KEY: &str = "database_url";
pub const OTHERS_KEY: &str = "others";

/// Result of a bootstrap pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The disable flag was set; nothing was fetched.
    Disabled,
    /// No region configured; nothing was fetched.
    NoRegion,
    /// Secrets were fetched and turned into variables.
    Completed(EnvironmentMap),
}

impl Outcome {
    /// Derived variables, empty when a guard stopped the pass.
    pub fn into_environment(self) -> EnvironmentMap {
        match self {
            Outcome::Completed(env) => env,
            Outcome::Disabled | Outcome::NoRegion => EnvironmentMap::new(),
        }
    }
}

/// Loads secrets for one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Bootstrapper<'a> {
    config: &'a BootstrapConfig,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(config: &'a BootstrapConfig) -> Self {
        Self { config }
    }

    /// Return the early outcome if a guard stops the pass.
    pub fn guard(&self) -> Option<Outcome> {
        if self.config.disabled {
            tracing::info!("{} has been set. Secrets will not be loaded.", DISABLE_ENV);
            return Some(Outcome::Disabled);
        }

        if self.config.region.is_none() {
            tracing::info!("{} not set. Secrets will not be loaded.", REGION_ENV);
            return Some(Outcome::NoRegion);
        }

        None
    }

    /// Run the full pass against `provider`.
    ///
    /// Provider failures abort with [`BootstrapError::Provider`]. A malformed
    /// `others` secret aborts under [`OthersPolicy::Strict`].
    pub async fn run<P>(&self, provider: &P) -> BootstrapResult<Outcome>
    where
        P: SecretsProvider + ?Sized,
    {
        if let Some(outcome) = self.guard() {
            return Ok(outcome);
        }

        let entries = self.fetch(provider).await?;
        tracing::info!(
            count = entries.len(),
            prefix = %self.config.prefix,
            "fetched secrets"
        );

        let secrets: BTreeMap<String, String> = entries
            .iter()
            .filter_map(|entry| {
                strip_prefix(&entry.name, &self.config.prefix)
                    .map(|key| (key.to_string(), entry.value.clone()))
            })
            .collect();

        self.derive(&secrets).map(Outcome::Completed)
    }

    /// List and fetch every secret under the prefix.
    pub async fn fetch<P>(&self, provider: &P) -> BootstrapResult<Vec<SecretEntry>>
    where
        P: SecretsProvider + ?Sized,
    {
        let names = provider.list_secrets(self.config.max_results).await?;
        let mut entries = Vec::new();

        for name in names {
            if strip_prefix(&name, &self.config.prefix).is_none() {
                continue;
            }

            match provider.get_secret_value(&name).await? {
                Some(value) => entries.push(SecretEntry { name, value }),
                None => tracing::warn!(secret = %name, "secret has no text payload, skipping"),
            }
        }

        Ok(entries)
    }

    /// Turn short-keyed secrets into environment variables.
    pub fn derive(&self, secrets: &BTreeMap<String, String>) -> BootstrapResult<EnvironmentMap> {
        let mut env = EnvironmentMap::new();

        let database = secrets
            .get(DATABASE_KEY)
            .or(self.config.database_fallback.as_ref());
        if let Some(raw) = database {
            let url = database_url(raw, &self.config.database_scheme).unwrap_or_else(|| {
                tracing::debug!("database secret is not a JSON object, using it verbatim");
                raw.clone()
            });
            env.set(self.config.database_var.clone(), url);
        }

        if let Some(raw) = secrets.get(OTHERS_KEY) {
            self.load_others(&mut env, raw)?;
        }

        for (key, raw) in secrets {
            if matches!(key.as_str(), DATABASE_KEY | DATABASE_URL_KEY | OTHERS_KEY) {
                continue;
            }
            load_secret(&mut env, key, raw);
        }

        Ok(env)
    }

    fn load_others(&self, env: &mut EnvironmentMap, raw: &str) -> BootstrapResult<()> {
        if let Some(object) = parse_object(raw) {
            for (key, value) in flatten(&object) {
                env.set(env_var_name(&key), value);
            }
            return Ok(());
        }

        match self.config.others_policy {
            OthersPolicy::Lenient => {
                tracing::debug!("others secret is not a JSON object, using it verbatim");
                load_secret(env, OTHERS_KEY, raw);
                Ok(())
            }
            OthersPolicy::Strict => Err(BootstrapError::MalformedOthers {
                name: format!(
                    "{}{}{}",
                    self.config.prefix.trim_end_matches(PREFIX_SEPARATOR),
                    PREFIX_SEPARATOR,
                    OTHERS_KEY
                ),
                reason: object_error(raw),
            }),
        }
    }
}

/// Write one generic secret: flattened if it is a JSON object, raw otherwise.
fn load_secret(env: &mut EnvironmentMap, key: &str, raw: &str) {
    match SecretValue::parse(raw) {
        SecretValue::FlatObject(pairs) => {
            for (sub_key, value) in pairs {
                env.set(nested_env_var_name(key, &sub_key), value);
            }
        }
        SecretValue::Scalar(value) => env.set(env_var_name(key), value),
    }
}

fn object_error(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Err(err) => err.to_string(),
        Ok(_) => "expected a JSON object".to_string(),
    }
}
