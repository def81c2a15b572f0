//! In-memory secrets provider.
//!
//! Used for offline runs (`--fixture secrets.json`) and tests. Fixture files
//! are a JSON object mapping full secret names to payloads. String payloads
//! are used as-is; any other JSON value is stored as its JSON text, so a
//! structured secret can be written inline:
//!
//! ```json
//! {
//!   "app_1/development/database": {"username": "u", "password": "p", "host": "localhost", "port": 5432, "dbname": "app"},
//!   "app_1/development/plain": "hello"
//! }
//! ```

use crate::error::{BootstrapError, BootstrapResult};
use crate::provider::SecretsProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryProvider {
    secrets: BTreeMap<String, String>,
    fail_with: Option<String>,
    fail_on: Option<&'static str>,
    calls: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new(secrets: BTreeMap<String, String>) -> Self {
        Self {
            secrets,
            ..Self::default()
        }
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Load a JSON fixture file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read fixture file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse fixture file: {:?}", path.as_ref()))
    }

    /// Parse fixture JSON.
    pub fn from_json(content: &str) -> Result<Self> {
        let json: serde_json::Value =
            serde_json::from_str(content).context("Fixture is not valid JSON")?;

        let object = json
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("Fixture must be a JSON object of secret names to values"))?;

        let secrets = object
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect();

        Ok(Self::new(secrets))
    }

    /// Make every call fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    /// Keep the secrets but fail every `operation` call with `message`.
    ///
    /// Other operations keep working, so a listing can succeed and the
    /// fetch that follows it fail.
    pub fn failing_on(self, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            fail_on: Some(operation),
            ..self
        }
    }

    /// Number of provider calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self, operation: &'static str) -> BootstrapResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (&self.fail_with, self.fail_on) {
            (Some(message), None) => Err(BootstrapError::provider(operation, message)),
            (Some(message), Some(only)) if only == operation => {
                Err(BootstrapError::provider(operation, message))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl SecretsProvider for InMemoryProvider {
    async fn list_secrets(&self, max_results: i32) -> BootstrapResult<Vec<String>> {
        self.record_call("list_secrets")?;
        tracing::debug!(max_results, "listing in-memory secrets");
        Ok(self.secrets.keys().cloned().collect())
    }

    async fn get_secret_value(&self, name: &str) -> BootstrapResult<Option<String>> {
        self.record_call("get_secret_value")?;
        Ok(self.secrets.get(name).cloned())
    }
}
