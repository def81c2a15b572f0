//! Secrets providers.
//!
//! # Supported Providers
//!
//! - AWS Secrets Manager (via the AWS SDK)
//! - In-memory map, optionally loaded from a JSON fixture file

pub mod aws;
pub mod memory;

use crate::error::BootstrapResult;
use async_trait::async_trait;

pub use aws::AwsSecretsManager;
pub use memory::InMemoryProvider;

/// A secret as fetched from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretEntry {
    /// Provider-qualified name, e.g. `app_1/production/stripe`.
    pub name: String,
    /// Raw payload, possibly JSON.
    pub value: String,
}

/// The two calls the bootstrapper needs from a secrets store.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Names of every secret visible to the current credentials.
    ///
    /// `max_results` is the page size; implementations follow pagination
    /// until the listing is exhausted.
    async fn list_secrets(&self, max_results: i32) -> BootstrapResult<Vec<String>>;

    /// String payload of a secret, or `None` if it has no text payload.
    async fn get_secret_value(&self, name: &str) -> BootstrapResult<Option<String>>;
}
