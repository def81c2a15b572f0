//! AWS Secrets Manager provider.
//!
//! Credentials come from the standard AWS chain (env, profile, IMDS, ...).
//! The region is taken from the bootstrap configuration. Required IAM
//! actions: `secretsmanager:ListSecrets` on `*` and
//! `secretsmanager:GetSecretValue` on the prefixed secrets.

use crate::error::{BootstrapError, BootstrapResult};
use crate::provider::SecretsProvider;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueOutput;
use aws_sdk_secretsmanager::operation::list_secrets::ListSecretsOutput;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use aws_sdk_secretsmanager::Client;
use std::future::Future;

/// Secrets Manager client bound to one region.
#[derive(Debug, Clone)]
pub struct AwsSecretsManager {
    client: Client,
    name_filter: Option<String>,
}

impl AwsSecretsManager {
    /// Build a client for `region`, optionally against a custom endpoint
    /// (LocalStack and similar emulators).
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&shared_config);
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        Self::from_client(Client::from_conf(builder.build()))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            name_filter: None,
        }
    }

    /// Ask the service to pre-filter listings by name prefix.
    ///
    /// Callers still filter client-side; the service filter only reduces
    /// the number of pages.
    pub fn with_name_filter(mut self, prefix: impl Into<String>) -> Self {
        self.name_filter = Some(prefix.into());
        self
    }
}

#[async_trait]
impl SecretsProvider for AwsSecretsManager {
    async fn list_secrets(&self, max_results: i32) -> BootstrapResult<Vec<String>> {
        let names = collect_pages(|token| async move {
            let mut request = self
                .client
                .list_secrets()
                .max_results(max_results)
                .set_next_token(token);

            if let Some(prefix) = &self.name_filter {
                request = request.filters(
                    Filter::builder()
                        .key(FilterNameStringType::Name)
                        .values(prefix.clone())
                        .build(),
                );
            }

            request
                .send()
                .await
                .map_err(|err| BootstrapError::provider("list_secrets", DisplayErrorContext(err)))
        })
        .await?;

        tracing::debug!(count = names.len(), "listed secrets");
        Ok(names)
    }

    async fn get_secret_value(&self, name: &str) -> BootstrapResult<Option<String>> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|err| BootstrapError::provider("get_secret_value", DisplayErrorContext(err)))?;

        Ok(secret_text(&output))
    }
}

/// Follow `next_token` until the service stops returning one.
///
/// An empty token ends the listing like a missing one.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> BootstrapResult<Vec<String>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = BootstrapResult<ListSecretsOutput>>,
{
    let mut names = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = fetch_page(token.take()).await?;

        names.extend(
            page.secret_list()
                .iter()
                .filter_map(|entry| entry.name().map(str::to_string)),
        );

        match page.next_token() {
            Some(next) if !next.is_empty() => token = Some(next.to_string()),
            _ => break,
        }
    }

    Ok(names)
}

/// The text payload, or the binary payload when it is valid UTF-8.
fn secret_text(output: &GetSecretValueOutput) -> Option<String> {
    if let Some(text) = output.secret_string() {
        return Some(text.to_string());
    }

    output
        .secret_binary()
        .and_then(|blob| String::from_utf8(blob.as_ref().to_vec()).ok())
}
