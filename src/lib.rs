//! Secret Bootstrap - load secrets into the environment before an application starts.
//!
//! Secrets stored in AWS Secrets Manager under a prefix such as
//! `app_1/production/` are fetched once and turned into environment
//! variables. JSON secrets are flattened one level deep, a `database` secret
//! becomes a connection URL, and an `others` secret holds plain top-level
//! variables.
//!
//! # Example
//!
//! ```no_run
//! use secret_bootstrap::config::BootstrapConfig;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = BootstrapConfig::from_env()?;
//! let env = secret_bootstrap::load(&config).await?.into_environment();
//! env.apply()?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod config;
pub mod environment;
pub mod error;
pub mod logging;
pub mod naming;
pub mod provider;
pub mod value;

pub use bootstrap::{Bootstrapper, Outcome};
pub use config::BootstrapConfig;
pub use environment::EnvironmentMap;
pub use error::{BootstrapError, BootstrapResult};

use provider::AwsSecretsManager;

/// Run the bootstrap pass against AWS Secrets Manager.
///
/// No client is built when the disable flag is set or no region is
/// configured.
pub async fn load(config: &BootstrapConfig) -> BootstrapResult<Outcome> {
    let bootstrapper = Bootstrapper::new(config);
    if let Some(outcome) = bootstrapper.guard() {
        return Ok(outcome);
    }

    let region = config.region.as_deref().unwrap_or_default();
    let provider = AwsSecretsManager::connect(region, config.endpoint_url.as_deref())
        .await
        .with_name_filter(config.prefix.as_str());

    bootstrapper.run(&provider).await
}
