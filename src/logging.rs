//! Log output for the CLI.
//!
//! Events go to stderr so that `export` output on stdout stays clean.
//! `RUST_LOG` overrides the default `secret_bootstrap=info` filter.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("secret_bootstrap=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
