//! Integration tests for the bootstrap pass.
//!
//! These tests drive the whole pipeline (config, provider, derivation)
//! against the in-memory provider, without AWS credentials.

mod common;

use common::{database_secret, fixture_json, TestContext, PREFIX};
use secret_bootstrap::config::{BootstrapConfig, FileConfig, OthersPolicy};
use secret_bootstrap::provider::InMemoryProvider;
use secret_bootstrap::{BootstrapError, Bootstrapper, EnvironmentMap, Outcome};
use std::collections::HashMap;
use tokio_test::block_on;

fn config_from(vars: &[(&str, &str)]) -> BootstrapConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    BootstrapConfig::from_lookup(FileConfig::default(), |key| vars.get(key).cloned()).unwrap()
}

fn test_config() -> BootstrapConfig {
    config_from(&[("AWS_REGION", "us-east-1"), ("RAILS_ENV", "test")])
}

fn run(config: &BootstrapConfig, secrets: &[(&str, &str)]) -> Result<EnvironmentMap, BootstrapError> {
    let provider = InMemoryProvider::from_json(&fixture_json(secrets)).unwrap();
    block_on(Bootstrapper::new(config).run(&provider)).map(Outcome::into_environment)
}

#[test]
fn test_default_prefix_matches_fixture_prefix() {
    assert_eq!(test_config().prefix, PREFIX);
}

#[test]
fn test_database_json_becomes_url() {
    let env = run(&test_config(), &[("database", database_secret())]).unwrap();

    assert_eq!(env.get("DATABASE_URL"), Some("postgres://u:p@h:5432/d"));
}

#[test]
fn test_database_raw_value_is_kept() {
    let env = run(&test_config(), &[("database", "raw-conn-string")]).unwrap();

    assert_eq!(env.get("DATABASE_URL"), Some("raw-conn-string"));
}

#[test]
fn test_database_url_env_is_converted_without_database_secret() {
    let config = config_from(&[
        ("AWS_REGION", "us-east-1"),
        ("RAILS_ENV", "test"),
        ("DATABASE_URL", database_secret()),
    ]);

    let env = run(&config, &[("plain", "hello")]).unwrap();

    assert_eq!(env.get("DATABASE_URL"), Some("postgres://u:p@h:5432/d"));
    assert_eq!(env.get("PLAIN"), Some("hello"));
}

#[test]
fn test_others_pairs_become_top_level_variables() {
    let env = run(&test_config(), &[("others", r#"{"foo_bar":"1"}"#)]).unwrap();

    assert_eq!(env.get("FOO_BAR"), Some("1"));
    assert_eq!(env.len(), 1);
}

#[test]
fn test_invalid_others_fails_the_bootstrap() {
    let err = run(&test_config(), &[("others", "{not json"), ("plain", "hello")]).unwrap_err();

    assert!(matches!(err, BootstrapError::MalformedOthers { .. }));
    assert!(err.to_string().contains("app_1/test/others"));
}

#[test]
fn test_invalid_others_with_lenient_policy() {
    let config = config_from(&[
        ("AWS_REGION", "us-east-1"),
        ("RAILS_ENV", "test"),
        ("AWS_SECRETS_OTHERS_POLICY", "lenient"),
    ]);
    assert_eq!(config.others_policy, OthersPolicy::Lenient);

    let env = run(&config, &[("others", "{not json"), ("plain", "hello")]).unwrap();

    assert_eq!(env.get("OTHERS"), Some("{not json"));
    assert_eq!(env.get("PLAIN"), Some("hello"));
}

#[test]
fn test_generic_json_object_is_flattened() {
    let env = run(&test_config(), &[("feature", r#"{"x":"1","y":"2"}"#)]).unwrap();

    assert_eq!(env.get("FEATURE_X"), Some("1"));
    assert_eq!(env.get("FEATURE_Y"), Some("2"));
    assert!(!env.contains("FEATURE"));
}

#[test]
fn test_generic_plain_value_is_written_raw() {
    let env = run(&test_config(), &[("plain", "hello")]).unwrap();

    assert_eq!(env.get("PLAIN"), Some("hello"));
}

#[test]
fn test_names_are_normalized() {
    let env = run(
        &test_config(),
        &[
            ("stripeKeys", r#"{"publishableKey":"pk","secretKey":"sk"}"#),
            ("sentry-dsn", "https://dsn"),
        ],
    )
    .unwrap();

    assert_eq!(env.get("STRIPE_KEYS_PUBLISHABLE_KEY"), Some("pk"));
    assert_eq!(env.get("STRIPE_KEYS_SECRET_KEY"), Some("sk"));
    assert_eq!(env.get("SENTRY_DSN"), Some("https://dsn"));
}

#[test]
fn test_every_key_is_uppercase() {
    let env = run(
        &test_config(),
        &[
            ("database", database_secret()),
            ("others", r#"{"lower_case":"1","camelCase":"2"}"#),
            ("feature", r#"{"x":"1"}"#),
            ("plain", "hello"),
        ],
    )
    .unwrap();

    for name in env.names() {
        assert_eq!(name, name.to_ascii_uppercase());
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}

#[test]
fn test_disabled_makes_no_provider_calls() {
    let config = config_from(&[
        ("AWS_REGION", "us-east-1"),
        ("RAILS_ENV", "test"),
        ("DISABLE_AWS_SECRETS", "1"),
    ]);
    let provider = InMemoryProvider::from_json(&fixture_json(&[("plain", "hello")])).unwrap();

    let outcome = block_on(Bootstrapper::new(&config).run(&provider)).unwrap();

    assert_eq!(outcome, Outcome::Disabled);
    assert!(outcome.into_environment().is_empty());
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_disable_flag_set_to_false_still_disables() {
    for value in ["false", "0", ""] {
        let config = config_from(&[
            ("AWS_REGION", "us-east-1"),
            ("RAILS_ENV", "test"),
            ("DISABLE_AWS_SECRETS", value),
        ]);
        let provider = InMemoryProvider::from_json(&fixture_json(&[("plain", "hello")])).unwrap();

        let outcome = block_on(Bootstrapper::new(&config).run(&provider)).unwrap();

        assert_eq!(outcome, Outcome::Disabled, "DISABLE_AWS_SECRETS={:?}", value);
        assert_eq!(provider.calls(), 0);
    }
}

#[test]
fn test_missing_region_makes_no_provider_calls() {
    let config = config_from(&[("RAILS_ENV", "test")]);
    let provider = InMemoryProvider::from_json(&fixture_json(&[("plain", "hello")])).unwrap();

    let outcome = block_on(Bootstrapper::new(&config).run(&provider)).unwrap();

    assert_eq!(outcome, Outcome::NoRegion);
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_missing_region_skips_aws_entirely() {
    let config = config_from(&[("RAILS_ENV", "test")]);

    let outcome = block_on(secret_bootstrap::load(&config)).unwrap();

    assert_eq!(outcome, Outcome::NoRegion);
}

#[test]
fn test_provider_failure_is_fatal() {
    let provider = InMemoryProvider::failing("AccessDeniedException");

    let err = block_on(Bootstrapper::new(&test_config()).run(&provider)).unwrap_err();

    assert!(err.to_string().contains("AccessDeniedException"));
}

#[test]
fn test_secret_fetch_failure_is_fatal() {
    let provider = InMemoryProvider::from_pairs([
        (format!("{}/plain", PREFIX), "hello".to_string()),
        (format!("{}/database", PREFIX), database_secret().to_string()),
    ])
    .failing_on("get_secret_value", "ResourceNotFoundException");

    let err = block_on(Bootstrapper::new(&test_config()).run(&provider)).unwrap_err();

    match err {
        BootstrapError::Provider { operation, message } => {
            assert_eq!(operation, "get_secret_value");
            assert!(message.contains("ResourceNotFoundException"));
        }
        other => panic!("expected a provider error, got {:?}", other),
    }
    assert!(provider.calls() >= 2);
}

#[test]
fn test_fixture_file_round_trip_through_bootstrap() {
    let ctx = TestContext::new().unwrap();
    let path = ctx
        .create_fixture("secrets.json", &[("plain", "hello"), ("database", database_secret())])
        .unwrap();

    let provider = InMemoryProvider::from_file(&path).unwrap();
    let env = block_on(Bootstrapper::new(&test_config()).run(&provider))
        .unwrap()
        .into_environment();

    assert_eq!(env.get("PLAIN"), Some("hello"));
    assert_eq!(env.get("DATABASE_URL"), Some("postgres://u:p@h:5432/d"));
}

#[test]
fn test_yaml_config_file_with_env_override() {
    let ctx = TestContext::new().unwrap();
    let path = ctx
        .create_file(
            "secret-bootstrap.yaml",
            "app_name: billing\nruntime_env: qa\ndatabase_var: PRIMARY_DATABASE_URL\ndatabase_scheme: postgresql\n",
        )
        .unwrap();

    let file = FileConfig::from_file(&path).unwrap();
    let config = BootstrapConfig::from_lookup(file, |key| match key {
        "AWS_REGION" => Some("eu-west-1".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.prefix, "billing/qa");

    let provider = InMemoryProvider::from_pairs([("billing/qa/database", database_secret())]);
    let env = block_on(Bootstrapper::new(&config).run(&provider))
        .unwrap()
        .into_environment();

    assert_eq!(
        env.get("PRIMARY_DATABASE_URL"),
        Some("postgresql://u:p@h:5432/d")
    );
    assert!(!env.contains("DATABASE_URL"));
}
