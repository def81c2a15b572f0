//! Secret payload parsing.
//!
//! Secret values are stored either as plain strings or as flat JSON
//! objects. [`SecretValue::parse`] makes the single parse attempt and the
//! rest of the crate works with the resulting variant.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parsed form of a secret payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretValue {
    /// Opaque string, used verbatim.
    Scalar(String),
    /// One level of key/value pairs. Nested values are kept as JSON text.
    FlatObject(BTreeMap<String, String>),
}

impl SecretValue {
    /// Parse a raw payload.
    ///
    /// Only a JSON object becomes [`SecretValue::FlatObject`]. Invalid JSON
    /// and JSON that is not an object (numbers, arrays, quoted strings) are
    /// returned unchanged as [`SecretValue::Scalar`].
    pub fn parse(raw: &str) -> Self {
        match parse_object(raw) {
            Some(object) => SecretValue::FlatObject(flatten(&object)),
            None => SecretValue::Scalar(raw.to_string()),
        }
    }
}

/// Parse `raw` as a JSON object, or `None` if it is anything else.
pub(crate) fn parse_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// Flatten one level of a JSON object into string values.
pub(crate) fn flatten(object: &Map<String, Value>) -> BTreeMap<String, String> {
    object
        .iter()
        .map(|(key, value)| (key.clone(), scalar_to_string(value)))
        .collect()
}

/// Render a JSON value as an environment variable value.
///
/// Strings are unquoted, `null` is empty, everything else is compact JSON.
pub(crate) fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Build a connection URL from a `database` secret.
///
/// The secret is expected to be a JSON object with `username`, `password`,
/// `host`, `port` and `dbname` (the shape RDS-managed secrets use). Fields are
/// concatenated as-is without percent-encoding; a missing field leaves an
/// empty segment. Returns `None` if `raw` is not a JSON object, in which case
/// callers use `raw` itself as the URL.
///
/// ```
/// use secret_bootstrap::value::database_url;
///
/// let raw = r#"{"username":"u","password":"p","host":"h","port":5432,"dbname":"d"}"#;
/// assert_eq!(database_url(raw, "postgres").as_deref(), Some("postgres://u:p@h:5432/d"));
/// assert_eq!(database_url("postgres://already/a/url", "postgres"), None);
/// ```
pub fn database_url(raw: &str, scheme: &str) -> Option<String> {
    let object = parse_object(raw)?;
    let field = |name: &str| object.get(name).map(scalar_to_string).unwrap_or_default();

    Some(format!(
        "{}://{}:{}@{}:{}/{}",
        scheme,
        field("username"),
        field("password"),
        field("host"),
        field("port"),
        field("dbname"),
    ))
}
