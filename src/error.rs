use thiserror::Error;

/// Fatal bootstrap failures.
///
/// Malformed `database` and generic secrets are not errors: their raw value
/// is used instead.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The secrets provider call failed.
    #[error("secrets provider {operation} failed: {message}")]
    Provider {
        operation: &'static str,
        message: String,
    },

    /// The `others` secret is not a JSON object.
    #[error("secret `{name}` must be a JSON object of key/value pairs: {reason}")]
    MalformedOthers { name: String, reason: String },
}

impl BootstrapError {
    pub fn provider(operation: &'static str, err: impl std::fmt::Display) -> Self {
        BootstrapError::Provider {
            operation,
            message: err.to_string(),
        }
    }
}

pub type BootstrapResult<T> = std::result::Result<T, BootstrapError>;
