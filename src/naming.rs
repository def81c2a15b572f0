//! Secret name handling: prefix stripping and environment variable naming.
//!
//! Secret names look like `app_1/production/stripe`. The prefix
//! (`app_1/production`) and the `/` separator are removed to get the short
//! key (`stripe`), which is then turned into an environment variable name
//! (`STRIPE`).

/// Separator between the prefix and the short key in a secret name.
pub const PREFIX_SEPARATOR: char = '/';

/// Strip `prefix` and the separator from a secret name.
///
/// Returns `None` when the name is not under the prefix, or when nothing
/// remains after stripping (a secret named exactly like the prefix).
///
/// # Example
///
/// ```
/// use secret_bootstrap::naming::strip_prefix;
///
/// assert_eq!(strip_prefix("app_1/production/stripe", "app_1/production"), Some("stripe"));
/// assert_eq!(strip_prefix("app_1/staging/stripe", "app_1/production"), None);
/// ```
pub fn strip_prefix<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let prefix = prefix.trim_end_matches(PREFIX_SEPARATOR);
    let rest = name.strip_prefix(prefix)?.strip_prefix(PREFIX_SEPARATOR)?;

    if rest.is_empty() {
        None
    } else {
        Some(rest)
    }
}

/// Normalize a key into an environment variable name.
///
/// camelCase and acronym boundaries become underscores, `-` and any other
/// character outside `[A-Za-z0-9_]` become `_`, and the result is
/// uppercased.
///
/// ```
/// use secret_bootstrap::naming::env_var_name;
///
/// assert_eq!(env_var_name("fooBar"), "FOO_BAR");
/// assert_eq!(env_var_name("HTTPServer"), "HTTP_SERVER");
/// assert_eq!(env_var_name("stripe-keys"), "STRIPE_KEYS");
/// ```
pub fn env_var_name(key: &str) -> String {
    let key = key.replace("::", "/");
    let chars: Vec<char> = key.chars().collect();
    let mut name = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();

            let after_lower = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let acronym_end = prev.is_ascii_uppercase()
                && next.map(|n| n.is_ascii_lowercase()).unwrap_or(false);

            if after_lower || acronym_end {
                name.push('_');
            }
        }

        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_uppercase());
        } else {
            name.push('_');
        }
    }

    name
}

/// Name of a flattened sub-key: `{parent}_{child}`, normalized as a whole.
pub fn nested_env_var_name(parent: &str, child: &str) -> String {
    env_var_name(&format!("{}_{}", parent, child))
}
