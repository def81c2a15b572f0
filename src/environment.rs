//! Derived environment variables.
//!
//! The bootstrapper never touches the process environment while it talks to
//! the secrets provider. It fills an [`EnvironmentMap`] instead, and the
//! caller applies it once, before anything else reads the environment.

use anyhow::Result;
use std::collections::BTreeMap;

/// Environment variables derived from secrets, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentMap {
    vars: BTreeMap<String, String>,
}

impl EnvironmentMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any earlier value.
    ///
    /// Logs the variable name (never the value).
    pub fn set(&mut self, name: String, value: String) {
        tracing::info!(var = %name, "loaded env var");
        self.vars.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variable names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Write every variable into the current process environment.
    ///
    /// Must run before other threads are started: the process environment
    /// is not synchronized. Fails without setting anything if a name is
    /// empty or contains `=` or NUL, or a value contains NUL.
    pub fn apply(&self) -> Result<()> {
        for (name, value) in &self.vars {
            if name.is_empty() || name.contains(|c: char| c == '=' || c == '\0') {
                anyhow::bail!(
                    "Cannot set environment variable '{}': names cannot be empty or contain '=' or NUL",
                    name.escape_debug()
                );
            }
            if value.contains('\0') {
                anyhow::bail!("Cannot set environment variable {}: value contains a NUL byte", name);
            }
        }

        for (name, value) in &self.vars {
            std::env::set_var(name, value);
        }
        tracing::debug!(count = self.vars.len(), "applied variables to process environment");
        Ok(())
    }

    /// Render as POSIX shell `export` statements, one per line.
    ///
    /// ```
    /// use secret_bootstrap::environment::EnvironmentMap;
    ///
    /// let mut env = EnvironmentMap::new();
    /// env.set("GREETING".to_string(), "it's me".to_string());
    /// assert_eq!(env.to_shell_exports(), "export GREETING='it'\\''s me'\n");
    /// ```
    pub fn to_shell_exports(&self) -> String {
        self.vars
            .iter()
            .map(|(name, value)| format!("export {}={}\n", name, shell_quote(value)))
            .collect()
    }
}

/// Single-quote a value for POSIX shells.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
