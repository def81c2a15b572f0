//! Common testing utilities for Secret Bootstrap integration tests.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

/// Prefix used by every fixture in the integration tests.
#[allow(dead_code)]
pub const PREFIX: &str = "app_1/test";

/// Test context that manages temporary files and directories.
pub struct TestContext {
    /// Path to temporary directory
    pub temp_path: PathBuf,
    /// The temporary directory (kept to prevent early deletion)
    _temp_dir: TempDir,
}

impl TestContext {
    /// Create a new test context with a temporary directory.
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = TempDir::new()?;
        let temp_path = temp_dir.path().to_path_buf();

        Ok(Self {
            temp_path,
            _temp_dir: temp_dir,
        })
    }

    /// Create a test file with content.
    pub fn create_file(&self, name: &str, content: &str) -> anyhow::Result<PathBuf> {
        let file_path = self.temp_path.join(name);
        let mut file = fs::File::create(&file_path)?;
        file.write_all(content.as_bytes())?;
        Ok(file_path)
    }

    /// Create a secrets fixture from `(short_name, raw_value)` pairs, all
    /// placed under [`PREFIX`].
    #[allow(dead_code)]
    pub fn create_fixture(
        &self,
        name: &str,
        secrets: &[(impl AsRef<str>, impl AsRef<str>)],
    ) -> anyhow::Result<PathBuf> {
        let content = fixture_json(secrets);
        self.create_file(name, &content)
    }
}

/// Fixture JSON with every short name placed under [`PREFIX`].
#[allow(dead_code)]
pub fn fixture_json(secrets: &[(impl AsRef<str>, impl AsRef<str>)]) -> String {
    let mut data = serde_json::Map::new();
    for (key, value) in secrets {
        data.insert(
            format!("{}/{}", PREFIX, key.as_ref()),
            serde_json::json!(value.as_ref()),
        );
    }

    serde_json::to_string_pretty(&data).unwrap()
}

/// Raw `database` secret in the shape RDS writes it.
#[allow(dead_code)]
pub fn database_secret() -> &'static str {
    r#"{"username":"u","password":"p","host":"h","port":"5432","dbname":"d"}"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_json_prefixes_names() {
        let json: serde_json::Value =
            serde_json::from_str(&fixture_json(&[("plain", "hello")])).unwrap();

        assert_eq!(json["app_1/test/plain"], "hello");
    }

    #[test]
    fn test_test_context_create_file() {
        let ctx = TestContext::new().unwrap();
        let file_path = ctx.create_file("test.txt", "Hello, World!").unwrap();

        assert!(file_path.exists());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "Hello, World!");
    }
}
