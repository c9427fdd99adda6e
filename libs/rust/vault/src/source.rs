//! Read-only configuration sources.
//!
//! Keys are hierarchical and `:`-separated (`Vault:Address`). Each source maps
//! that key onto its own storage: environment variables use `__` as the
//! separator, JSON files use nested objects.

use crate::error::{VaultError, VaultResult};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// A read-only lookup of configuration values.
pub trait ConfigSource: Send + Sync {
    /// Value for `key`, if the source defines it.
    fn get(&self, key: &str) -> Option<String>;
}

/// Environment variable name for a hierarchical key.
///
/// `Vault:RoleId` becomes `VAULT__ROLEID`.
#[must_use]
pub fn env_key(key: &str) -> String {
    key.split(':')
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join("__")
}

/// Reads keys from the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(env_key(key)).ok()
    }
}

/// Reads keys from a JSON settings document.
#[derive(Debug, Default, Clone)]
pub struct JsonFileSource {
    root: Value,
}

impl JsonFileSource {
    /// Load `path`. A missing file yields an empty source.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not valid JSON or cannot be read.
    pub fn load(path: impl AsRef<Path>) -> VaultResult<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(VaultError::invalid_config(format!(
                "cannot read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not valid JSON.
    pub fn parse(text: &str) -> VaultResult<Self> {
        let root = serde_json::from_str(text)?;
        Ok(Self { root })
    }
}

impl ConfigSource for JsonFileSource {
    fn get(&self, key: &str) -> Option<String> {
        let node = key
            .split(':')
            .try_fold(&self.root, |node, segment| node.get(segment))?;

        match node {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// In-memory source.
#[derive(Debug, Default, Clone)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Stack of sources; later layers override earlier ones.
#[derive(Default)]
pub struct LayeredSource {
    layers: Vec<Box<dyn ConfigSource>>,
}

impl LayeredSource {
    /// Create an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a layer on top.
    #[must_use]
    pub fn layer(mut self, source: impl ConfigSource + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }
}

impl ConfigSource for LayeredSource {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_mapping() {
        assert_eq!(env_key("Vault:Address"), "VAULT__ADDRESS");
        assert_eq!(env_key("Vault:DefaultToken"), "VAULT__DEFAULTTOKEN");
    }

    #[test]
    fn test_json_nested_lookup() {
        let source = JsonFileSource::parse(
            r#"{"Vault": {"Address": "http://vault:8200", "RenewIntervalSecs": 30, "Nested": {}}}"#,
        )
        .unwrap();

        assert_eq!(source.get("Vault:Address").as_deref(), Some("http://vault:8200"));
        assert_eq!(source.get("Vault:RenewIntervalSecs").as_deref(), Some("30"));
        assert_eq!(source.get("Vault:Nested"), None);
        assert_eq!(source.get("Vault:RoleId"), None);
    }

    #[test]
    fn test_missing_json_file_is_empty() {
        let source = JsonFileSource::load("/nonexistent/appsettings.json").unwrap();
        assert_eq!(source.get("Vault:Address"), None);
    }

    #[test]
    fn test_later_layer_wins() {
        let source = LayeredSource::new()
            .layer(MapSource::new().with("Vault:Address", "http://file:8200").with("Vault:RoleId", "role"))
            .layer(MapSource::new().with("Vault:Address", "http://env:8200"));

        assert_eq!(source.get("Vault:Address").as_deref(), Some("http://env:8200"));
        assert_eq!(source.get("Vault:RoleId").as_deref(), Some("role"));
        assert_eq!(source.get("Vault:DefaultToken"), None);
    }
}
