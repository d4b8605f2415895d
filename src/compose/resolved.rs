//! The frozen result of a composition.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

use crate::error::ConfigError;
use crate::tree::{ConfigNode, KeyPath};

/// A fully merged configuration with every reference substituted.
///
/// There is no mutating API; clones share the same tree.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    root: Arc<ConfigNode>,
    fragments: Arc<[String]>,
}

impl ResolvedConfig {
    pub(crate) fn freeze(root: ConfigNode, fragments: Vec<String>) -> Self {
        debug_assert!(root.is_resolved(), "frozen tree still holds references");
        Self {
            root: Arc::new(root),
            fragments: fragments.into(),
        }
    }

    pub fn root(&self) -> &ConfigNode {
        &self.root
    }

    /// Fragments that contributed, in the order they were loaded.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Node at a dotted path (`model.layer.n_ssm`).
    pub fn get(&self, path: &str) -> Option<&ConfigNode> {
        self.root.get(&KeyPath::parse(path))
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(ConfigNode::as_bool)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(ConfigNode::as_i64)
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(ConfigNode::as_f64)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(ConfigNode::as_str)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self.root.as_ref()).map_err(|e| ConfigError::Render(e.to_string()))
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ConfigError> {
        serde_json::to_value(self.root.as_ref()).map_err(|e| ConfigError::Render(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self.root.as_ref())
            .map_err(|e| ConfigError::Render(e.to_string()))
    }

    /// Deserialize the tree, or the subtree at `path`, into a host type.
    pub fn deserialize<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConfigError> {
        let node = self
            .get(path)
            .ok_or_else(|| ConfigError::Render(format!("no value at `{}`", path)))?;
        let value = serde_json::to_value(node).map_err(|e| ConfigError::Render(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| ConfigError::Render(format!("`{}`: {}", path, e)))
    }
}

impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::yaml::parse_document;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Loader {
        batch_size: usize,
        num_workers: usize,
    }

    fn resolved(text: &str) -> ResolvedConfig {
        ResolvedConfig::freeze(parse_document("t", text).unwrap(), vec!["t".to_string()])
    }

    #[test]
    fn test_typed_getters() {
        let config = resolved("loader:\n  batch_size: 50\noptimizer:\n  lr: 0.01\n  fused: true\n");
        assert_eq!(config.get_i64("loader.batch_size"), Some(50));
        assert_eq!(config.get_f64("loader.batch_size"), Some(50.0));
        assert_eq!(config.get_f64("optimizer.lr"), Some(0.01));
        assert_eq!(config.get_bool("optimizer.fused"), Some(true));
        assert_eq!(config.get_str("optimizer.lr"), None);
        assert_eq!(config.fragments().to_vec(), vec!["t".to_string()]);
    }

    #[test]
    fn test_deserialize_subtree() {
        let config = resolved("loader:\n  batch_size: 50\n  num_workers: 4\n");
        let loader: Loader = config.deserialize("loader").unwrap();
        assert_eq!(loader, Loader { batch_size: 50, num_workers: 4 });
        assert!(config.deserialize::<Loader>("missing").is_err());
    }

    #[test]
    fn test_render() {
        let config = resolved("trainer:\n  max_epochs: 40\n");
        assert_eq!(config.to_yaml().unwrap(), "trainer:\n  max_epochs: 40\n");
        assert_eq!(
            config.to_json().unwrap(),
            serde_json::json!({ "trainer": { "max_epochs": 40 } })
        );
    }
}
