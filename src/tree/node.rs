//! The configuration value type.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::tree::path::KeyPath;
use crate::tree::reference::Reference;

/// Keys of a mapping node, kept in sorted order so output is deterministic.
pub type Mapping = BTreeMap<String, ConfigNode>;

/// A numeric scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Number::Int(i) => Some(i),
            Number::Float(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// A node of a configuration tree.
///
/// The set of variants is closed: merge and resolution match on every case.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigNode {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Sequence(Vec<ConfigNode>),
    Mapping(Mapping),
    /// A value still waiting for `${...}` substitution.
    Reference(Reference),
}

impl Default for ConfigNode {
    fn default() -> Self {
        ConfigNode::empty_mapping()
    }
}

impl ConfigNode {
    pub fn empty_mapping() -> Self {
        ConfigNode::Mapping(Mapping::new())
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigNode::Null => "null",
            ConfigNode::Bool(_) => "bool",
            ConfigNode::Number(_) => "number",
            ConfigNode::String(_) => "string",
            ConfigNode::Sequence(_) => "sequence",
            ConfigNode::Mapping(_) => "mapping",
            ConfigNode::Reference(_) => "reference",
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, ConfigNode::Mapping(_))
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            ConfigNode::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            ConfigNode::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigNode::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigNode::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigNode::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::String(s) => Some(s),
            _ => None,
        }
    }

    /// True if no reference remains anywhere in this subtree.
    pub fn is_resolved(&self) -> bool {
        match self {
            ConfigNode::Reference(_) => false,
            ConfigNode::Sequence(items) => items.iter().all(ConfigNode::is_resolved),
            ConfigNode::Mapping(map) => map.values().all(ConfigNode::is_resolved),
            _ => true,
        }
    }

    /// Direct child by mapping key or sequence index.
    pub fn child(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Mapping(map) => map.get(key),
            ConfigNode::Sequence(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut ConfigNode> {
        match self {
            ConfigNode::Mapping(map) => map.get_mut(key),
            ConfigNode::Sequence(items) => {
                key.parse::<usize>().ok().and_then(move |i| items.get_mut(i))
            }
            _ => None,
        }
    }

    /// Node at `path`, if every step exists.
    pub fn get(&self, path: &KeyPath) -> Option<&ConfigNode> {
        path.iter().try_fold(self, |node, key| node.child(key))
    }

    pub fn get_mut(&mut self, path: &KeyPath) -> Option<&mut ConfigNode> {
        path.iter().try_fold(self, |node, key| node.child_mut(key))
    }

    /// Every reference in this subtree with its location, in key order.
    pub fn references(&self) -> Vec<(KeyPath, Reference)> {
        let mut found = Vec::new();
        let mut at = KeyPath::root();
        self.collect_references(&mut at, &mut found);
        found
    }

    fn collect_references(&self, at: &mut KeyPath, found: &mut Vec<(KeyPath, Reference)>) {
        match self {
            ConfigNode::Reference(reference) => found.push((at.clone(), reference.clone())),
            ConfigNode::Sequence(items) => {
                for (i, item) in items.iter().enumerate() {
                    at.push(i.to_string());
                    item.collect_references(at, found);
                    at.pop();
                }
            }
            ConfigNode::Mapping(map) => {
                for (key, value) in map {
                    at.push(key.clone());
                    value.collect_references(at, found);
                    at.pop();
                }
            }
            _ => {}
        }
    }

    /// Text of a scalar as it appears when embedded in a string.
    /// Containers and unresolved values have no such text.
    pub fn render_scalar(&self) -> Option<String> {
        match self {
            ConfigNode::Null => Some("null".to_string()),
            ConfigNode::Bool(b) => Some(b.to_string()),
            ConfigNode::Number(n) => Some(n.to_string()),
            ConfigNode::String(s) => Some(s.clone()),
            ConfigNode::Sequence(_) | ConfigNode::Mapping(_) | ConfigNode::Reference(_) => None,
        }
    }
}

impl From<bool> for ConfigNode {
    fn from(b: bool) -> Self {
        ConfigNode::Bool(b)
    }
}

impl From<i64> for ConfigNode {
    fn from(i: i64) -> Self {
        ConfigNode::Number(Number::Int(i))
    }
}

impl From<f64> for ConfigNode {
    fn from(f: f64) -> Self {
        ConfigNode::Number(Number::Float(f))
    }
}

impl From<&str> for ConfigNode {
    fn from(s: &str) -> Self {
        ConfigNode::String(s.to_string())
    }
}

impl From<Mapping> for ConfigNode {
    fn from(map: Mapping) -> Self {
        ConfigNode::Mapping(map)
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ConfigNode::Null => serializer.serialize_unit(),
            ConfigNode::Bool(b) => serializer.serialize_bool(*b),
            ConfigNode::Number(Number::Int(i)) => serializer.serialize_i64(*i),
            ConfigNode::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            ConfigNode::String(s) => serializer.serialize_str(s),
            ConfigNode::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigNode::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
            // Unresolved trees render their tokens verbatim.
            ConfigNode::Reference(reference) => serializer.serialize_str(reference.source()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::yaml::parse_document;

    #[test]
    fn test_get_by_path() {
        let tree = parse_document("t", "model:\n  layer:\n    d_state: 64\n  tags: [a, b]\n").unwrap();
        assert_eq!(
            tree.get(&KeyPath::parse("model.layer.d_state")).and_then(ConfigNode::as_i64),
            Some(64)
        );
        assert_eq!(
            tree.get(&KeyPath::parse("model.tags.1")).and_then(ConfigNode::as_str),
            Some("b")
        );
        assert!(tree.get(&KeyPath::parse("model.missing")).is_none());
        assert!(tree.get(&KeyPath::parse("model.layer.d_state.deeper")).is_none());
    }

    #[test]
    fn test_references_are_collected_with_locations() {
        let tree = parse_document(
            "t",
            "model:\n  d_model: 128\n  layer:\n    n_ssm: ${..d_model}\nname: run_${train.seed}\n",
        )
        .unwrap();
        assert!(!tree.is_resolved());

        let refs = tree.references();
        let locations: Vec<String> = refs.iter().map(|(at, _)| at.to_string()).collect();
        assert_eq!(locations, vec!["model.layer.n_ssm", "name"]);
    }

    #[test]
    fn test_number_accessors() {
        assert_eq!(ConfigNode::from(3i64).as_f64(), Some(3.0));
        assert_eq!(ConfigNode::from(0.5).as_i64(), None);
        assert_eq!(ConfigNode::from(0.5).render_scalar().as_deref(), Some("0.5"));
        assert_eq!(ConfigNode::empty_mapping().render_scalar(), None);
    }
}
