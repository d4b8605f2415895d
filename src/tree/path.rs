//! Dotted key paths into a configuration tree.

use std::fmt;

/// A path from the root of a tree to one of its nodes.
///
/// Mapping keys are addressed by name, sequence elements by decimal index.
/// The empty path addresses the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The root path.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a dotted path (`model.layer.n_ssm`). The empty string is the root.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    /// Convert a config group (`model/layer`) into the package it populates.
    pub fn from_group(group: &str) -> Self {
        Self(
            group
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_keys(keys: Vec<String>) -> Self {
        Self(keys)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The path one level up, or `None` for the root.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// The first `len` keys of this path.
    pub fn prefix(&self, len: usize) -> KeyPath {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// A new path with `key` appended.
    pub fn child(&self, key: impl Into<String>) -> KeyPath {
        let mut path = self.clone();
        path.push(key);
        path
    }

    /// A new path with every key of `other` appended.
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut keys = self.0.clone();
        keys.extend(other.0.iter().cloned());
        Self(keys)
    }

    /// True if every key is non-empty. The root is well formed.
    pub fn is_well_formed(&self) -> bool {
        self.0.iter().all(|key| !key.is_empty())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        write!(f, "{}", self.0.join("."))
    }
}
