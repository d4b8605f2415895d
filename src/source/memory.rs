//! In-memory fragments, for hosts that embed their configs and for tests.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::source::FragmentSource;

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fragments: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(name, text);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.fragments.insert(name.into(), text.into());
    }
}

impl FragmentSource for MemorySource {
    fn read(&self, name: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.fragments.get(name).cloned())
    }

    fn describe(&self) -> String {
        format!("memory ({} fragments)", self.fragments.len())
    }
}
