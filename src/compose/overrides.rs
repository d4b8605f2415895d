//! Command-line overrides.
//!
//! `model.d_model=256` sets a value after every fragment has been applied.
//! `scheduler=plateau` (or `model/layer=s4d`) changes the option a defaults
//! entry selects. The composer decides which kind an override is: a key that
//! matches a defaults group is a selection, anything else is a value.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::tree::{yaml, ConfigNode, KeyPath};

/// One `key=value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    key: String,
    value: String,
}

impl Override {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn raw_value(&self) -> &str {
        &self.value
    }

    /// True if this override selects `group` (given without a leading `/`).
    pub fn selects(&self, group: &str) -> bool {
        self.key.strip_prefix('/').unwrap_or(&self.key) == group
    }

    /// The option chosen for a group. `null` disables the entry.
    pub fn option(&self) -> Option<&str> {
        match self.value.as_str() {
            "null" | "~" => None,
            option => Some(option),
        }
    }

    /// Target path of a value override.
    pub fn path(&self) -> Result<KeyPath, ConfigError> {
        let path = KeyPath::parse(&self.key);
        if path.is_root() || !path.is_well_formed() || self.key.contains('/') {
            return Err(self.invalid("key must be a dotted path such as `model.d_model`"));
        }
        Ok(path)
    }

    /// Value of a value override, parsed as YAML (`256`, `true`, `${..x}`).
    pub fn node(&self) -> Result<ConfigNode, ConfigError> {
        yaml::parse_value(&self.to_string(), &self.value).map_err(|e| match e {
            ConfigError::Parse { message, .. } => self.invalid(&message),
            other => other,
        })
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidOverride {
            text: self.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for Override {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidOverride {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        let (key, value) = text.split_once('=').ok_or_else(|| invalid("expected `key=value`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(invalid("empty key"));
        }
        Ok(Self::new(key, value.trim()))
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Parse a list of `key=value` arguments.
pub fn parse_overrides<I, S>(args: I) -> Result<Vec<Override>, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().map(|arg| arg.as_ref().parse()).collect()
}
