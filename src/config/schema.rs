//! Settings schema definitions.
//!
//! Settings of the composer itself, read from `composer.toml`. Every section
//! has defaults so an empty file is valid.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for the composer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComposerSettings {
    /// Directories searched for fragments, in order.
    pub search_path: Vec<PathBuf>,

    /// Rendering of composed configurations.
    pub output: OutputSettings,

    pub logging: LoggingSettings,

    /// Watch mode settings.
    pub watch: WatchSettings,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            search_path: vec![PathBuf::from("conf")],
            output: OutputSettings::default(),
            logging: LoggingSettings::default(),
            watch: WatchSettings::default(),
        }
    }
}

/// Output format of a composed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level (off, trace, debug, info, warn, error). `RUST_LOG` wins.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Poll interval of the file watcher in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}
