//! Settings loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ComposerSettings;
use crate::config::validation::{validate_settings, ValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<ComposerSettings, SettingsError> {
    let content = fs::read_to_string(path)?;
    parse_settings(&content)
}

/// Parse and validate settings from TOML text.
pub fn parse_settings(content: &str) -> Result<ComposerSettings, SettingsError> {
    let settings: ComposerSettings = toml::from_str(content)?;

    validate_settings(&settings).map_err(SettingsError::Validation)?;

    Ok(settings)
}

/// Apply command-line flags on top of loaded settings and validate again.
///
/// Extra search roots are searched before the configured ones.
pub fn apply_cli_flags(
    mut settings: ComposerSettings,
    search_path: &[PathBuf],
    log_level: Option<&str>,
) -> Result<ComposerSettings, SettingsError> {
    if !search_path.is_empty() {
        let configured = std::mem::take(&mut settings.search_path);
        settings.search_path = search_path.iter().cloned().chain(configured).collect();
    }
    if let Some(level) = log_level {
        settings.logging.level = level.to_string();
    }

    validate_settings(&settings).map_err(SettingsError::Validation)?;

    Ok(settings)
}
