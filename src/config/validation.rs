//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (poll interval > 0)
//! - Check the log level names a known level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ComposerSettings → Result<(), Vec<ValidationError>>
//! - Directories are not required to exist; a missing root simply holds no fragments

use std::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::ComposerSettings;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("search_path must name at least one directory")]
    EmptySearchPath,

    #[error("search_path entry {0} is empty")]
    EmptySearchPathEntry(usize),

    #[error("unknown log level `{0}`")]
    UnknownLogLevel(String),

    #[error("watch.poll_interval_ms must be greater than zero")]
    ZeroPollInterval,
}

pub fn validate_settings(settings: &ComposerSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.search_path.is_empty() {
        errors.push(ValidationError::EmptySearchPath);
    }
    for (i, root) in settings.search_path.iter().enumerate() {
        if root.as_os_str().is_empty() {
            errors.push(ValidationError::EmptySearchPathEntry(i));
        }
    }

    if LevelFilter::from_str(&settings.logging.level).is_err() {
        errors.push(ValidationError::UnknownLogLevel(settings.logging.level.clone()));
    }

    if settings.watch.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
