//! Composition errors.
//!
//! Every error is fatal to the load that raised it: the composer never hands
//! out a partially built configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration composition.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A defaults entry names a fragment that no search path location holds.
    #[error("defaults file `{name}` not found (searched {searched})")]
    MissingDefaultsFile { name: String, searched: String },

    /// A defaults entry is malformed, or its target slot cannot be located.
    #[error("invalid overlay `{entry}`: {reason}")]
    UnknownOverlayTarget { entry: String, reason: String },

    /// A `${...}` token never resolved: missing target, typo or cycle.
    #[error("unresolved reference `{token}` at `{location}`: {reason}")]
    UnresolvedReference {
        location: String,
        token: String,
        reason: String,
    },

    #[error("malformed reference `{token}`: {reason}")]
    MalformedReference { token: String, reason: String },

    #[error("defaults cycle: {}", chain.join(" -> "))]
    DefaultsCycle { chain: Vec<String> },

    #[error("failed to parse `{name}`: {message}")]
    Parse { name: String, message: String },

    #[error("invalid override `{text}`: {reason}")]
    InvalidOverride { text: String, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render configuration: {0}")]
    Render(String),
}
