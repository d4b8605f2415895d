//! Composer settings subsystem.
//!
//! # Data Flow
//! ```text
//! composer.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ComposerSettings (validated, immutable)
//!     → search path handed to the Composer
//!
//! In watch mode:
//!     watcher.rs detects a fragment change
//!     → Composer recomposes from scratch
//!     → new ResolvedConfig sent to the consumer
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; command-line flags override them
//! - All fields have defaults to allow minimal settings files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{apply_cli_flags, load_settings, parse_settings, SettingsError};
pub use schema::{ComposerSettings, OutputFormat};
pub use watcher::ConfigWatcher;
