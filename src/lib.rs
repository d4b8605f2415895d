//! Layered configuration composer library.
//!
//! Loads a root fragment, merges the fragments its `defaults` list names,
//! applies local and command-line overrides, resolves `${...}` references
//! and hands back one frozen [`ResolvedConfig`].
//!
//! ```no_run
//! use config_composer::{Composer, Override};
//!
//! let composer = Composer::with_search_path(["conf"]);
//! let overrides = vec!["trainer.max_epochs=20".parse::<Override>()?];
//! let config = composer.compose("experiment/lra/s4-listops", &overrides)?;
//! assert_eq!(config.get_i64("model.layer.n_ssm"), config.get_i64("model.d_model"));
//! # Ok::<(), config_composer::ConfigError>(())
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod observability;
pub mod source;
pub mod tree;

pub use compose::{Composer, Override, ResolvedConfig};
pub use error::ConfigError;
pub use source::{FragmentSource, MemorySource, SearchPath};
pub use tree::{ConfigNode, KeyPath};
