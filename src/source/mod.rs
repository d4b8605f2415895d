//! Fragment lookup.
//!
//! # Responsibilities
//! - Map a fragment name (`model/s4`) to its YAML text
//! - Report where lookups went, for error messages
//!
//! # Design Decisions
//! - The composer receives its source at construction; there is no global
//!   search path
//! - Any directory under a search root is a config group; categories are not
//!   hard-coded
//! - A missing fragment is `Ok(None)`, so the caller decides between an error
//!   and an optional skip

pub mod directory;
pub mod memory;

use std::fmt;

use crate::error::ConfigError;

pub use directory::SearchPath;
pub use memory::MemorySource;

/// A registry of named configuration fragments.
pub trait FragmentSource: Send + Sync + fmt::Debug {
    /// Text of fragment `name`, or `None` when no such fragment exists.
    fn read(&self, name: &str) -> Result<Option<String>, ConfigError>;

    /// Where this source looks, for diagnostics.
    fn describe(&self) -> String;
}
