//! Configuration trees.
//!
//! # Data Flow
//! ```text
//! fragment text (YAML)
//!     → yaml.rs (serde_yaml::Value → ConfigNode)
//!     → reference.rs (string scalars scanned for ${...} tokens)
//!     → ConfigNode tree addressed by KeyPath
//! ```
//!
//! # Design Decisions
//! - Closed value type: merge and resolution match every variant
//! - Mappings are ordered by key so rendered output is stable
//! - Unresolved tokens are values of their own, never raw strings

pub mod node;
pub mod path;
pub mod reference;
pub mod yaml;

pub use node::{ConfigNode, Mapping, Number};
pub use path::KeyPath;
pub use reference::{RefPath, Reference};
