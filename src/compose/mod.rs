//! Configuration composition.
//!
//! # Data Flow
//! ```text
//! root fragment (experiment/lra/s4-listops)
//!     → defaults.rs (header, defaults list, local keys)
//!     → composer.rs (expand defaults depth first, each at its package)
//!         → merger.rs (merge or replace into the base tree)
//!     → local keys of each fragment, after its defaults
//!     → overrides.rs (command-line selections and values)
//!     → resolver.rs (${...} substitution to a fixed point)
//!     → ResolvedConfig (frozen, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Later overlays win; a fragment's own keys beat its defaults
//! - Composition is one-shot and synchronous; failure leaves nothing behind
//! - The fragment source is a constructor argument, never global state

pub mod composer;
pub mod defaults;
pub mod merger;
pub mod overrides;
pub mod resolved;
pub mod resolver;

pub use composer::Composer;
pub use defaults::{DefaultsEntry, Fragment, MergeMode, OverlayReference, PackageHeader};
pub use merger::{apply_all, apply_overlay, merge_into, Overlay};
pub use overrides::{parse_overrides, Override};
pub use resolved::ResolvedConfig;
pub use resolver::{resolve_references, ResolveStats};
