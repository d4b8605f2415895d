//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (fragment loads, composition summaries, watcher errors)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, filtered by RUST_LOG or settings)
//! ```

pub mod logging;

pub use logging::init_logging;
