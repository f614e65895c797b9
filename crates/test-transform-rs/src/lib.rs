//! On-demand source transformation for test runners.
//!
//! This crate is the plugin surface a host test runner loads to turn source
//! files (JS, TS, JSX/TSX, JSON, plain text) into runnable CommonJS modules,
//! one file at a time. Each call resolves a loader from the file path, runs
//! the slow mock-hoisting pass only when the source needs it, always runs the
//! fast lowering pass, and optionally embeds an inline source map.
//!
//! Failures never cross the plugin boundary: a file that cannot be
//! transformed yields an empty [`TransformOutput`] and a stderr diagnostic,
//! and the host reports it as a file-level error.
//!
//! # Example
//!
//! ```
//! use test_transform_rs::{create_transformer, ProcessOptions, TransformConfig};
//!
//! let transformer = create_transformer(TransformConfig::default());
//! let output = transformer.process(
//!     "export const x = 1",
//!     camino::Utf8Path::new("a.ts"),
//!     &serde_json::Value::Null,
//!     &ProcessOptions::default(),
//! );
//! assert!(output.code.unwrap().contains("exports.x = x;"));
//! ```

mod cache_key;
mod config;
mod loader;
mod transformer;

pub use config::{ProcessOptions, TransformConfig};
pub use loader::{extension_key, resolve_loader};
pub use lower_pass::Loader;
pub use transformer::{TransformError, TransformOutput, Transformer};

/// Transformed files support coverage instrumentation: the `instrument`
/// process option routes them through the full syntax-aware pass.
pub const CAN_INSTRUMENT: bool = true;

/// Creates a transformer for one plugin configuration.
///
/// The returned value holds only immutable state and can be shared across
/// the host runner's worker threads.
pub fn create_transformer(config: TransformConfig) -> Transformer {
    Transformer::new(config)
}
