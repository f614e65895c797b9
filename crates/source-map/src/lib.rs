//! Source map V3 synthesis and inspection for test-transform-rs.
//!
//! This crate provides the pieces the transform pipeline needs to produce and
//! post-process standard source maps:
//! - a serde model of the V3 JSON format ([`SourceMapV3`])
//! - line-granular `mappings` synthesis ([`MappingsBuilder`])
//! - base64 VLQ encoding of mapping segments
//! - inline `sourceMappingURL` data-URI comments
//! - byte offset to line/column lookup ([`LineIndex`])

mod builder;
mod inline;
mod line_index;
mod map;
pub mod vlq;

pub use builder::{LineMapping, MappingsBuilder};
pub use inline::{decode_inline_comment, inline_comment, DATA_URI_PREFIX};
pub use line_index::{LineCol, LineIndex};
pub use map::SourceMapV3;
