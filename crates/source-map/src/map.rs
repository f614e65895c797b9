//! The source map V3 JSON model.

use serde::{Deserialize, Serialize};

/// A standard V3 source map.
///
/// Field names follow the JSON wire format (`sourcesContent`, not
/// `sources_content`). The transform pipeline only ever emits maps against a
/// single source, but parsing accepts the general shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapV3 {
    /// Always 3.
    pub version: u32,

    /// The generated file, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Original source paths.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Embedded copies of the original sources, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,

    /// Symbol names referenced by mapping segments.
    #[serde(default)]
    pub names: Vec<String>,

    /// Base64 VLQ mapping groups.
    #[serde(default)]
    pub mappings: String,
}

impl SourceMapV3 {
    /// Creates a single-source map with embedded source content.
    pub fn new(
        source: impl Into<String>,
        content: impl Into<String>,
        mappings: String,
    ) -> Self {
        Self {
            version: 3,
            file: None,
            sources: vec![source.into()],
            sources_content: Some(vec![Some(content.into())]),
            names: Vec::new(),
            mappings,
        }
    }

    /// Parses a map from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serializes the map to JSON text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Drops the embedded source content so consumers resolve positions
    /// against the on-disk files named in `sources` instead.
    pub fn strip_sources_content(&mut self) {
        self.sources_content = None;
    }
}
