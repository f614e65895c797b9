//! Loader-driven source lowering.
//!
//! This crate is the high-throughput transpile pass of the transform
//! pipeline: given raw source text and a loader, it strips typed syntax,
//! rewrites ES module statements to the configured output format, lowers JSX
//! to factory calls, and synthesizes a line-granular source map on request.
//! Output is produced by splicing spans of the original text, so untouched
//! code survives byte for byte.
//!
//! It does not hoist anything; callers that need mock-lifecycle calls moved
//! above imports run the hoist pass first and feed its output through here.

mod edit;
mod jsx;
mod module;
mod strip;

use serde::{Deserialize, Serialize};
use source_map::{MappingsBuilder, SourceMapV3};
use std::str::FromStr;
use thiserror::Error;

/// The syntax dialect used to interpret input source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loader {
    Js,
    Jsx,
    Ts,
    Tsx,
    Json,
    Text,
}

impl FromStr for Loader {
    type Err = LowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "js" => Ok(Self::Js),
            "jsx" => Ok(Self::Jsx),
            "ts" => Ok(Self::Ts),
            "tsx" => Ok(Self::Tsx),
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            _ => Err(LowerError::UnknownLoader(s.to_string())),
        }
    }
}

/// The output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// CommonJS: imports become `require`, exports become `exports.*`.
    #[default]
    Cjs,
    /// ES modules: module syntax passes through unchanged.
    Esm,
}

impl FromStr for Format {
    type Err = LowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cjs" => Ok(Self::Cjs),
            "esm" => Ok(Self::Esm),
            _ => Err(LowerError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// The output language level.
///
/// The parser always accepts the latest syntax; the target is validated so
/// configuration mistakes surface as transform failures, but no downleveling
/// of individual syntax features is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    Es5,
    Es2015,
    Es2016,
    Es2017,
    #[default]
    Es2018,
    Es2019,
    Es2020,
    Es2021,
    Es2022,
    EsNext,
}

impl FromStr for Target {
    type Err = LowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "es5" => Ok(Self::Es5),
            "es6" | "es2015" => Ok(Self::Es2015),
            "es2016" => Ok(Self::Es2016),
            "es2017" => Ok(Self::Es2017),
            "es2018" => Ok(Self::Es2018),
            "es2019" => Ok(Self::Es2019),
            "es2020" => Ok(Self::Es2020),
            "es2021" => Ok(Self::Es2021),
            "es2022" => Ok(Self::Es2022),
            "esnext" => Ok(Self::EsNext),
            _ => Err(LowerError::UnsupportedTarget(s.to_string())),
        }
    }
}

/// What to do with JSX syntax in JSX-capable loaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsxMode {
    /// Lower elements and fragments to factory calls.
    #[default]
    Transform,
    /// Parse JSX but emit it unchanged.
    Preserve,
}

/// Options for one lowering call.
#[derive(Debug, Clone)]
pub struct LowerOptions {
    pub loader: Loader,
    pub format: Format,
    pub target: Target,
    pub jsx: JsxMode,
    /// Factory invoked for JSX elements. Defaults to `React.createElement`.
    pub jsx_factory: Option<String>,
    /// Expression used for JSX fragments. Defaults to `React.Fragment`.
    pub jsx_fragment: Option<String>,
    /// When set, emit a source map declaring this path as the original file.
    pub source_map: Option<String>,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            loader: Loader::Js,
            format: Format::Cjs,
            target: Target::Es2018,
            jsx: JsxMode::Transform,
            jsx_factory: None,
            jsx_fragment: None,
            source_map: None,
        }
    }
}

/// The output of a lowering call.
///
/// The map is returned as JSON text; the caller owns parsing and any
/// post-processing of it.
#[derive(Debug, Clone)]
pub struct Lowered {
    pub code: String,
    pub map: Option<String>,
}

/// Error types for the lowering pass.
#[derive(Debug, Error)]
pub enum LowerError {
    /// The input could not be parsed under the chosen loader.
    #[error("parse error: {0}")]
    Parse(String),

    /// Unrecognized loader name.
    #[error("unknown loader \"{0}\"")]
    UnknownLoader(String),

    /// Unrecognized output format.
    #[error("unsupported output format \"{0}\"")]
    UnsupportedFormat(String),

    /// Unrecognized language-level target.
    #[error("unsupported target \"{0}\"")]
    UnsupportedTarget(String),

    /// Syntax with runtime semantics this pass does not lower.
    #[error("unsupported syntax: {0}")]
    UnsupportedSyntax(String),

    /// JSON handling failed (invalid JSON input, or map serialization).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lowers `source` according to `options`.
pub fn lower(source: &str, options: &LowerOptions) -> Result<Lowered, LowerError> {
    match options.loader {
        Loader::Json => lower_json(source, options),
        Loader::Text => lower_text(source, options),
        _ => module::lower_script(source, options),
    }
}

/// JSON modules: the input is validated and re-emitted as a single export of
/// the object literal (JSON is a valid JS expression).
fn lower_json(source: &str, options: &LowerOptions) -> Result<Lowered, LowerError> {
    serde_json::from_str::<serde_json::Value>(source)?;
    let body = source.trim();
    let code = match options.format {
        Format::Cjs => format!("module.exports = {body};"),
        Format::Esm => format!("export default {body};"),
    };
    finish_verbatim(code, source, options)
}

/// Text modules: the input becomes a single exported string literal.
fn lower_text(source: &str, options: &LowerOptions) -> Result<Lowered, LowerError> {
    let literal = string_literal(source);
    let code = match options.format {
        Format::Cjs => format!("module.exports = {literal};"),
        Format::Esm => format!("export default {literal};"),
    };
    finish_verbatim(code, source, options)
}

fn finish_verbatim(
    code: String,
    source: &str,
    options: &LowerOptions,
) -> Result<Lowered, LowerError> {
    let map = match &options.source_map {
        Some(file) => {
            let mut mappings = MappingsBuilder::new();
            mappings.add(0, 0);
            Some(SourceMapV3::new(file.clone(), source, mappings.encode()).to_json()?)
        }
        None => None,
    };
    Ok(Lowered { code, map })
}

/// Renders `text` as a JS string literal (JSON escaping is a subset of JS).
pub(crate) fn string_literal(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string())
}

/// Returns true if `name` can be used with dot access / shorthand keys.
pub(crate) fn is_js_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
