//! The transform orchestrator.

use crate::cache_key;
use crate::config::{ProcessOptions, TransformConfig};
use crate::loader::resolve_loader;
use camino::Utf8Path;
use hoist_pass::{HoistError, HoistOptions, HoistPass};
use lower_pass::{lower, Format, JsxMode, LowerError, LowerOptions, Target};
use source_map::{inline_comment, SourceMapV3};
use std::borrow::Cow;
use thiserror::Error;

/// Error types for a single transform call.
///
/// These never escape [`Transformer::process`]; the boundary contract
/// collapses every failure to the absent-result shape.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The slow pass could not rewrite the source.
    #[error("hoist pass failed: {0}")]
    Hoist(#[from] HoistError),

    /// The fast pass could not lower the source.
    #[error("lower pass failed: {0}")]
    Lower(#[from] LowerError),

    /// The fast pass returned a map that does not parse.
    #[error("invalid source map from lower pass: {0}")]
    MapParse(#[source] serde_json::Error),

    /// Maps were requested but the fast pass returned none.
    #[error("lower pass returned no source map")]
    MapMissing,
}

/// The result of one transform call.
///
/// Both fields absent signals that the file could not be transformed; the
/// host runner reports that as a file-level error without aborting the batch.
#[derive(Debug, Clone, Default)]
pub struct TransformOutput {
    /// The lowered module code, with an inline map comment appended when
    /// source maps are enabled.
    pub code: Option<String>,
    /// The synthesized map, stripped of embedded source content. Present
    /// only when source maps are enabled.
    pub map: Option<SourceMapV3>,
}

/// Transforms sources on demand for the host test runner.
///
/// Holds only immutable configuration, so a single instance can serve
/// concurrent `process` calls from many worker threads without locking.
#[derive(Debug, Clone)]
pub struct Transformer {
    config: TransformConfig,
}

impl Transformer {
    /// Creates a transformer over a fixed configuration.
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Transforms one file.
    ///
    /// Never panics and never raises: any failure in either pass or in map
    /// handling is reported on stderr and collapsed to the absent result.
    pub fn process(
        &self,
        source_text: &str,
        source_path: &Utf8Path,
        runtime_config: &serde_json::Value,
        options: &ProcessOptions,
    ) -> TransformOutput {
        // The runtime config is an opaque passthrough; it only participates
        // in cache keys.
        let _ = runtime_config;
        match self.try_process(source_text, source_path, options) {
            Ok(output) => output,
            Err(err) => {
                eprintln!("test-transform-rs: failed to transform {source_path}: {err}");
                TransformOutput::default()
            }
        }
    }

    /// Derives the cache key the host runner uses to skip re-transforming
    /// unchanged files.
    pub fn cache_key(
        &self,
        source_text: &str,
        source_path: &Utf8Path,
        runtime_config: &serde_json::Value,
        options: &ProcessOptions,
    ) -> String {
        cache_key::derive(
            &self.config,
            source_text,
            source_path,
            runtime_config,
            options,
        )
    }

    fn try_process(
        &self,
        source_text: &str,
        source_path: &Utf8Path,
        options: &ProcessOptions,
    ) -> Result<TransformOutput, TransformError> {
        let loader = resolve_loader(source_path, &self.config.loaders);
        let format: Format = self.config.format.parse()?;
        let target: Target = self.config.target.parse()?;

        let working: Cow<str> = if hoist_pass::required(source_text, options.instrument) {
            Cow::Owned(HoistPass::new(HoistOptions::default()).rewrite(source_text)?)
        } else {
            Cow::Borrowed(source_text)
        };

        let lowered = lower(
            &working,
            &LowerOptions {
                loader,
                format,
                target,
                jsx: JsxMode::Transform,
                jsx_factory: self.config.jsx_factory.clone(),
                jsx_fragment: self.config.jsx_fragment.clone(),
                source_map: self.config.sourcemap.then(|| source_path.to_string()),
            },
        )?;

        if !self.config.sourcemap {
            return Ok(TransformOutput {
                code: Some(lowered.code),
                map: None,
            });
        }

        let raw_map = lowered.map.ok_or(TransformError::MapMissing)?;
        let mut map = SourceMapV3::from_json(&raw_map).map_err(TransformError::MapParse)?;
        // Drop the embedded source copy so debuggers resolve breakpoints
        // against the on-disk file named in `sources`.
        map.strip_sources_content();
        let comment = inline_comment(&map).map_err(TransformError::MapParse)?;
        let code = format!("{}\n{comment}", lowered.code);
        Ok(TransformOutput {
            code: Some(code),
            map: Some(map),
        })
    }
}
