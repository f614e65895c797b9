//! Plugin configuration.

use lower_pass::Loader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Process-wide plugin configuration.
///
/// Constructed once per plugin instance from the host runner's JSON options
/// block and shared read-only across every transform call:
///
/// ```json
/// { "sourcemap": true, "loaders": { ".test.ts": "text" }, "target": "es2020" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformConfig {
    /// Embed an inline source map in the output and return the map object.
    pub sourcemap: bool,

    /// Loader overrides keyed by compound extension (e.g. `.test.ts`).
    /// An exact key match wins over the default extension mapping.
    pub loaders: HashMap<String, Loader>,

    /// Output module format (`cjs` or `esm`).
    pub format: String,

    /// Output language level (`es5`, `es2015`..`es2022`, `esnext`).
    pub target: String,

    /// JSX factory, e.g. `h`. Defaults to `React.createElement`.
    pub jsx_factory: Option<String>,

    /// JSX fragment expression, e.g. `Fragment`. Defaults to `React.Fragment`.
    pub jsx_fragment: Option<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            sourcemap: false,
            loaders: HashMap::new(),
            format: "cjs".to_string(),
            target: "es2018".to_string(),
            jsx_factory: None,
            jsx_fragment: None,
        }
    }
}

/// Per-call options passed by the host runner.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessOptions {
    /// Force the full syntax-aware pass; coverage instrumentation cannot run
    /// on the fast path.
    pub instrument: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransformConfig::default();
        assert!(!config.sourcemap);
        assert_eq!(config.format, "cjs");
        assert_eq!(config.target, "es2018");
        assert!(config.loaders.is_empty());
        assert_eq!(config.jsx_factory, None);
    }

    #[test]
    fn test_deserialize_empty_object() {
        let config: TransformConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.format, "cjs");
        assert!(!config.sourcemap);
    }

    #[test]
    fn test_deserialize_full_config() {
        let config: TransformConfig = serde_json::from_str(
            r#"{
                "sourcemap": true,
                "loaders": { ".test.ts": "text", ".svg": "text" },
                "format": "esm",
                "target": "es2020",
                "jsxFactory": "h",
                "jsxFragment": "Fragment"
            }"#,
        )
        .unwrap();
        assert!(config.sourcemap);
        assert_eq!(config.loaders.get(".test.ts"), Some(&Loader::Text));
        assert_eq!(config.format, "esm");
        assert_eq!(config.jsx_factory.as_deref(), Some("h"));
        assert_eq!(config.jsx_fragment.as_deref(), Some("Fragment"));
    }

    #[test]
    fn test_process_options_default() {
        let options: ProcessOptions = serde_json::from_str("{}").unwrap();
        assert!(!options.instrument);
        let options: ProcessOptions = serde_json::from_str(r#"{"instrument": true}"#).unwrap();
        assert!(options.instrument);
    }
}
