//! Cache key derivation.
//!
//! The host runner keys transform results on (plugin config, source content,
//! file path, runtime config, process options): identical inputs must yield
//! identical keys so unchanged files can be served from its disk cache.

use crate::config::{ProcessOptions, TransformConfig};
use blake3::Hasher;
use camino::Utf8Path;

pub(crate) fn derive(
    config: &TransformConfig,
    source_text: &str,
    source_path: &Utf8Path,
    runtime_config: &serde_json::Value,
    options: &ProcessOptions,
) -> String {
    let mut hasher = Hasher::new();
    update_field(
        &mut hasher,
        serde_json::to_string(config).unwrap_or_default().as_bytes(),
    );
    update_field(&mut hasher, source_text.as_bytes());
    update_field(&mut hasher, source_path.as_str().as_bytes());
    update_field(
        &mut hasher,
        serde_json::to_string(runtime_config)
            .unwrap_or_default()
            .as_bytes(),
    );
    update_field(&mut hasher, &[options.instrument as u8]);
    hasher.finalize().to_hex().to_string()
}

/// Length-prefixes each field so adjacent values cannot collide.
fn update_field(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_key() -> String {
        derive(
            &TransformConfig::default(),
            "export const x = 1",
            Utf8Path::new("a.ts"),
            &json!({"rootDir": "/repo"}),
            &ProcessOptions::default(),
        )
    }

    #[test]
    fn test_stable_across_calls() {
        assert_eq!(base_key(), base_key());
    }

    #[test]
    fn test_sensitive_to_each_input() {
        let reference = base_key();

        let changed_source = derive(
            &TransformConfig::default(),
            "export const x = 2",
            Utf8Path::new("a.ts"),
            &json!({"rootDir": "/repo"}),
            &ProcessOptions::default(),
        );
        assert_ne!(reference, changed_source);

        let changed_path = derive(
            &TransformConfig::default(),
            "export const x = 1",
            Utf8Path::new("b.ts"),
            &json!({"rootDir": "/repo"}),
            &ProcessOptions::default(),
        );
        assert_ne!(reference, changed_path);

        let changed_runtime = derive(
            &TransformConfig::default(),
            "export const x = 1",
            Utf8Path::new("a.ts"),
            &json!({"rootDir": "/other"}),
            &ProcessOptions::default(),
        );
        assert_ne!(reference, changed_runtime);

        let changed_options = derive(
            &TransformConfig::default(),
            "export const x = 1",
            Utf8Path::new("a.ts"),
            &json!({"rootDir": "/repo"}),
            &ProcessOptions { instrument: true },
        );
        assert_ne!(reference, changed_options);

        let changed_config = derive(
            &TransformConfig {
                sourcemap: true,
                ..Default::default()
            },
            "export const x = 1",
            Utf8Path::new("a.ts"),
            &json!({"rootDir": "/repo"}),
            &ProcessOptions::default(),
        );
        assert_ne!(reference, changed_config);
    }

    #[test]
    fn test_fields_do_not_bleed_into_each_other() {
        // Same concatenation, different field boundaries.
        let a = derive(
            &TransformConfig::default(),
            "ab",
            Utf8Path::new("c"),
            &serde_json::Value::Null,
            &ProcessOptions::default(),
        );
        let b = derive(
            &TransformConfig::default(),
            "a",
            Utf8Path::new("bc"),
            &serde_json::Value::Null,
            &ProcessOptions::default(),
        );
        assert_ne!(a, b);
    }
}
