//! End-to-end tests for the transform pipeline: loader resolution, the
//! conditional slow pass, lowering, and source map assembly.

use camino::Utf8Path;
use pretty_assertions::assert_eq;
use serde_json::Value;
use source_map::{decode_inline_comment, DATA_URI_PREFIX};
use std::collections::HashMap;
use test_transform_rs::{
    create_transformer, Loader, ProcessOptions, TransformConfig, TransformOutput,
};

fn process(config: TransformConfig, source: &str, path: &str) -> TransformOutput {
    create_transformer(config).process(
        source,
        Utf8Path::new(path),
        &Value::Null,
        &ProcessOptions::default(),
    )
}

#[test]
fn test_typed_script_with_default_config() {
    let output = process(TransformConfig::default(), "export const x = 1", "a.ts");
    let code = output.code.unwrap();
    insta::assert_snapshot!(code, @r#"
    Object.defineProperty(exports, "__esModule", { value: true });
    const x = 1; exports.x = x;
    "#);
    assert!(output.map.is_none());
    assert!(!code.contains(DATA_URI_PREFIX));
}

#[test]
fn test_mock_call_routes_through_hoist_pass() {
    let source = "import { getUser } from \"./user\";\n\
                  jest.mock(\"./user\");\n\
                  export const probe = getUser;\n";
    let output = process(TransformConfig::default(), source, "a.ts");
    let code = output.code.unwrap();
    assert!(
        code.find("jest.mock(\"./user\")").unwrap() < code.find("require(\"./user\")").unwrap()
    );
    assert!(code.contains("exports.probe = probe;"));
}

#[test]
fn test_clean_sources_skip_the_hoist_pass() {
    // The hoist pass drops inter-statement comments; the fast path keeps
    // them. A surviving comment proves the slow pass did not run.
    let source = "// fixture helper\nexport const x = 1;\n";
    let output = process(TransformConfig::default(), source, "a.ts");
    assert!(output.code.unwrap().contains("// fixture helper"));
}

#[test]
fn test_instrument_forces_the_hoist_pass() {
    let source = "// fixture helper\nexport const x = 1;\n";
    let output = create_transformer(TransformConfig::default()).process(
        source,
        Utf8Path::new("a.ts"),
        &Value::Null,
        &ProcessOptions { instrument: true },
    );
    let code = output.code.unwrap();
    assert!(!code.contains("fixture helper"));
    assert!(code.contains("exports.x = x;"));
}

#[test]
fn test_loader_override_forces_text() {
    let config = TransformConfig {
        loaders: HashMap::from([(".test.ts".to_string(), Loader::Text)]),
        ..Default::default()
    };
    let output = process(config, "export const x = 1", "a.test.ts");
    assert_eq!(
        output.code.unwrap(),
        "module.exports = \"export const x = 1\";"
    );
}

#[test]
fn test_json_loader() {
    let output = process(TransformConfig::default(), "{\"a\": 1}", "data.json");
    assert_eq!(output.code.unwrap(), "module.exports = {\"a\": 1};");
}

#[test]
fn test_unknown_extension_falls_back_to_text() {
    let output = process(TransformConfig::default(), "<svg/>", "logo.svg");
    assert_eq!(output.code.unwrap(), "module.exports = \"<svg/>\";");
}

#[test]
fn test_malformed_input_yields_absent_result() {
    let output = process(TransformConfig::default(), "const = ;", "a.ts");
    assert!(output.code.is_none());
    assert!(output.map.is_none());
}

#[test]
fn test_unsupported_format_yields_absent_result() {
    let config = TransformConfig {
        format: "iife".to_string(),
        ..Default::default()
    };
    let output = process(config, "export const x = 1", "a.ts");
    assert!(output.code.is_none());
    assert!(output.map.is_none());
}

#[test]
fn test_sourcemap_enabled_appends_single_inline_comment() {
    let config = TransformConfig {
        sourcemap: true,
        ..Default::default()
    };
    let output = process(config, "export const x = 1", "a.ts");
    let code = output.code.unwrap();
    let map = output.map.unwrap();

    assert_eq!(code.matches(DATA_URI_PREFIX).count(), 1);
    assert!(code.lines().last().unwrap().starts_with(DATA_URI_PREFIX));

    // The decoded comment payload and the returned map are the same object,
    // and neither embeds the original source.
    let decoded = decode_inline_comment(&code).unwrap();
    assert_eq!(decoded, map);
    assert!(map.sources_content.is_none());
    assert_eq!(map.sources, vec!["a.ts".to_string()]);
    assert!(!map.mappings.is_empty());
}

#[test]
fn test_jsx_config_reaches_the_fast_pass() {
    let config = TransformConfig {
        jsx_factory: Some("h".to_string()),
        jsx_fragment: Some("Fragment".to_string()),
        ..Default::default()
    };
    let output = process(config, "export const el = <p>hi</p>;", "view.tsx");
    assert!(output.code.unwrap().contains("h(\"p\", null, \"hi\")"));
}

#[test]
fn test_pipeline_accepts_its_own_output() {
    let first = process(TransformConfig::default(), "export const x = 1", "a.ts")
        .code
        .unwrap();

    // As plain text: must not throw, whatever the content.
    let as_text = process(TransformConfig::default(), &first, "a.generated");
    assert!(as_text.code.is_some());

    // As script: already commonized, so it passes through unchanged.
    let as_script = process(TransformConfig::default(), &first, "a.js");
    assert_eq!(as_script.code.unwrap(), first);
}

#[test]
fn test_capability_flag() {
    assert!(test_transform_rs::CAN_INSTRUMENT);
}
