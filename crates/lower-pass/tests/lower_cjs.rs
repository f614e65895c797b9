//! Integration tests for CommonJS module lowering.

use lower_pass::{lower, Format, Loader, LowerError, LowerOptions};
use pretty_assertions::assert_eq;

fn cjs(loader: Loader, source: &str) -> String {
    lower(
        source,
        &LowerOptions {
            loader,
            ..Default::default()
        },
    )
    .unwrap()
    .code
}

#[test]
fn test_export_const_commonizes() {
    let code = cjs(Loader::Ts, "export const x = 1");
    assert_eq!(
        code,
        "Object.defineProperty(exports, \"__esModule\", { value: true });\n\
         const x = 1; exports.x = x;"
    );
}

#[test]
fn test_export_function_and_class() {
    let code = cjs(
        Loader::Js,
        "export function add(a, b) { return a + b }\nexport class Box {}\n",
    );
    assert!(code.contains("function add(a, b) { return a + b } exports.add = add;"));
    assert!(code.contains("class Box {} exports.Box = Box;"));
    assert!(!code.contains("export "));
}

#[test]
fn test_export_destructured_bindings() {
    let code = cjs(Loader::Js, "export const { a, b: c, ...rest } = obj;\n");
    assert!(code.contains("exports.a = a;"));
    assert!(code.contains("exports.c = c;"));
    assert!(code.contains("exports.rest = rest;"));
    assert!(!code.contains("exports.b "));
}

#[test]
fn test_import_forms() {
    let source = "import \"./setup\";\n\
                  import def from \"./def\";\n\
                  import * as ns from \"./ns\";\n\
                  import { a, b as c } from \"./named\";\n\
                  import def2, { d } from \"./mixed\";\n";
    let code = cjs(Loader::Js, source);

    assert!(code.contains("require(\"./setup\");"));
    assert!(code.contains("const def = _interopDefault(require(\"./def\"));"));
    assert!(code.contains("const ns = require(\"./ns\");"));
    assert!(code.contains("const { a, b: c } = require(\"./named\");"));
    assert!(code.contains(
        "const _mod0 = require(\"./mixed\"); const def2 = _interopDefault(_mod0); const { d } = _mod0;"
    ));
    // The interop helper is defined exactly once, ahead of the requires.
    assert_eq!(code.matches("function _interopDefault").count(), 1);
    assert!(code.find("function _interopDefault").unwrap() < code.find("require(").unwrap());
    assert!(!code.contains("import "));
}

#[test]
fn test_export_star() {
    let code = cjs(Loader::Js, "export * from \"./other\";\n");
    assert!(code.contains("_exportStar(require(\"./other\"), exports);"));
    assert!(code.contains("function _exportStar"));
    assert!(code.contains("Object.defineProperty(exports, \"__esModule\""));
}

#[test]
fn test_named_reexport() {
    let code = cjs(Loader::Js, "export { a as b, c } from \"./m\";\n");
    assert!(code.contains("const _mod0 = require(\"./m\");"));
    assert!(code.contains("exports.b = _mod0.a;"));
    assert!(code.contains("exports.c = _mod0.c;"));
}

#[test]
fn test_local_named_export() {
    let code = cjs(Loader::Js, "const a = 1;\nexport { a as default };\n");
    assert!(code.contains("exports.default = a;"));
}

#[test]
fn test_export_default_expression() {
    let code = cjs(Loader::Js, "export default 42;\n");
    assert!(code.contains("exports.default = 42;"));
}

#[test]
fn test_export_default_named_function() {
    let code = cjs(Loader::Js, "export default function main() { return 1 }\n");
    assert!(code.contains("function main() { return 1 } exports.default = main;"));
}

#[test]
fn test_export_default_anonymous_class() {
    let code = cjs(Loader::Js, "export default class { run() {} }\n");
    assert!(code.contains("exports.default = class { run() {} };"));
}

#[test]
fn test_comments_and_blank_lines_pass_through() {
    let source = "// leading comment\nconst x = 1;\n\n// trailing\n";
    let code = cjs(Loader::Js, source);
    assert_eq!(code, source);
}

#[test]
fn test_esm_format_passes_module_syntax_through() {
    let source = "import { a } from \"./m\";\nexport const x = a;\n";
    let lowered = lower(
        source,
        &LowerOptions {
            loader: Loader::Js,
            format: Format::Esm,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(lowered.code, source);
}

#[test]
fn test_malformed_input_is_a_parse_error() {
    let result = lower(
        "const = ;",
        &LowerOptions {
            loader: Loader::Ts,
            ..Default::default()
        },
    );
    assert!(matches!(result, Err(LowerError::Parse(_))));
}

#[test]
fn test_relowering_own_output_is_stable() {
    let first = cjs(Loader::Ts, "export const x = 1");
    // No module syntax is left, so a second pass is a passthrough.
    let second = cjs(Loader::Js, &first);
    assert_eq!(first, second);
}
