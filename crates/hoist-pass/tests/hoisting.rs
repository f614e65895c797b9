//! Integration tests for the hoist pass.

use hoist_pass::{required, HoistError, HoistOptions, HoistPass};

fn rewrite(source: &str) -> String {
    HoistPass::new(HoistOptions::default())
        .rewrite(source)
        .unwrap()
}

#[test]
fn test_mock_calls_run_before_generated_requires() {
    let source = "import { getUser } from \"./user\";\n\
                  jest.mock(\"./user\");\n\
                  export function run() { return getUser(); }\n";
    let code = rewrite(source);

    let mock_at = code.find("jest.mock(\"./user\")").unwrap();
    let require_at = code.find("require(\"./user\")").unwrap();
    assert!(
        mock_at < require_at,
        "mock call must precede the require it targets:\n{code}"
    );
    assert!(code.contains("const { getUser } = require(\"./user\");"));
    assert!(code.contains("exports.run = run;"));
    assert!(!code.contains("import "));
}

#[test]
fn test_multiple_hoisted_calls_keep_relative_order() {
    let source = "import a from \"./a\";\n\
                  jest.mock(\"./a\");\n\
                  import b from \"./b\";\n\
                  jest.unmock(\"./b\");\n\
                  a(b);\n";
    let code = rewrite(source);

    let mock_at = code.find("jest.mock(\"./a\")").unwrap();
    let unmock_at = code.find("jest.unmock(\"./b\")").unwrap();
    let first_require = code.find("require(").unwrap();
    assert!(mock_at < unmock_at);
    assert!(unmock_at < first_require);
    // Non-hoisted statements keep their original relative order.
    assert!(code.find("require(\"./a\")").unwrap() < code.find("require(\"./b\")").unwrap());
}

#[test]
fn test_types_are_stripped() {
    let code = rewrite("jest.mock(\"./m\");\nconst n: number = 1;\n");
    assert!(!code.contains("number"));
    assert!(code.contains("const n"));
}

#[test]
fn test_jsx_is_preserved_for_the_fast_pass() {
    let code = rewrite("jest.mock(\"./c\");\nconst el = <Comp prop={1} />;\n");
    assert!(code.contains("<Comp prop={1} />"));
    assert!(!code.contains("createElement"));
}

#[test]
fn test_mock_factory_argument_travels_with_the_call() {
    let source = "import dep from \"./dep\";\n\
                  jest.mock(\"./dep\", () => ({ default: () => 7 }));\n\
                  dep();\n";
    let code = rewrite(source);
    let factory_at = code.find("() => ({ default: () => 7 })").unwrap();
    assert!(factory_at < code.find("require(\"./dep\")").unwrap());
}

#[test]
fn test_clean_sources_only_get_interop() {
    // No mock calls: the pass still lowers modules (the instrument path).
    let code = rewrite("import x from \"./x\";\nexport const y = x;\n");
    assert!(code.contains("const x = _interopDefault(require(\"./x\"));"));
    assert!(code.contains("exports.y = y;"));
}

#[test]
fn test_parse_error_is_reported() {
    let result = HoistPass::new(HoistOptions::default()).rewrite("jest.mock(");
    assert!(matches!(result, Err(HoistError::Parse(_))));
}

#[test]
fn test_detector_and_pass_agree_on_method_set() {
    for method in hoist_pass::HOIST_METHODS {
        let source = format!("import z from \"./z\";\n{method}(\"./z\");\nz();\n");
        assert!(required(&source, false));
        let code = rewrite(&source);
        assert!(
            code.find(&format!("{method}(\"./z\")")).unwrap()
                < code.find("require(\"./z\")").unwrap(),
            "{method} should hoist"
        );
    }
}
