//! Mock-lifecycle call hoisting.
//!
//! The host runner's module system requires calls like `jest.mock("./dep")`
//! to take effect before the module under test loads its imports. The fast
//! lowering pass never reorders statements, so sources that use these calls
//! go through this pass first: a full parse, top-of-module mock calls moved
//! above every import, then the usual interop/stripping machinery from
//! `lower-pass` so the hoisted calls execute ahead of the generated
//! `require`s.
//!
//! Whether the pass runs at all is decided by [`required`], a deliberately
//! cheap substring heuristic evaluated before the pipeline.

use lower_pass::{lower, Format, JsxMode, Loader, LowerError, LowerOptions, Target};
use std::sync::Arc;
use swc_common::{FileName, SourceMap as SwcSourceMap, Spanned};
use swc_ecma_ast::*;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};
use thiserror::Error;

/// Mock-lifecycle methods the host runner evaluates before imports.
pub const HOIST_METHODS: [&str; 5] = [
    "mock",
    "unmock",
    "enableAutomock",
    "disableAutomock",
    "deepUnmock",
];

/// Decides whether the hoist pass must run for `source`.
///
/// True when coverage instrumentation is requested, or when any hoist method
/// name followed by an opening parenthesis appears anywhere in the raw text.
/// This is a plain substring search with no lexical awareness: a match inside
/// a comment or string literal still triggers the pass. Over-matching only
/// costs latency; under-matching would break mock semantics, so the heuristic
/// errs on the safe side.
pub fn required(source: &str, instrument: bool) -> bool {
    if instrument {
        return true;
    }
    HOIST_METHODS
        .iter()
        .any(|method| source.contains(&format!("{method}(")))
}

/// Error types for the hoist pass.
#[derive(Debug, Error)]
pub enum HoistError {
    /// The input could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// The post-hoist lowering failed.
    #[error(transparent)]
    Lower(#[from] LowerError),
}

/// The pass's capability set. The pipeline always runs it fully enabled;
/// the switches exist so each capability can be exercised in isolation.
#[derive(Debug, Clone)]
pub struct HoistOptions {
    /// Rewrite ES module syntax to CommonJS so hoisted calls run before any
    /// generated `require`.
    pub module_interop: bool,
    /// Erase TypeScript-only syntax.
    pub strip_types: bool,
    /// Parse JSX. Output preserves it for the fast pass to lower.
    pub jsx: bool,
}

impl Default for HoistOptions {
    fn default() -> Self {
        Self {
            module_interop: true,
            strip_types: true,
            jsx: true,
        }
    }
}

/// The slow, full-syntax-aware transform pass.
#[derive(Debug, Clone, Default)]
pub struct HoistPass {
    options: HoistOptions,
}

impl HoistPass {
    /// Creates a pass with the given capability set.
    pub fn new(options: HoistOptions) -> Self {
        Self { options }
    }

    /// Rewrites `source`, returning replacement source text for the fast
    /// pass. Comments between top-level statements are not retained.
    pub fn rewrite(&self, source: &str) -> Result<String, HoistError> {
        let cm: Arc<SwcSourceMap> = Default::default();
        let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());
        let file_start = fm.start_pos;

        let syntax = if self.options.strip_types {
            Syntax::Typescript(TsSyntax {
                tsx: self.options.jsx,
                ..Default::default()
            })
        } else {
            Syntax::Es(EsSyntax {
                jsx: self.options.jsx,
                ..Default::default()
            })
        };

        let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
        let module = parser
            .parse_module()
            .map_err(|e| HoistError::Parse(format!("{e:?}")))?;
        if let Some(recovered) = parser.take_errors().into_iter().next() {
            return Err(HoistError::Parse(format!("{recovered:?}")));
        }

        let slice = |span: swc_common::Span| {
            &source[(span.lo - file_start).0 as usize..(span.hi - file_start).0 as usize]
        };

        let mut reordered = String::with_capacity(source.len());
        for item in module.body.iter().filter(|item| is_hoisted_call(item)) {
            push_statement(&mut reordered, slice(item.span()));
        }
        for item in module.body.iter().filter(|item| !is_hoisted_call(item)) {
            push_statement(&mut reordered, slice(item.span()));
        }

        if !self.options.module_interop {
            return Ok(reordered);
        }

        let loader = match (self.options.strip_types, self.options.jsx) {
            (true, true) => Loader::Tsx,
            (true, false) => Loader::Ts,
            (false, true) => Loader::Jsx,
            (false, false) => Loader::Js,
        };
        let lowered = lower(
            &reordered,
            &LowerOptions {
                loader,
                format: Format::Cjs,
                target: Target::EsNext,
                jsx: JsxMode::Preserve,
                jsx_factory: None,
                jsx_fragment: None,
                source_map: None,
            },
        )?;
        Ok(lowered.code)
    }
}

/// True for a top-level expression statement calling a hoist method, either
/// bare (`mock(...)`) or through a member (`jest.mock(...)`).
fn is_hoisted_call(item: &ModuleItem) -> bool {
    let ModuleItem::Stmt(Stmt::Expr(expr_stmt)) = item else {
        return false;
    };
    let Expr::Call(call) = expr_stmt.expr.as_ref() else {
        return false;
    };
    let Callee::Expr(callee) = &call.callee else {
        return false;
    };
    match callee.as_ref() {
        Expr::Ident(ident) => HOIST_METHODS.contains(&ident.sym.as_str()),
        Expr::Member(member) => {
            matches!(&member.prop, MemberProp::Ident(prop) if HOIST_METHODS.contains(&prop.sym.as_str()))
        }
        _ => false,
    }
}

/// Appends a statement slice, terminating it so reordering cannot merge
/// adjacent statements.
fn push_statement(out: &mut String, slice: &str) {
    out.push_str(slice);
    let trimmed = slice.trim_end();
    if !trimmed.ends_with(';') && !trimmed.ends_with('}') {
        out.push(';');
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_matches_each_method() {
        for method in HOIST_METHODS {
            let source = format!("jest.{method}(\"./dep\");");
            assert!(required(&source, false), "{method} should trigger");
        }
    }

    #[test]
    fn test_detector_requires_call_parenthesis() {
        assert!(!required("const mock = 1;", false));
        assert!(!required("jest.mock ;", false));
    }

    #[test]
    fn test_detector_over_matches_comments() {
        // No lexical awareness on purpose: a mention in a comment or string
        // still routes the file through the slow pass.
        assert!(required("// calls jest.mock('./x') somewhere", false));
        assert!(required("const s = \"disableAutomock()\";", false));
    }

    #[test]
    fn test_instrument_forces_pass() {
        assert!(required("export const x = 1;", true));
        assert!(!required("export const x = 1;", false));
    }

    #[test]
    fn test_bare_and_member_calls_hoist() {
        let module_src = "import x from './x';\nmock('./x');\njest.unmock('./y');";
        let pass = HoistPass::new(HoistOptions {
            module_interop: false,
            ..Default::default()
        });
        let out = pass.rewrite(module_src).unwrap();
        let first_import = out.find("import x").unwrap();
        assert!(out.find("mock('./x')").unwrap() < first_import);
        assert!(out.find("jest.unmock('./y')").unwrap() < first_import);
    }
}
