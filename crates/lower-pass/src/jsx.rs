//! JSX lowering to factory calls.
//!
//! Elements are generated recursively from the AST; embedded expressions are
//! sliced from the original text with their own edits (nested JSX, type
//! assertions) applied first.

use crate::edit;
use crate::strip::{self, Ctx};
use crate::{is_js_ident, string_literal};
use swc_common::Spanned;
use swc_ecma_ast::*;

type GenResult = Result<String, String>;

/// Generates the factory call for an element.
pub(crate) fn element(ctx: &Ctx, el: &JSXElement) -> GenResult {
    let tag = tag_text(ctx, &el.opening.name);
    let props = props_text(ctx, &el.opening.attrs)?;
    let children = children_text(ctx, &el.children)?;
    Ok(call(ctx.jsx_factory, &tag, &props, &children))
}

/// Generates the factory call for a fragment.
pub(crate) fn fragment(ctx: &Ctx, frag: &JSXFragment) -> GenResult {
    let children = children_text(ctx, &frag.children)?;
    Ok(call(ctx.jsx_factory, ctx.jsx_fragment, "null", &children))
}

fn call(factory: &str, tag: &str, props: &str, children: &[String]) -> String {
    let mut out = format!("{factory}({tag}, {props}");
    for child in children {
        out.push_str(", ");
        out.push_str(child);
    }
    out.push(')');
    out
}

fn tag_text(ctx: &Ctx, name: &JSXElementName) -> String {
    match name {
        JSXElementName::Ident(ident) => {
            let sym = ident.sym.as_str();
            let intrinsic = sym
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_lowercase())
                || sym.contains('-');
            if intrinsic {
                string_literal(sym)
            } else {
                sym.to_string()
            }
        }
        JSXElementName::JSXMemberExpr(member) => ctx.slice(member.span()).to_string(),
        JSXElementName::JSXNamespacedName(name) => {
            string_literal(&format!("{}:{}", name.ns.sym, name.name.sym))
        }
    }
}

fn props_text(ctx: &Ctx, attrs: &[JSXAttrOrSpread]) -> GenResult {
    if attrs.is_empty() {
        return Ok("null".to_string());
    }

    let mut parts = Vec::with_capacity(attrs.len());
    for attr in attrs {
        match attr {
            JSXAttrOrSpread::JSXAttr(attr) => {
                let key = match &attr.name {
                    JSXAttrName::Ident(ident) => prop_key(ident.sym.as_str()),
                    JSXAttrName::JSXNamespacedName(name) => {
                        string_literal(&format!("{}:{}", name.ns.sym, name.name.sym))
                    }
                };
                let value = match &attr.value {
                    None => "true".to_string(),
                    Some(JSXAttrValue::Str(lit)) => ctx.slice(lit.span()).to_string(),
                    Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                        JSXExpr::Expr(expr) => expr_text(ctx, expr)?,
                        JSXExpr::JSXEmptyExpr(_) => "true".to_string(),
                    },
                    Some(JSXAttrValue::JSXElement(el)) => element(ctx, el)?,
                    Some(JSXAttrValue::JSXFragment(frag)) => fragment(ctx, frag)?,
                };
                parts.push(format!("{key}: {value}"));
            }
            JSXAttrOrSpread::SpreadElement(spread) => {
                parts.push(format!("...{}", expr_text(ctx, &spread.expr)?));
            }
        }
    }

    Ok(format!("{{ {} }}", parts.join(", ")))
}

fn children_text(ctx: &Ctx, children: &[JSXElementChild]) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    for child in children {
        match child {
            JSXElementChild::JSXText(text) => {
                if let Some(literal) = text_literal(ctx.slice(text.span)) {
                    out.push(literal);
                }
            }
            JSXElementChild::JSXExprContainer(container) => match &container.expr {
                JSXExpr::Expr(expr) => out.push(expr_text(ctx, expr)?),
                JSXExpr::JSXEmptyExpr(_) => {}
            },
            JSXElementChild::JSXElement(el) => out.push(element(ctx, el)?),
            JSXElementChild::JSXFragment(frag) => out.push(fragment(ctx, frag)?),
            JSXElementChild::JSXSpreadChild(_) => {
                return Err("JSX spread children are not supported".to_string());
            }
        }
    }
    Ok(out)
}

/// Slices an embedded expression, applying the edits of its own subtree.
fn expr_text(ctx: &Ctx, expr: &Expr) -> GenResult {
    let (edits, unsupported) = strip::collect_expr(ctx, expr);
    if let Some(reason) = unsupported {
        return Err(reason);
    }
    let base = ctx.rel(expr.span().lo);
    let text = edit::apply(ctx.slice(expr.span()), base, &edits);
    // A sequence expression would split into extra call arguments.
    if matches!(expr, Expr::Seq(_)) {
        Ok(format!("({text})"))
    } else {
        Ok(text)
    }
}

/// Collapses JSX text the way the syntax defines it: lines are trimmed,
/// whitespace-only lines vanish, and the remainder joins with single spaces.
/// Single-line text keeps its spacing.
fn text_literal(raw: &str) -> Option<String> {
    let collapsed = if raw.contains('\n') {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        raw.to_string()
    };
    if collapsed.is_empty() {
        None
    } else {
        Some(string_literal(&collapsed))
    }
}

fn prop_key(name: &str) -> String {
    if is_js_ident(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_literal_single_line_keeps_spaces() {
        assert_eq!(text_literal(" hi there "), Some("\" hi there \"".to_string()));
    }

    #[test]
    fn test_text_literal_collapses_lines() {
        assert_eq!(
            text_literal("\n    hello\n    world\n  "),
            Some("\"hello world\"".to_string())
        );
        assert_eq!(text_literal("\n   \n"), None);
    }

    #[test]
    fn test_prop_key_quoting() {
        assert_eq!(prop_key("className"), "className");
        assert_eq!(prop_key("data-id"), "\"data-id\"");
    }
}
