//! Typed-syntax erasure.
//!
//! A single visitor walks the parsed module and records edits for every piece
//! of TypeScript-only syntax: annotations, generics, interfaces, aliases,
//! `declare` items, assertion operators, accessibility modifiers, and
//! overload signatures. Enums and constructor parameter properties have
//! runtime semantics, so they are rewritten rather than erased. JSX nodes are
//! handed to the JSX generator (or preserved) depending on the mode.

use crate::edit::Edit;
use crate::jsx;
use crate::JsxMode;
use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

/// Modifier keywords that exist only in the type system.
const TS_MODIFIERS: [&str; 7] = [
    "public",
    "private",
    "protected",
    "readonly",
    "override",
    "abstract",
    "declare",
];

/// Shared context for the strip and JSX passes.
pub(crate) struct Ctx<'a> {
    pub src: &'a str,
    pub file_start: BytePos,
    pub jsx: JsxMode,
    pub jsx_factory: &'a str,
    pub jsx_fragment: &'a str,
}

impl Ctx<'_> {
    /// Converts a parser position to a byte offset into `src`.
    pub fn rel(&self, pos: BytePos) -> u32 {
        (pos - self.file_start).0
    }

    /// Returns the source text covered by `span`.
    pub fn slice(&self, span: Span) -> &str {
        &self.src[self.rel(span.lo) as usize..self.rel(span.hi) as usize]
    }
}

/// Collects edits for a whole module.
pub(crate) fn collect_module(ctx: &Ctx, module: &Module) -> (Vec<Edit>, Option<String>) {
    let mut collector = EditCollector {
        ctx,
        edits: Vec::new(),
        unsupported: None,
    };
    module.visit_with(&mut collector);
    (collector.edits, collector.unsupported)
}

/// Collects edits for a single expression subtree (used for JSX children and
/// attribute values, which are generated out of line).
pub(crate) fn collect_expr(ctx: &Ctx, expr: &Expr) -> (Vec<Edit>, Option<String>) {
    let mut collector = EditCollector {
        ctx,
        edits: Vec::new(),
        unsupported: None,
    };
    expr.visit_with(&mut collector);
    (collector.edits, collector.unsupported)
}

struct EditCollector<'a> {
    ctx: &'a Ctx<'a>,
    edits: Vec<Edit>,
    unsupported: Option<String>,
}

impl EditCollector<'_> {
    fn fail(&mut self, reason: impl Into<String>) {
        if self.unsupported.is_none() {
            self.unsupported = Some(reason.into());
        }
    }

    fn blank_span(&mut self, span: Span) {
        self.edits
            .push(Edit::blank(self.ctx.rel(span.lo), self.ctx.rel(span.hi)));
    }

    fn blank_range(&mut self, start: u32, end: u32) {
        if start < end {
            self.edits.push(Edit::blank(start, end));
        }
    }

    /// Blanks a single `?` or `!` marker following `pos`, skipping whitespace.
    fn blank_marker_after(&mut self, pos: BytePos, marker: u8) {
        let bytes = self.ctx.src.as_bytes();
        let mut i = self.ctx.rel(pos) as usize;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == marker {
            self.blank_range(i as u32, i as u32 + 1);
        }
    }

    /// Blanks TypeScript-only modifier keywords in `[start, end)`, leaving
    /// runtime modifiers (`static`, `async`, `get`, ...) alone.
    fn blank_modifiers(&mut self, start: BytePos, end: BytePos) {
        let lo = self.ctx.rel(start) as usize;
        let hi = self.ctx.rel(end) as usize;
        for (word_start, word) in ident_words(&self.ctx.src[lo..hi]) {
            if TS_MODIFIERS.contains(&word) {
                let at = (lo + word_start) as u32;
                self.blank_range(at, at + word.len() as u32);
            }
        }
    }

    /// Blanks `keyword` when it sits immediately before `pos`, outside the
    /// node's own span.
    fn blank_keyword_before(&mut self, pos: BytePos, keyword: &str) {
        let before = &self.ctx.src[..self.ctx.rel(pos) as usize];
        let trimmed = before.trim_end();
        if trimmed.ends_with(keyword) {
            let start = trimmed.len() - keyword.len();
            let boundary = trimmed[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_' && c != '$');
            if boundary {
                self.blank_range(start as u32, trimmed.len() as u32);
            }
        }
    }

    /// Blanks a list entry together with one adjacent comma, keeping the
    /// surrounding list valid (used for inline `type` specifiers).
    fn blank_list_item(&mut self, span: Span) {
        self.blank_span(span);
        let bytes = self.ctx.src.as_bytes();
        let mut i = self.ctx.rel(span.hi) as usize;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b',' {
            self.blank_range(i as u32, i as u32 + 1);
            return;
        }
        let mut j = self.ctx.rel(span.lo) as usize;
        while j > 0 && bytes[j - 1].is_ascii_whitespace() {
            j -= 1;
        }
        if j > 0 && bytes[j - 1] == b',' {
            self.blank_range(j as u32 - 1, j as u32);
        }
    }
}

impl Visit for EditCollector<'_> {
    fn visit_ts_type_ann(&mut self, node: &TsTypeAnn) {
        self.blank_span(node.span);
    }

    fn visit_ts_type_param_decl(&mut self, node: &TsTypeParamDecl) {
        self.blank_span(node.span);
    }

    fn visit_ts_type_param_instantiation(&mut self, node: &TsTypeParamInstantiation) {
        self.blank_span(node.span);
    }

    fn visit_ts_as_expr(&mut self, node: &TsAsExpr) {
        self.blank_range(self.ctx.rel(node.expr.span().hi), self.ctx.rel(node.span.hi));
        node.expr.visit_with(self);
    }

    fn visit_ts_satisfies_expr(&mut self, node: &TsSatisfiesExpr) {
        self.blank_range(self.ctx.rel(node.expr.span().hi), self.ctx.rel(node.span.hi));
        node.expr.visit_with(self);
    }

    fn visit_ts_const_assertion(&mut self, node: &TsConstAssertion) {
        self.blank_range(self.ctx.rel(node.expr.span().hi), self.ctx.rel(node.span.hi));
        node.expr.visit_with(self);
    }

    fn visit_ts_non_null_expr(&mut self, node: &TsNonNullExpr) {
        self.blank_range(self.ctx.rel(node.expr.span().hi), self.ctx.rel(node.span.hi));
        node.expr.visit_with(self);
    }

    fn visit_ts_type_assertion(&mut self, node: &TsTypeAssertion) {
        self.blank_range(self.ctx.rel(node.span.lo), self.ctx.rel(node.expr.span().lo));
        node.expr.visit_with(self);
    }

    fn visit_ts_instantiation(&mut self, node: &TsInstantiation) {
        self.blank_range(self.ctx.rel(node.expr.span().hi), self.ctx.rel(node.span.hi));
        node.expr.visit_with(self);
    }

    fn visit_binding_ident(&mut self, node: &BindingIdent) {
        if node.id.optional {
            self.blank_marker_after(node.id.span.hi, b'?');
        }
        node.visit_children_with(self);
    }

    fn visit_ts_interface_decl(&mut self, node: &TsInterfaceDecl) {
        self.blank_span(node.span);
        self.blank_keyword_before(node.span.lo, "declare");
    }

    fn visit_ts_type_alias_decl(&mut self, node: &TsTypeAliasDecl) {
        self.blank_span(node.span);
        self.blank_keyword_before(node.span.lo, "declare");
    }

    fn visit_ts_enum_decl(&mut self, node: &TsEnumDecl) {
        if node.declare {
            self.blank_span(node.span);
            self.blank_keyword_before(node.span.lo, "declare");
            return;
        }
        match lower_enum(self.ctx, node) {
            Ok(text) => self.edits.push(Edit::replace(
                self.ctx.rel(node.span.lo),
                self.ctx.rel(node.span.hi),
                text,
            )),
            Err(reason) => self.fail(reason),
        }
    }

    fn visit_ts_module_decl(&mut self, node: &TsModuleDecl) {
        if node.declare || node.global {
            self.blank_span(node.span);
            self.blank_keyword_before(node.span.lo, "declare");
        } else {
            self.fail("TypeScript namespaces are not supported");
        }
    }

    fn visit_ts_import_equals_decl(&mut self, node: &TsImportEqualsDecl) {
        if node.is_type_only {
            self.blank_span(node.span);
        } else {
            self.fail("TypeScript `import =` declarations are not supported");
        }
    }

    fn visit_ts_export_assignment(&mut self, _node: &TsExportAssignment) {
        self.fail("TypeScript `export =` assignments are not supported");
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        if node.declare || node.function.body.is_none() {
            self.blank_span(node.function.span);
            self.blank_keyword_before(node.function.span.lo, "declare");
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_var_decl(&mut self, node: &VarDecl) {
        if node.declare {
            self.blank_span(node.span);
            self.blank_keyword_before(node.span.lo, "declare");
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        if node.definite {
            if let Pat::Ident(ident) = &node.name {
                self.blank_marker_after(ident.id.span.hi, b'!');
            }
        }
        node.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        if node.declare {
            self.blank_span(node.class.span);
            self.blank_keyword_before(node.class.span.lo, "declare");
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_class(&mut self, node: &Class) {
        if node.is_abstract {
            let lo = self.ctx.rel(node.span.lo) as usize;
            let slice = &self.ctx.src[lo..self.ctx.rel(node.span.hi) as usize];
            if let Some(class_at) = find_keyword(slice, "class") {
                for (word_start, word) in ident_words(&slice[..class_at]) {
                    if word == "abstract" {
                        let at = (lo + word_start) as u32;
                        self.blank_range(at, at + word.len() as u32);
                    }
                }
            }
            self.blank_keyword_before(node.span.lo, "abstract");
        }
        if let (Some(first), Some(last)) = (node.implements.first(), node.implements.last()) {
            let search_lo = self.ctx.rel(node.span.lo) as usize;
            let first_lo = self.ctx.rel(first.span.lo) as usize;
            if let Some(idx) = self.ctx.src[search_lo..first_lo].rfind("implements") {
                self.blank_range((search_lo + idx) as u32, self.ctx.rel(last.span.hi));
            }
        }
        node.visit_children_with(self);
    }

    fn visit_class_prop(&mut self, node: &ClassProp) {
        if node.declare || node.is_abstract {
            self.blank_span(node.span);
            return;
        }
        self.blank_modifiers(node.span.lo, node.key.span().lo);
        if node.is_optional {
            self.blank_marker_after(node.key.span().hi, b'?');
        }
        if node.definite {
            self.blank_marker_after(node.key.span().hi, b'!');
        }
        node.visit_children_with(self);
    }

    fn visit_private_prop(&mut self, node: &PrivateProp) {
        self.blank_modifiers(node.span.lo, node.key.span.lo);
        if node.is_optional {
            self.blank_marker_after(node.key.span.hi, b'?');
        }
        if node.definite {
            self.blank_marker_after(node.key.span.hi, b'!');
        }
        node.visit_children_with(self);
    }

    fn visit_class_method(&mut self, node: &ClassMethod) {
        if node.is_abstract || node.function.body.is_none() {
            self.blank_span(node.span);
            return;
        }
        self.blank_modifiers(node.span.lo, node.key.span().lo);
        if node.is_optional {
            self.blank_marker_after(node.key.span().hi, b'?');
        }
        node.visit_children_with(self);
    }

    fn visit_private_method(&mut self, node: &PrivateMethod) {
        if node.is_abstract || node.function.body.is_none() {
            self.blank_span(node.span);
            return;
        }
        self.blank_modifiers(node.span.lo, node.key.span.lo);
        if node.is_optional {
            self.blank_marker_after(node.key.span.hi, b'?');
        }
        node.visit_children_with(self);
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        let mut assignments = String::new();
        for param in &node.params {
            if let ParamOrTsParamProp::TsParamProp(prop) = param {
                let name = match &prop.param {
                    TsParamPropParam::Ident(ident) => Some(ident.id.sym.to_string()),
                    TsParamPropParam::Assign(assign) => match assign.left.as_ref() {
                        Pat::Ident(ident) => Some(ident.id.sym.to_string()),
                        _ => None,
                    },
                };
                let Some(name) = name else {
                    self.fail("destructured constructor parameter properties are not supported");
                    continue;
                };
                self.blank_modifiers(prop.span.lo, prop.param.span().lo);
                assignments.push_str(&format!("this.{name} = {name}; "));
            }
        }
        if !assignments.is_empty() {
            if let Some(body) = &node.body {
                self.edits.push(Edit::insert(
                    self.ctx.rel(body.span.lo) + 1,
                    format!(" {}", assignments.trim_end()),
                ));
            }
        }
        node.visit_children_with(self);
    }

    fn visit_ts_index_signature(&mut self, node: &TsIndexSignature) {
        self.blank_span(node.span);
    }

    fn visit_import_named_specifier(&mut self, node: &ImportNamedSpecifier) {
        if node.is_type_only {
            self.blank_list_item(node.span);
        }
    }

    fn visit_export_named_specifier(&mut self, node: &ExportNamedSpecifier) {
        if node.is_type_only {
            self.blank_list_item(node.span);
        }
    }

    fn visit_jsx_element(&mut self, node: &JSXElement) {
        match self.ctx.jsx {
            JsxMode::Transform => match jsx::element(self.ctx, node) {
                Ok(text) => self.edits.push(Edit::replace(
                    self.ctx.rel(node.span.lo),
                    self.ctx.rel(node.span.hi),
                    text,
                )),
                Err(reason) => self.fail(reason),
            },
            JsxMode::Preserve => node.visit_children_with(self),
        }
    }

    fn visit_jsx_fragment(&mut self, node: &JSXFragment) {
        match self.ctx.jsx {
            JsxMode::Transform => match jsx::fragment(self.ctx, node) {
                Ok(text) => self.edits.push(Edit::replace(
                    self.ctx.rel(node.span.lo),
                    self.ctx.rel(node.span.hi),
                    text,
                )),
                Err(reason) => self.fail(reason),
            },
            JsxMode::Preserve => node.visit_children_with(self),
        }
    }
}

/// Lowers an enum declaration to its runtime IIFE form.
fn lower_enum(ctx: &Ctx, node: &TsEnumDecl) -> Result<String, String> {
    let name = node.id.sym.as_str();
    let mut body = String::new();
    let mut next_auto: Option<i64> = Some(0);

    for member in &node.members {
        let key = match &member.id {
            TsEnumMemberId::Ident(ident) => crate::string_literal(ident.sym.as_str()),
            TsEnumMemberId::Str(s) => ctx.slice(s.span).to_string(),
        };
        match member.init.as_deref() {
            Some(Expr::Lit(Lit::Str(s))) => {
                let value = ctx.slice(s.span);
                body.push_str(&format!("{name}[{key}] = {value}; "));
                next_auto = None;
            }
            Some(Expr::Lit(Lit::Num(num))) => {
                let value = ctx.slice(num.span);
                body.push_str(&format!("{name}[{name}[{key}] = {value}] = {key}; "));
                next_auto = if num.value.fract() == 0.0 {
                    Some(num.value as i64 + 1)
                } else {
                    None
                };
            }
            Some(expr) => {
                let value = ctx.slice(expr.span());
                body.push_str(&format!("{name}[{name}[{key}] = ({value})] = {key}; "));
                next_auto = None;
            }
            None => {
                let Some(value) = next_auto else {
                    return Err(format!(
                        "enum member {key} requires an initializer after a non-numeric member"
                    ));
                };
                body.push_str(&format!("{name}[{name}[{key}] = {value}] = {key}; "));
                next_auto = Some(value + 1);
            }
        }
    }

    Ok(format!(
        "var {name}; (function ({name}) {{ {}}})({name} || ({name} = {{}}));",
        body
    ))
}

/// Yields identifier-shaped words in `text` with their byte offsets.
fn ident_words(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        let is_ident = c.is_ascii_alphanumeric() || c == '_' || c == '$';
        match (start, is_ident) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                words.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}

/// Finds `keyword` as a whole word in `text`.
fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    ident_words(text)
        .into_iter()
        .find(|(_, word)| *word == keyword)
        .map(|(at, _)| at)
}
