//! Statement-level module lowering and emission.
//!
//! The module is parsed once; top-level statements are then emitted in order
//! as slices of the original text (with strip/JSX edits applied), while
//! import and export statements are rewritten to the CommonJS runtime form.
//! Text between statements (comments, blank lines) passes through, so
//! untouched statements keep their original lines and the synthesized map
//! stays line-accurate.

use crate::edit::{self, Edit};
use crate::strip::{self, Ctx};
use crate::{Format, JsxMode, Loader, LowerError, LowerOptions, Lowered};
use source_map::{LineIndex, MappingsBuilder, SourceMapV3};
use std::sync::Arc;
use swc_common::{FileName, SourceMap as SwcSourceMap, Spanned};
use swc_ecma_ast::*;
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

const INTEROP_HELPER: &str =
    "function _interopDefault(mod) { return mod && mod.__esModule ? mod.default : mod; }";
const EXPORT_STAR_HELPER: &str = "function _exportStar(from, to) { Object.keys(from).forEach(function (key) { if (key !== \"default\" && !(key in to)) to[key] = from[key]; }); return to; }";
const ESMODULE_MARKER: &str =
    "Object.defineProperty(exports, \"__esModule\", { value: true });";

pub(crate) fn lower_script(source: &str, options: &LowerOptions) -> Result<Lowered, LowerError> {
    let cm: Arc<SwcSourceMap> = Default::default();
    let fm = cm.new_source_file(FileName::Anon.into(), source.to_string());
    let file_start = fm.start_pos;

    let syntax = match options.loader {
        Loader::Jsx => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
        Loader::Ts => Syntax::Typescript(TsSyntax {
            tsx: false,
            ..Default::default()
        }),
        Loader::Tsx => Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: false,
            ..Default::default()
        }),
    };

    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    let module = parser
        .parse_module()
        .map_err(|e| LowerError::Parse(format!("{e:?}")))?;
    if let Some(recovered) = parser.take_errors().into_iter().next() {
        return Err(LowerError::Parse(format!("{recovered:?}")));
    }

    let ctx = Ctx {
        src: source,
        file_start,
        jsx: match options.loader {
            Loader::Jsx | Loader::Tsx => options.jsx,
            _ => JsxMode::Preserve,
        },
        jsx_factory: options.jsx_factory.as_deref().unwrap_or("React.createElement"),
        jsx_fragment: options.jsx_fragment.as_deref().unwrap_or("React.Fragment"),
    };

    let (edits, unsupported) = strip::collect_module(&ctx, &module);
    if let Some(reason) = unsupported {
        return Err(LowerError::UnsupportedSyntax(reason));
    }

    let mut emitter = Emitter::new(source);
    match options.format {
        Format::Cjs => emit_cjs(&ctx, &module, &edits, &mut emitter),
        Format::Esm => emit_esm(&ctx, &module, &edits, &mut emitter),
    }

    let map = match &options.source_map {
        Some(file) => Some(
            SourceMapV3::new(file.clone(), source, emitter.mappings.encode()).to_json()?,
        ),
        None => None,
    };

    Ok(Lowered {
        code: emitter.out,
        map,
    })
}

/// Accumulates output text and line mappings against the original source.
struct Emitter {
    out: String,
    generated_line: u32,
    mappings: MappingsBuilder,
    lines: LineIndex,
}

impl Emitter {
    fn new(source: &str) -> Self {
        Self {
            out: String::with_capacity(source.len()),
            generated_line: 0,
            mappings: MappingsBuilder::new(),
            lines: LineIndex::new(source),
        }
    }

    /// Emits synthetic text with no source association.
    fn raw(&mut self, text: &str) {
        self.push(text, None, false);
    }

    /// Emits text derived from the source at `source_offset`. When
    /// `contiguous` is set, every line of the chunk maps to the
    /// corresponding source line; otherwise only the first does.
    fn mapped(&mut self, text: &str, source_offset: u32, contiguous: bool) {
        let line = self.lines.line_of(source_offset);
        self.push(text, Some(line), contiguous);
    }

    fn push(&mut self, text: &str, source_line: Option<u32>, contiguous: bool) {
        if text.is_empty() {
            return;
        }
        if let Some(line) = source_line {
            self.mappings.add(self.generated_line, line);
        }
        let mut source_line = source_line;
        for c in text.chars() {
            if c == '\n' {
                self.generated_line += 1;
                if contiguous {
                    if let Some(line) = source_line.as_mut() {
                        *line += 1;
                        self.mappings.add(self.generated_line, *line);
                    }
                }
            }
        }
        self.out.push_str(text);
    }
}

fn emit_cjs(ctx: &Ctx, module: &Module, edits: &[Edit], em: &mut Emitter) {
    let mut has_exports = false;
    let mut needs_interop = false;
    let mut needs_export_star = false;
    for item in &module.body {
        if let ModuleItem::ModuleDecl(decl) = item {
            match decl {
                ModuleDecl::Import(import) if !import.type_only => {
                    if import
                        .specifiers
                        .iter()
                        .any(|s| matches!(s, ImportSpecifier::Default(_)))
                    {
                        needs_interop = true;
                    }
                }
                ModuleDecl::ExportDecl(export) => {
                    if exported_decl_names(&export.decl).is_some() {
                        has_exports = true;
                    }
                }
                ModuleDecl::ExportNamed(named) if !named.type_only => has_exports = true,
                ModuleDecl::ExportDefaultDecl(export) => {
                    if !matches!(export.decl, DefaultDecl::TsInterfaceDecl(_)) {
                        has_exports = true;
                    }
                }
                ModuleDecl::ExportDefaultExpr(_) => has_exports = true,
                ModuleDecl::ExportAll(export) if !export.type_only => {
                    has_exports = true;
                    needs_export_star = true;
                }
                _ => {}
            }
        }
    }
    if has_exports {
        em.raw(ESMODULE_MARKER);
        em.raw("\n");
    }
    if needs_interop {
        em.raw(INTEROP_HELPER);
        em.raw("\n");
    }
    if needs_export_star {
        em.raw(EXPORT_STAR_HELPER);
        em.raw("\n");
    }

    let mut cursor = 0u32;
    let mut temp_counter = 0usize;

    for item in &module.body {
        let lo = ctx.rel(item.span().lo);
        let hi = ctx.rel(item.span().hi);
        emit_gap(ctx, edits, em, cursor, lo);
        cursor = cursor.max(hi);

        match item {
            ModuleItem::Stmt(_) => emit_slice(ctx, edits, em, lo, hi),
            ModuleItem::ModuleDecl(decl) => {
                emit_module_decl(ctx, decl, edits, em, &mut temp_counter);
            }
        }
    }
    emit_gap(ctx, edits, em, cursor, ctx.src.len() as u32);
}

fn emit_esm(ctx: &Ctx, module: &Module, edits: &[Edit], em: &mut Emitter) {
    let mut cursor = 0u32;
    for item in &module.body {
        let lo = ctx.rel(item.span().lo);
        let hi = ctx.rel(item.span().hi);
        emit_gap(ctx, edits, em, cursor, lo);
        cursor = cursor.max(hi);

        let skip = match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => import.type_only,
            ModuleItem::ModuleDecl(ModuleDecl::ExportNamed(named)) => named.type_only,
            ModuleItem::ModuleDecl(ModuleDecl::ExportAll(export)) => export.type_only,
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                matches!(export.decl, DefaultDecl::TsInterfaceDecl(_))
            }
            _ => false,
        };
        if !skip {
            emit_slice(ctx, edits, em, lo, hi);
        }
    }
    emit_gap(ctx, edits, em, cursor, ctx.src.len() as u32);
}

/// Emits inter-statement text (comments, blank lines). Edits can reach into
/// gaps for modifier keywords that precede a declaration's own span.
fn emit_gap(ctx: &Ctx, edits: &[Edit], em: &mut Emitter, from: u32, to: u32) {
    if from >= to {
        return;
    }
    let text = edit::apply(&ctx.src[from as usize..to as usize], from, edits);
    em.mapped(&text, from, true);
}

fn emit_slice(ctx: &Ctx, edits: &[Edit], em: &mut Emitter, lo: u32, hi: u32) {
    let text = edit::apply(&ctx.src[lo as usize..hi as usize], lo, edits);
    em.mapped(&text, lo, !edit::any_in_range(edits, lo, hi));
}

fn emit_module_decl(
    ctx: &Ctx,
    decl: &ModuleDecl,
    edits: &[Edit],
    em: &mut Emitter,
    temps: &mut usize,
) {
    let lo = ctx.rel(decl.span().lo);
    match decl {
        ModuleDecl::Import(import) => {
            if import.type_only {
                return;
            }
            if let Some(text) = lower_import(ctx, import, temps) {
                em.mapped(&text, lo, false);
            }
        }
        ModuleDecl::ExportDecl(export) => {
            let Some(names) = exported_decl_names(&export.decl) else {
                // Type-only or ambient declaration: erase the whole statement,
                // `export` keyword included, keeping its newlines.
                let hi = ctx.rel(export.span.hi);
                let blanked: String = ctx.src[lo as usize..hi as usize]
                    .chars()
                    .map(|c| if c == '\n' { '\n' } else { ' ' })
                    .collect();
                em.mapped(&blanked, lo, true);
                return;
            };
            let decl_lo = ctx.rel(export.decl.span().lo);
            let decl_hi = ctx.rel(export.decl.span().hi);
            let contiguous = !edit::any_in_range(edits, decl_lo, decl_hi);
            let mut text = ensure_semi(edit::apply(
                &ctx.src[decl_lo as usize..decl_hi as usize],
                decl_lo,
                edits,
            ));
            for name in names {
                text.push_str(&format!(" exports.{name} = {name};"));
            }
            em.mapped(&text, decl_lo, contiguous);
        }
        ModuleDecl::ExportNamed(named) => {
            if named.type_only {
                return;
            }
            if let Some(text) = lower_named_export(ctx, named, temps) {
                em.mapped(&text, lo, false);
            }
        }
        ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
            DefaultDecl::TsInterfaceDecl(_) => {}
            DefaultDecl::Fn(fn_expr) => {
                let body_lo = ctx.rel(fn_expr.function.span.lo);
                let body_hi = ctx.rel(fn_expr.function.span.hi);
                let body = edit::apply(
                    &ctx.src[body_lo as usize..body_hi as usize],
                    body_lo,
                    edits,
                );
                let text = match &fn_expr.ident {
                    Some(ident) => format!("{body} exports.default = {};", ident.sym),
                    None => format!("exports.default = {body};"),
                };
                em.mapped(&text, body_lo, false);
            }
            DefaultDecl::Class(class_expr) => {
                let body_lo = ctx.rel(class_expr.class.span.lo);
                let body_hi = ctx.rel(class_expr.class.span.hi);
                let body = edit::apply(
                    &ctx.src[body_lo as usize..body_hi as usize],
                    body_lo,
                    edits,
                );
                let text = match &class_expr.ident {
                    Some(ident) => format!("{body} exports.default = {};", ident.sym),
                    None => format!("exports.default = {body};"),
                };
                em.mapped(&text, body_lo, false);
            }
        },
        ModuleDecl::ExportDefaultExpr(export) => {
            let expr_lo = ctx.rel(export.expr.span().lo);
            let expr_hi = ctx.rel(export.expr.span().hi);
            let body = edit::apply(
                &ctx.src[expr_lo as usize..expr_hi as usize],
                expr_lo,
                edits,
            );
            em.mapped(&format!("exports.default = {body};"), expr_lo, false);
        }
        ModuleDecl::ExportAll(export) => {
            if export.type_only {
                return;
            }
            let src_text = ctx.slice(export.src.span);
            em.mapped(
                &format!("_exportStar(require({src_text}), exports);"),
                lo,
                false,
            );
        }
        // Rejected by the strip pass (or blanked when type-only).
        ModuleDecl::TsImportEquals(_)
        | ModuleDecl::TsExportAssignment(_)
        | ModuleDecl::TsNamespaceExport(_) => {}
    }
}

fn lower_import(ctx: &Ctx, import: &ImportDecl, temps: &mut usize) -> Option<String> {
    let src_text = ctx.slice(import.src.span);

    if import.specifiers.is_empty() {
        return Some(format!("require({src_text});"));
    }

    let mut default_name = None;
    let mut namespace_name = None;
    let mut named = Vec::new();
    for spec in &import.specifiers {
        match spec {
            ImportSpecifier::Default(spec) => default_name = Some(spec.local.sym.to_string()),
            ImportSpecifier::Namespace(spec) => {
                namespace_name = Some(spec.local.sym.to_string())
            }
            ImportSpecifier::Named(spec) => {
                if spec.is_type_only {
                    continue;
                }
                let local = spec.local.sym.to_string();
                let pattern = match &spec.imported {
                    None => local,
                    Some(ModuleExportName::Ident(ident)) if ident.sym == spec.local.sym => local,
                    Some(ModuleExportName::Ident(ident)) => format!("{}: {local}", ident.sym),
                    Some(ModuleExportName::Str(s)) => {
                        format!("{}: {local}", ctx.slice(s.span))
                    }
                };
                named.push(pattern);
            }
        }
    }

    let binding_groups = usize::from(default_name.is_some())
        + usize::from(namespace_name.is_some())
        + usize::from(!named.is_empty());
    match binding_groups {
        // Every binding was type-only; the import is elided entirely.
        0 => None,
        1 => {
            if let Some(name) = namespace_name {
                Some(format!("const {name} = require({src_text});"))
            } else if let Some(name) = default_name {
                Some(format!("const {name} = _interopDefault(require({src_text}));"))
            } else {
                Some(format!(
                    "const {{ {} }} = require({src_text});",
                    named.join(", ")
                ))
            }
        }
        _ => {
            let temp = next_temp(temps);
            let mut out = format!("const {temp} = require({src_text});");
            if let Some(name) = namespace_name {
                out.push_str(&format!(" const {name} = {temp};"));
            }
            if let Some(name) = default_name {
                out.push_str(&format!(" const {name} = _interopDefault({temp});"));
            }
            if !named.is_empty() {
                out.push_str(&format!(" const {{ {} }} = {temp};", named.join(", ")));
            }
            Some(out)
        }
    }
}

fn lower_named_export(ctx: &Ctx, named: &NamedExport, temps: &mut usize) -> Option<String> {
    let mut parts = Vec::new();

    match &named.src {
        Some(src) => {
            let runtime_specs: Vec<_> = named
                .specifiers
                .iter()
                .filter(|spec| {
                    !matches!(spec, ExportSpecifier::Named(named) if named.is_type_only)
                })
                .collect();
            if runtime_specs.is_empty() {
                return None;
            }
            let src_text = ctx.slice(src.span);
            let temp = next_temp(temps);
            parts.push(format!("const {temp} = require({src_text});"));
            for spec in runtime_specs {
                match spec {
                    ExportSpecifier::Named(spec) => {
                        let orig = export_name(ctx, &spec.orig);
                        let exported = spec
                            .exported
                            .as_ref()
                            .map(|name| export_name(ctx, name))
                            .unwrap_or_else(|| orig.clone());
                        parts.push(format!(
                            "{} = {temp}{};",
                            export_target(&exported),
                            member_access(&orig)
                        ));
                    }
                    ExportSpecifier::Namespace(spec) => {
                        let name = export_name(ctx, &spec.name);
                        parts.push(format!("{} = {temp};", export_target(&name)));
                    }
                    ExportSpecifier::Default(_) => {
                        parts.push(format!("exports.default = {temp}.default;"));
                    }
                }
            }
        }
        None => {
            for spec in &named.specifiers {
                if let ExportSpecifier::Named(spec) = spec {
                    if spec.is_type_only {
                        continue;
                    }
                    let orig = export_name(ctx, &spec.orig);
                    let exported = spec
                        .exported
                        .as_ref()
                        .map(|name| export_name(ctx, name))
                        .unwrap_or_else(|| orig.clone());
                    parts.push(format!("{} = {orig};", export_target(&exported)));
                }
            }
            if parts.is_empty() {
                return None;
            }
        }
    }

    Some(parts.join(" "))
}

/// Names bound by an exported declaration, or `None` when the declaration has
/// no runtime presence (types, overload signatures, ambient declarations).
fn exported_decl_names(decl: &Decl) -> Option<Vec<String>> {
    match decl {
        Decl::Var(var) if !var.declare => {
            let mut names = Vec::new();
            for declarator in &var.decls {
                pat_names(&declarator.name, &mut names);
            }
            Some(names)
        }
        Decl::Fn(f) if !f.declare && f.function.body.is_some() => {
            Some(vec![f.ident.sym.to_string()])
        }
        Decl::Class(c) if !c.declare => Some(vec![c.ident.sym.to_string()]),
        Decl::TsEnum(e) if !e.declare => Some(vec![e.id.sym.to_string()]),
        _ => None,
    }
}

fn pat_names(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(ident) => out.push(ident.id.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pat_names(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(assign.key.id.sym.to_string()),
                    ObjectPatProp::Rest(rest) => pat_names(&rest.arg, out),
                }
            }
        }
        Pat::Rest(rest) => pat_names(&rest.arg, out),
        Pat::Assign(assign) => pat_names(&assign.left, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

fn export_name(ctx: &Ctx, name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s
            .value
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| ctx.slice(s.span).trim_matches(['"', '\'']).to_string()),
    }
}

fn export_target(name: &str) -> String {
    if crate::is_js_ident(name) {
        format!("exports.{name}")
    } else {
        format!("exports[{}]", crate::string_literal(name))
    }
}

fn member_access(name: &str) -> String {
    if crate::is_js_ident(name) {
        format!(".{name}")
    } else {
        format!("[{}]", crate::string_literal(name))
    }
}

fn next_temp(temps: &mut usize) -> String {
    let name = format!("_mod{}", *temps);
    *temps += 1;
    name
}

fn ensure_semi(mut text: String) -> String {
    let trimmed = text.trim_end();
    if !trimmed.ends_with(';') && !trimmed.ends_with('}') {
        text.push(';');
    }
    text
}
