//! Loader resolution from file paths.
//!
//! Resolution is total: explicit override by compound extension key, then the
//! default extension whitelist, then plain text. There is no failure path.

use camino::Utf8Path;
use lower_pass::Loader;
use smol_str::SmolStr;
use std::collections::HashMap;

/// Computes the compound extension key used for loader overrides.
///
/// A base name with a single dot yields its extension (`widget.tsx` →
/// `.tsx`); more dots yield everything from the first dot through the last
/// dot plus the final extension (`widget.test.tsx` → `.test.tsx`), which
/// lets configuration special-case double-extension patterns independently
/// of the plain extension.
pub fn extension_key(path: &Utf8Path) -> SmolStr {
    let base = path.file_name().unwrap_or_default();
    let Some(first) = base.find('.') else {
        return SmolStr::default();
    };
    let last = base.rfind('.').unwrap_or(first);
    if last == 0 {
        // Dotfile with no further dot: no extension.
        return SmolStr::default();
    }
    let ext = normalize_ext(&base[last..]);
    if first == last {
        SmolStr::new(ext)
    } else {
        SmolStr::new(format!("{}{ext}", &base[first..last]))
    }
}

/// Trims a trailing extension to its first alphanumeric dot-group, so
/// query-style suffixes (`.ts?raw`) do not defeat override keys.
fn normalize_ext(ext: &str) -> &str {
    match ext[1..].find(|c: char| !c.is_ascii_alphanumeric()) {
        Some(0) | None => ext,
        Some(end) => &ext[..end + 1],
    }
}

/// The simple trailing extension, lower-cased, without the leading dot.
fn simple_extension(path: &Utf8Path) -> String {
    let base = path.file_name().unwrap_or_default();
    match base.rfind('.') {
        Some(at) if at > 0 => base[at + 1..].to_ascii_lowercase(),
        _ => String::new(),
    }
}

fn default_loader(ext: &str) -> Option<Loader> {
    match ext {
        "js" => Some(Loader::Js),
        "jsx" => Some(Loader::Jsx),
        "ts" => Some(Loader::Ts),
        "tsx" => Some(Loader::Tsx),
        "json" => Some(Loader::Json),
        _ => None,
    }
}

/// Resolves the loader for `path` against the configured overrides.
pub fn resolve_loader(path: &Utf8Path, overrides: &HashMap<String, Loader>) -> Loader {
    if let Some(loader) = overrides.get(extension_key(path).as_str()) {
        return *loader;
    }
    default_loader(&simple_extension(path)).unwrap_or(Loader::Text)
}
