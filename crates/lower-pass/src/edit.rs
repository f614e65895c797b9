//! Ranged text edits over the original source.
//!
//! The strip and JSX passes never rebuild statements from the AST; they
//! record byte-range edits against the original text and the emitter applies
//! whichever edits fall inside the slice it is copying.

/// Replacement payload for an edit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Repl {
    /// Erase the range. Erased bytes become spaces and newlines survive, so
    /// line and column structure is preserved.
    Blank,
    /// Replace the range with new text.
    Text(String),
}

/// A replacement applied to a byte range of the original source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Edit {
    pub start: u32,
    pub end: u32,
    pub repl: Repl,
}

impl Edit {
    pub fn blank(start: u32, end: u32) -> Self {
        Self {
            start,
            end,
            repl: Repl::Blank,
        }
    }

    pub fn replace(start: u32, end: u32, text: String) -> Self {
        Self {
            start,
            end,
            repl: Repl::Text(text),
        }
    }

    pub fn insert(at: u32, text: String) -> Self {
        Self::replace(at, at, text)
    }
}

/// Applies the subset of `edits` that fall inside `slice` to it.
///
/// `base` is the byte offset of `slice` within the original source. Edits are
/// applied in order; blank edits nested in an outer blank merge with it, and
/// anything contained in a replacement is dropped (replacements are generated
/// for whole subtrees).
pub(crate) fn apply(slice: &str, base: u32, edits: &[Edit]) -> String {
    let limit = base + slice.len() as u32;
    let mut in_range: Vec<&Edit> = edits
        .iter()
        .filter(|e| e.start >= base && e.end <= limit)
        .collect();
    in_range.sort_by_key(|e| (e.start, std::cmp::Reverse(e.end)));

    let mut out = String::with_capacity(slice.len());
    let mut cursor = base;
    for edit in in_range {
        if edit.start < cursor {
            // Overlaps an already-applied edit; extend a trailing blank,
            // otherwise it was contained in a replacement.
            if edit.end > cursor && matches!(edit.repl, Repl::Blank) {
                blank_into(&mut out, &slice[(cursor - base) as usize..(edit.end - base) as usize]);
                cursor = edit.end;
            }
            continue;
        }
        out.push_str(&slice[(cursor - base) as usize..(edit.start - base) as usize]);
        match &edit.repl {
            Repl::Blank => blank_into(
                &mut out,
                &slice[(edit.start - base) as usize..(edit.end - base) as usize],
            ),
            Repl::Text(text) => out.push_str(text),
        }
        cursor = edit.end;
    }
    out.push_str(&slice[(cursor - base) as usize..]);
    out
}

/// Returns true if any edit touches the given range.
pub(crate) fn any_in_range(edits: &[Edit], start: u32, end: u32) -> bool {
    edits.iter().any(|e| e.start >= start && e.end <= end)
}

fn blank_into(out: &mut String, erased: &str) {
    for c in erased.chars() {
        out.push(if c == '\n' { '\n' } else { ' ' });
    }
}
