//! Byte offset to line/column lookup.

use text_size::TextSize;

/// A line and column position (0-indexed, columns in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed byte column within the line.
    pub col: u32,
}

/// Precomputed line-start offsets for a source text.
///
/// Lookups clamp out-of-range offsets to the last line, which is the behavior
/// the emitters want when a span ends exactly at the end of input.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    /// Builds the index for `text`.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        for (offset, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(TextSize::from(offset as u32 + 1));
            }
        }
        Self { line_starts }
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the 0-indexed line containing `offset`.
    pub fn line_of(&self, offset: u32) -> u32 {
        let offset = TextSize::from(offset);
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line as u32,
            Err(line) => (line - 1) as u32,
        }
    }

    /// Returns the line/column position of `offset`.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let line = self.line_of(offset);
        let line_start = u32::from(self.line_starts[line as usize]);
        LineCol {
            line,
            col: offset.saturating_sub(line_start),
        }
    }
}
