//! Character-offset helpers.
//!
//! Every offset in the content model counts Unicode scalar values, while Rust
//! strings are indexed by byte. These helpers translate between the two.

use std::ops::Range;

/// Number of characters in `s`.
#[inline]
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `char_idx`-th character, or `s.len()` past the end.
#[inline]
pub fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// Byte range for a character range.
pub fn byte_range(s: &str, range: &Range<usize>) -> Range<usize> {
    let start = byte_index(s, range.start);
    let end = start + byte_index(&s[start..], range.end - range.start);
    start..end
}

/// Slice `s` by character range.
pub fn slice<'a>(s: &'a str, range: &Range<usize>) -> &'a str {
    &s[byte_range(s, range)]
}

/// Character ranges of every line in `s`, excluding the `\n` terminators.
///
/// Always yields at least one (possibly empty) line.
pub fn line_ranges(s: &str) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut pos = 0;
    for c in s.chars() {
        if c == '\n' {
            lines.push(start..pos);
            start = pos + 1;
        }
        pos += 1;
    }
    lines.push(start..pos);
    lines
}

/// Index into [`line_ranges`] of the line holding `offset`.
pub fn line_at(lines: &[Range<usize>], offset: usize) -> usize {
    lines
        .iter()
        .position(|l| offset >= l.start && offset <= l.end)
        .unwrap_or(lines.len().saturating_sub(1))
}
