//! List and checkbox markers.
//!
//! A list line is laid out as `<3 spaces per level><marker> <content>`, where
//! the marker is a bullet glyph, a number with a suffix, or a checkbox glyph.
//! Glyphs and suffixes are chosen by nesting level and wrap around once the
//! level passes the family's glyph count.
//!
//! Every operation takes the caret the way the editor reports it: `None`
//! when nothing is placed ([`Error::NoInsertionPoint`]) and a cell caret when
//! editing a table ([`Error::UnsupportedInTable`]). On success the caret's new
//! position is returned.

use super::block::TextBlock;
use super::model::ContentBlockModel;
use super::text;
use super::types::Caret;
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Bullet glyph per nesting level.
pub const BULLET_GLYPHS: [char; 6] = ['•', '◇', '▪', '-', '→', '⇒'];

/// Suffix written after the number per nesting level.
pub const NUMBER_SUFFIXES: [char; 4] = ['.', ')', '-', '>'];

/// Checkbox glyphs in cycle order.
pub const CHECKBOX_GLYPHS: [char; 3] = ['☐', '☑', '☒'];

/// Spaces per nesting level.
pub const INDENT_WIDTH: usize = 3;

/// Marker family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListFamily {
    Bullet,
    Numbered,
    Checkbox,
}

/// Checkbox state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CheckState {
    #[default]
    Empty,
    Checked,
    Crossed,
}

impl CheckState {
    pub fn glyph(self) -> char {
        match self {
            CheckState::Empty => CHECKBOX_GLYPHS[0],
            CheckState::Checked => CHECKBOX_GLYPHS[1],
            CheckState::Crossed => CHECKBOX_GLYPHS[2],
        }
    }

    pub fn from_glyph(c: char) -> Option<Self> {
        match c {
            '☐' => Some(CheckState::Empty),
            '☑' => Some(CheckState::Checked),
            '☒' => Some(CheckState::Crossed),
            _ => None,
        }
    }

    /// Empty → checked → crossed → empty.
    pub fn next(self) -> Self {
        match self {
            CheckState::Empty => CheckState::Checked,
            CheckState::Checked => CheckState::Crossed,
            CheckState::Crossed => CheckState::Empty,
        }
    }
}

/// A line's leading marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Bullet(char),
    Numbered { number: u32, suffix: char },
    Checkbox(CheckState),
}

impl Marker {
    /// First marker of `family` at `level`.
    pub fn for_level(family: ListFamily, level: usize) -> Self {
        match family {
            ListFamily::Bullet => Marker::Bullet(bullet_glyph(level)),
            ListFamily::Numbered => Marker::Numbered {
                number: 1,
                suffix: number_suffix(level),
            },
            ListFamily::Checkbox => Marker::Checkbox(CheckState::Empty),
        }
    }

    pub fn family(&self) -> ListFamily {
        match self {
            Marker::Bullet(_) => ListFamily::Bullet,
            Marker::Numbered { .. } => ListFamily::Numbered,
            Marker::Checkbox(_) => ListFamily::Checkbox,
        }
    }

    /// Marker as written, without the trailing space.
    pub fn text(&self) -> String {
        match self {
            Marker::Bullet(c) => c.to_string(),
            Marker::Numbered { number, suffix } => format!("{}{}", number, suffix),
            Marker::Checkbox(state) => state.glyph().to_string(),
        }
    }

    /// Same family, re-leveled.
    fn at_level(self, level: usize) -> Self {
        match self {
            Marker::Bullet(_) => Marker::Bullet(bullet_glyph(level)),
            Marker::Numbered { number, .. } => Marker::Numbered {
                number,
                suffix: number_suffix(level),
            },
            Marker::Checkbox(state) => Marker::Checkbox(state),
        }
    }

    /// Marker of the line auto-inserted after this one.
    fn continuation(self) -> Self {
        match self {
            Marker::Bullet(c) => Marker::Bullet(c),
            Marker::Numbered { number, suffix } => Marker::Numbered {
                number: number.saturating_add(1),
                suffix,
            },
            Marker::Checkbox(_) => Marker::Checkbox(CheckState::Empty),
        }
    }
}

#[inline]
pub fn bullet_glyph(level: usize) -> char {
    BULLET_GLYPHS[level % BULLET_GLYPHS.len()]
}

#[inline]
pub fn number_suffix(level: usize) -> char {
    NUMBER_SUFFIXES[level % NUMBER_SUFFIXES.len()]
}

/// Layout of one line: indentation, marker and where the content starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLine {
    /// Leading spaces
    pub indent: usize,
    pub level: usize,
    pub marker: Option<Marker>,
}

impl ListLine {
    pub fn parse(line: &str) -> Self {
        let indent = line.chars().take_while(|&c| c == ' ').count();
        let rest = &line[indent..];
        Self {
            indent,
            level: indent / INDENT_WIDTH,
            marker: parse_marker(rest),
        }
    }

    /// Characters of the marker itself.
    fn marker_len(&self) -> usize {
        self.marker.map_or(0, |m| text::char_len(&m.text()))
    }

    /// Characters before the content: indentation, marker and its space.
    pub fn prefix_len(&self) -> usize {
        match self.marker {
            Some(_) => self.indent + self.marker_len() + 1,
            None => self.indent,
        }
    }
}

fn parse_marker(rest: &str) -> Option<Marker> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    if let Some(state) = CheckState::from_glyph(first) {
        return (chars.next() == Some(' ')).then_some(Marker::Checkbox(state));
    }
    if first.is_ascii_digit() {
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        let mut after = rest[digits.len()..].chars();
        let suffix = after.next()?;
        if NUMBER_SUFFIXES.contains(&suffix) && after.next() == Some(' ') {
            let number = digits.parse().ok()?;
            return Some(Marker::Numbered { number, suffix });
        }
        return None;
    }
    if BULLET_GLYPHS.contains(&first) && chars.next() == Some(' ') {
        return Some(Marker::Bullet(first));
    }
    None
}

/// Caret's block and offset, after checking it can take a list operation.
fn locate(model: &ContentBlockModel, caret: Option<Caret>) -> Result<(usize, usize)> {
    match caret {
        None => Err(Error::NoInsertionPoint),
        Some(Caret::Cell { .. }) => Err(Error::UnsupportedInTable),
        Some(Caret::Text { block, offset }) => {
            let len = model.text_block(block)?.char_len();
            if offset > len {
                return Err(Error::NoInsertionPoint);
            }
            Ok((block, offset))
        },
    }
}

/// Range and layout of the line holding `offset`.
fn line_layout(block: &TextBlock, offset: usize) -> (Range<usize>, ListLine) {
    let lines = text::line_ranges(block.text());
    let range = lines[text::line_at(&lines, offset)].clone();
    let layout = ListLine::parse(text::slice(block.text(), &range));
    (range, layout)
}

/// [`line_layout`] for a line about to be rewritten; fails when it overlaps
/// a codebox.
fn current_line(block: &TextBlock, offset: usize) -> Result<(Range<usize>, ListLine)> {
    let (range, layout) = line_layout(block, offset);
    block.spans().ensure_no_codebox(&range)?;
    Ok((range, layout))
}

/// Where the caret lands after `old_len` characters at `at` became `new_len`.
fn map_caret(offset: usize, at: usize, old_len: usize, new_len: usize) -> usize {
    if offset <= at {
        offset
    } else if offset >= at + old_len {
        offset - old_len + new_len
    } else {
        at + new_len
    }
}

/// Replace `old_len` characters at `at` and return the mapped caret.
fn rewrite(
    block: &mut TextBlock,
    at: usize,
    old_len: usize,
    replacement: &str,
    caret: usize,
) -> Result<usize> {
    block.replace_text(at..at + old_len, replacement)?;
    Ok(map_caret(caret, at, old_len, text::char_len(replacement)))
}

/// Add, replace or remove the marker of `family` on the caret's line.
///
/// A line already carrying a marker of the same family loses it; a marker of
/// another family is replaced (checkboxes start empty, numbers continue from
/// the previous sibling). An unmarked line gets a marker at its indentation.
pub fn toggle_list(
    model: &mut ContentBlockModel,
    caret: Option<Caret>,
    family: ListFamily,
) -> Result<Caret> {
    let (index, offset) = locate(model, caret)?;
    let block = model.text_block_mut(index)?;
    let (line, layout) = current_line(block, offset)?;
    let at = line.start + layout.indent;
    let new_offset = match layout.marker {
        Some(m) if m.family() == family => {
            rewrite(block, at, layout.marker_len() + 1, "", offset)?
        },
        Some(_) => {
            let marker = Marker::for_level(family, layout.level);
            rewrite(block, at, layout.marker_len(), &marker.text(), offset)?
        },
        None => {
            let marker = Marker::for_level(family, layout.level);
            let inserted = format!("{} ", marker.text());
            let n = text::char_len(&inserted);
            block.insert_text(at, &inserted)?;
            if offset >= at { offset + n } else { offset }
        },
    };
    renumber(block)?;
    Ok(Caret::text(index, clamp(block, new_offset)))
}

/// Insert a newline at the caret, continuing the list when at a line's end.
///
/// The new line repeats the bullet, increments the number or starts an
/// empty checkbox. On an item with no content the marker is removed instead,
/// which ends the list.
pub fn insert_newline(model: &mut ContentBlockModel, caret: Option<Caret>) -> Result<Caret> {
    let (index, offset) = locate(model, caret)?;
    let block = model.text_block_mut(index)?;
    let (line, layout) = line_layout(block, offset);

    let marker = match layout.marker {
        Some(m) if offset == line.end && offset >= line.start + layout.prefix_len() => m,
        _ => {
            block.insert_text(offset, "\n")?;
            return Ok(Caret::text(index, offset + 1));
        },
    };
    block.spans().ensure_no_codebox(&line)?;

    if line.end == line.start + layout.prefix_len() {
        block.delete_text(line.clone())?;
        renumber(block)?;
        return Ok(Caret::text(index, line.start));
    }

    let next = marker.continuation();
    let inserted = format!("\n{}{} ", " ".repeat(layout.indent), next.text());
    block.insert_text(offset, &inserted)?;
    renumber(block)?;
    let lines = text::line_ranges(block.text());
    let new_line = lines[text::line_at(&lines, offset + 1)].clone();
    let new_layout = ListLine::parse(text::slice(block.text(), &new_line));
    Ok(Caret::text(index, new_line.start + new_layout.prefix_len()))
}

/// Nest the caret's line one level deeper.
pub fn indent(model: &mut ContentBlockModel, caret: Option<Caret>) -> Result<Caret> {
    shift_level(model, caret, true)
}

/// Move the caret's line one level out; a no-op at level 0.
pub fn unindent(model: &mut ContentBlockModel, caret: Option<Caret>) -> Result<Caret> {
    shift_level(model, caret, false)
}

fn shift_level(model: &mut ContentBlockModel, caret: Option<Caret>, deeper: bool) -> Result<Caret> {
    let (index, offset) = locate(model, caret)?;
    let block = model.text_block_mut(index)?;
    let (line, layout) = current_line(block, offset)?;
    if !deeper && layout.level == 0 {
        return Ok(Caret::text(index, offset));
    }
    let level = if deeper { layout.level + 1 } else { layout.level - 1 };

    let mut prefix = " ".repeat(level * INDENT_WIDTH);
    let old_len = match layout.marker {
        Some(m) => {
            let mut marker = m.at_level(level);
            if deeper {
                if let Marker::Numbered { number, .. } = &mut marker {
                    *number = 1;
                }
            }
            prefix.push_str(&marker.text());
            layout.indent + layout.marker_len()
        },
        None => layout.indent,
    };
    let new_offset = rewrite(block, line.start, old_len, &prefix, offset)?;
    renumber(block)?;
    Ok(Caret::text(index, clamp(block, new_offset)))
}

/// Advance the checkbox on the caret's line; lines without one are left alone.
pub fn cycle_checkbox(model: &mut ContentBlockModel, caret: Option<Caret>) -> Result<Caret> {
    let (index, offset) = locate(model, caret)?;
    let block = model.text_block_mut(index)?;
    let (line, layout) = current_line(block, offset)?;
    if let Some(Marker::Checkbox(state)) = layout.marker {
        let at = line.start + layout.indent;
        let glyph = state.next().glyph().to_string();
        block.replace_text(at..at + 1, &glyph)?;
    }
    Ok(Caret::text(index, offset))
}

/// Make numbered siblings consecutive.
///
/// The first item of each list keeps its number; every following item at the
/// same level gets the previous number plus one. Unmarked lines end all
/// lists, other markers end the lists at their level and deeper. Lines inside
/// a codebox are never touched.
fn renumber(block: &mut TextBlock) -> Result<()> {
    let mut counters: Vec<Option<u32>> = Vec::new();
    let mut edits = Vec::new();
    for line in text::line_ranges(block.text()) {
        if block.spans().ensure_no_codebox(&line).is_err() {
            counters.clear();
            continue;
        }
        let layout = ListLine::parse(text::slice(block.text(), &line));
        match layout.marker {
            Some(Marker::Numbered { number, suffix }) => {
                counters.truncate(layout.level + 1);
                counters.resize(layout.level + 1, None);
                let expected = counters[layout.level].map_or(number, |n| n.saturating_add(1));
                counters[layout.level] = Some(expected);
                if expected != number {
                    let at = line.start + layout.indent;
                    let marker = Marker::Numbered {
                        number: expected,
                        suffix,
                    };
                    edits.push((at..at + layout.marker_len(), marker.text()));
                }
            },
            Some(_) => counters.truncate(layout.level),
            None => counters.clear(),
        }
    }
    for (range, replacement) in edits.into_iter().rev() {
        block.replace_text(range, &replacement)?;
    }
    Ok(())
}

fn clamp(block: &TextBlock, offset: usize) -> usize {
    offset.min(block.char_len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::span::{CodeboxProps, SpanKind};

    fn model(text: &str) -> ContentBlockModel {
        let mut m = ContentBlockModel::new();
        m.text_block_mut(0).unwrap().insert_text(0, text).unwrap();
        m
    }

    fn text_of(m: &ContentBlockModel) -> &str {
        m.text_block(0).unwrap().text()
    }

    fn end(m: &ContentBlockModel) -> Option<Caret> {
        Some(Caret::text(0, m.text_block(0).unwrap().char_len()))
    }

    #[test]
    fn test_parse_line() {
        let l = ListLine::parse("   12) item");
        assert_eq!(l.level, 1);
        assert_eq!(
            l.marker,
            Some(Marker::Numbered {
                number: 12,
                suffix: ')'
            })
        );
        assert_eq!(l.prefix_len(), 7);
        assert_eq!(ListLine::parse("- x").marker, Some(Marker::Bullet('-')));
        assert_eq!(ListLine::parse("-x").marker, None);
        assert_eq!(ListLine::parse("1.5 apples").marker, None);
        assert_eq!(
            ListLine::parse("☒ no").marker,
            Some(Marker::Checkbox(CheckState::Crossed))
        );
    }

    #[test]
    fn test_numbered_newline_increments() {
        let mut m = model("1. Item");
        let at = end(&m);
        let caret = insert_newline(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "1. Item\n2. ");
        assert_eq!(caret, Caret::text(0, 11));
    }

    #[test]
    fn test_checkbox_newline_starts_empty() {
        let mut m = model("☑ Done");
        let at = end(&m);
        insert_newline(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "☑ Done\n☐ ");
    }

    #[test]
    fn test_bullet_newline_repeats_glyph() {
        let mut m = model("   ◇ sub");
        let at = end(&m);
        insert_newline(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "   ◇ sub\n   ◇ ");
    }

    #[test]
    fn test_newline_on_empty_item_ends_list() {
        let mut m = model("• a\n• ");
        let at = end(&m);
        let caret = insert_newline(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "• a\n");
        assert_eq!(caret, Caret::text(0, 4));
    }

    #[test]
    fn test_newline_mid_line_is_plain() {
        let mut m = model("1. Item");
        insert_newline(&mut m, Some(Caret::text(0, 4))).unwrap();
        assert_eq!(text_of(&m), "1. I\ntem");
    }

    #[test]
    fn test_newline_renumbers_following_items() {
        let mut m = model("1. a\n2. b");
        insert_newline(&mut m, Some(Caret::text(0, 4))).unwrap();
        assert_eq!(text_of(&m), "1. a\n2. \n3. b");
    }

    #[test]
    fn test_toggle_families() {
        let mut m = model("task");
        toggle_list(&mut m, Some(Caret::text(0, 0)), ListFamily::Bullet).unwrap();
        assert_eq!(text_of(&m), "• task");
        toggle_list(&mut m, Some(Caret::text(0, 3)), ListFamily::Checkbox).unwrap();
        assert_eq!(text_of(&m), "☐ task");
        let caret = toggle_list(&mut m, Some(Caret::text(0, 3)), ListFamily::Checkbox).unwrap();
        assert_eq!(text_of(&m), "task");
        assert_eq!(caret, Caret::text(0, 1));
    }

    #[test]
    fn test_toggle_numbered_continues_sibling() {
        let mut m = model("1. a\nb");
        let at = end(&m);
        toggle_list(&mut m, at, ListFamily::Numbered).unwrap();
        assert_eq!(text_of(&m), "1. a\n2. b");
    }

    #[test]
    fn test_indent_changes_glyph() {
        let mut m = model("• a");
        let at = end(&m);
        let caret = indent(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "   ◇ a");
        assert_eq!(caret, Caret::text(0, 6));
        unindent(&mut m, caret.into()).unwrap();
        assert_eq!(text_of(&m), "• a");
        let at = end(&m);
        unindent(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "• a");
    }

    #[test]
    fn test_glyphs_wrap_past_last_level() {
        assert_eq!(bullet_glyph(6), '•');
        assert_eq!(bullet_glyph(7), '◇');
        assert_eq!(number_suffix(4), '.');
    }

    #[test]
    fn test_indent_numbered_restarts_and_unindent_continues() {
        let mut m = model("1. a\n2. b");
        let at = end(&m);
        indent(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "1. a\n   1) b");
        let at = end(&m);
        unindent(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "1. a\n2. b");
    }

    #[test]
    fn test_cycle_checkbox() {
        let mut m = model("☐ x");
        let c = Some(Caret::text(0, 3));
        cycle_checkbox(&mut m, c).unwrap();
        assert_eq!(text_of(&m), "☑ x");
        cycle_checkbox(&mut m, c).unwrap();
        assert_eq!(text_of(&m), "☒ x");
        cycle_checkbox(&mut m, c).unwrap();
        assert_eq!(text_of(&m), "☐ x");
    }

    #[test]
    fn test_caret_failures() {
        let mut m = model("x");
        assert!(matches!(
            toggle_list(&mut m, None, ListFamily::Bullet),
            Err(Error::NoInsertionPoint)
        ));
        let cell = Caret::Cell {
            block: 0,
            row: 0,
            col: 0,
            offset: 0,
        };
        assert!(matches!(
            insert_newline(&mut m, Some(cell)),
            Err(Error::UnsupportedInTable)
        ));
        m.insert_table(0, 1, 1, 1, 40, false).unwrap();
        assert!(matches!(
            indent(&mut m, Some(Caret::text(1, 0))),
            Err(Error::UnsupportedInTable)
        ));
        assert_eq!(text_of(&m), "x");
    }

    #[test]
    fn test_line_in_codebox_conflicts() {
        let mut m = model("a\ncode\nb");
        m.text_block_mut(0)
            .unwrap()
            .apply_span(SpanKind::Codebox(CodeboxProps::default()), 2..6)
            .unwrap();
        assert!(matches!(
            toggle_list(&mut m, Some(Caret::text(0, 3)), ListFamily::Bullet),
            Err(Error::FormattingConflict { .. })
        ));
        toggle_list(&mut m, Some(Caret::text(0, 8)), ListFamily::Bullet).unwrap();
        assert_eq!(text_of(&m), "a\ncode\n• b");
    }

    #[test]
    fn test_plain_newline_beside_codebox() {
        let mut m = model("see code here");
        m.text_block_mut(0)
            .unwrap()
            .apply_span(SpanKind::Codebox(CodeboxProps::default()), 4..8)
            .unwrap();
        let caret = insert_newline(&mut m, Some(Caret::text(0, 0))).unwrap();
        assert_eq!(caret, Caret::text(0, 1));
        assert_eq!(text_of(&m), "\nsee code here");
        let cb = &m.text_block(0).unwrap().spans().as_slice()[0];
        assert_eq!(cb.range(), 5..9);
    }

    #[test]
    fn test_list_continuation_beside_codebox_conflicts() {
        let mut m = model("- see code");
        m.text_block_mut(0)
            .unwrap()
            .apply_span(SpanKind::Codebox(CodeboxProps::default()), 6..10)
            .unwrap();
        let at = end(&m);
        assert!(matches!(
            insert_newline(&mut m, at),
            Err(Error::FormattingConflict { .. })
        ));
        assert_eq!(text_of(&m), "- see code");
    }

    #[test]
    fn test_largest_number_does_not_overflow() {
        let mut m = model("4294967295. x");
        let at = end(&m);
        insert_newline(&mut m, at).unwrap();
        assert_eq!(text_of(&m), "4294967295. x\n4294967295. ");

        let mut m = model("4294967295. a\n1. b");
        toggle_list(&mut m, Some(Caret::text(0, 14)), ListFamily::Numbered).unwrap();
        toggle_list(&mut m, Some(Caret::text(0, 14)), ListFamily::Numbered).unwrap();
        assert!(text_of(&m).starts_with("4294967295. a\n"));
    }
}
