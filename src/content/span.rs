//! Range-addressed formatting attributes over a text run.
//!
//! A [`SpanSet`] holds every span of one run, ordered by start offset with the
//! span's rank as a stable tie-break. Spans that write the same wire attribute
//! (their [`SpanSlot`]) never overlap: applying a span carves any same-slot
//! span out of the target range, leaving zero, one or two remainders.
//!
//! Codebox spans are atomic. No other span may overlap one, and every
//! restyle that touches a codebox fails with [`Error::FormattingConflict`]
//! without mutating the set.

use super::types::Justification;
use crate::common::{Error, NodeId, RGBColor, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Presentation attributes of a codebox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeboxProps {
    /// Syntax highlighting language (`plain-text` for none)
    pub syntax: String,
    pub frame_width: u32,
    pub frame_height: u32,
    /// Whether `frame_width` is in pixels rather than percent
    pub width_in_pixels: bool,
    pub highlight_brackets: bool,
    pub show_line_numbers: bool,
    pub justification: Justification,
}

impl Default for CodeboxProps {
    fn default() -> Self {
        Self {
            syntax: "plain-text".to_string(),
            frame_width: 500,
            frame_height: 100,
            width_in_pixels: true,
            highlight_brackets: true,
            show_line_numbers: false,
            justification: Justification::Left,
        }
    }
}

/// The wire attribute a span kind is written to.
///
/// Two spans conflict when they share a slot: a run can only carry one
/// `scale`, one `link`, one `foreground` and so on. Slots are ordered as
/// their attributes are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpanSlot {
    Weight,
    Style,
    Underline,
    Strikethrough,
    Scale,
    Foreground,
    Background,
    Family,
    Link,
    Justification,
    Codebox,
}

/// Kind and payload of a span.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    Small,
    /// Heading scale `h1`..`h6`
    Heading(u8),
    Foreground(RGBColor),
    Background(RGBColor),
    Monospace,
    /// Link to another node, optionally to a named anchor inside it
    LinkNode { node: NodeId, anchor: Option<String> },
    LinkFile(String),
    LinkFolder(String),
    LinkWeb(String),
    /// Paragraph justification of the covered text
    Justify(Justification),
    Codebox(CodeboxProps),
}

impl SpanKind {
    /// Slot this kind occupies.
    pub fn slot(&self) -> SpanSlot {
        match self {
            SpanKind::Bold => SpanSlot::Weight,
            SpanKind::Italic => SpanSlot::Style,
            SpanKind::Underline => SpanSlot::Underline,
            SpanKind::Strikethrough => SpanSlot::Strikethrough,
            SpanKind::Superscript | SpanKind::Subscript | SpanKind::Small | SpanKind::Heading(_) => {
                SpanSlot::Scale
            },
            SpanKind::Foreground(_) => SpanSlot::Foreground,
            SpanKind::Background(_) => SpanSlot::Background,
            SpanKind::Monospace => SpanSlot::Family,
            SpanKind::LinkNode { .. }
            | SpanKind::LinkFile(_)
            | SpanKind::LinkFolder(_)
            | SpanKind::LinkWeb(_) => SpanSlot::Link,
            SpanKind::Justify(_) => SpanSlot::Justification,
            SpanKind::Codebox(_) => SpanSlot::Codebox,
        }
    }

    #[inline]
    pub fn is_codebox(&self) -> bool {
        matches!(self, SpanKind::Codebox(_))
    }
}

/// One span over a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub kind: SpanKind,
    pub start: usize,
    pub end: usize,
    /// Tie-break among spans starting at the same offset (document order)
    pub rank: u32,
}

impl Span {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Whether the span overlaps `range`; an empty range tests the point.
    #[inline]
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        if range.start == range.end {
            self.start <= range.start && range.start < self.end
        } else {
            self.start < range.end && range.start < self.end
        }
    }

    #[inline]
    fn sort_key(&self) -> (usize, u32) {
        (self.start, self.rank)
    }
}

/// Handle to a span inside its set (the span's rank).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanRef(pub u32);

/// Ordered spans of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanSet {
    spans: Vec<Span>,
    next_rank: u32,
}

impl PartialEq for SpanSet {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans
    }
}

impl Eq for SpanSet {}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// All spans ordered by start offset, then rank.
    #[inline]
    pub fn as_slice(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    pub fn get(&self, span: SpanRef) -> Option<&Span> {
        self.spans.iter().find(|s| s.rank == span.0)
    }

    /// Insert `kind` over `range`, replacing same-slot formatting there.
    ///
    /// A codebox replaces every other span in its range.
    pub fn apply(&mut self, kind: SpanKind, range: Range<usize>, text_len: usize) -> Result<SpanRef> {
        check_range(&range, text_len)?;
        self.ensure_no_codebox(&range)?;
        if kind.is_codebox() {
            self.carve(&range, |_| true);
        } else {
            let slot = kind.slot();
            self.carve(&range, |s| s.kind.slot() == slot);
        }
        Ok(self.insert(kind, range))
    }

    /// Delete one span.
    pub fn remove(&mut self, span: SpanRef) -> Option<Span> {
        let idx = self.spans.iter().position(|s| s.rank == span.0)?;
        Some(self.spans.remove(idx))
    }

    /// Spans overlapping `range`, optionally restricted to one slot, in
    /// ascending start order (ties in insertion order).
    pub fn intersecting(&self, range: Range<usize>, slot: Option<SpanSlot>) -> Vec<&Span> {
        self.spans
            .iter()
            .filter(|s| s.intersects(&range))
            .filter(|s| slot.is_none_or(|slot| s.kind.slot() == slot))
            .collect()
    }

    /// Flip `kind` over `range`.
    ///
    /// When the whole range already carries exactly this kind it is removed
    /// from the range (returns `None`), otherwise it is applied.
    pub fn toggle(
        &mut self,
        kind: SpanKind,
        range: Range<usize>,
        text_len: usize,
    ) -> Result<Option<SpanRef>> {
        check_range(&range, text_len)?;
        self.ensure_no_codebox(&range)?;
        if self.covers(&kind, &range) {
            self.carve(&range, |s| s.kind == kind);
            Ok(None)
        } else {
            self.apply(kind, range, text_len).map(Some)
        }
    }

    /// Remove every non-codebox span from `range`.
    pub fn clear(&mut self, range: Range<usize>, text_len: usize) -> Result<()> {
        check_range(&range, text_len)?;
        self.ensure_no_codebox(&range)?;
        self.carve(&range, |s| !s.kind.is_codebox());
        Ok(())
    }

    /// Fail with [`Error::FormattingConflict`] if a codebox overlaps `range`.
    pub fn ensure_no_codebox(&self, range: &Range<usize>) -> Result<()> {
        if self
            .spans
            .iter()
            .any(|s| s.kind.is_codebox() && s.intersects(range))
        {
            return Err(Error::FormattingConflict {
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    /// Codebox strictly containing `offset` (start < offset < end).
    pub fn codebox_around(&self, offset: usize) -> Option<&Span> {
        self.spans
            .iter()
            .find(|s| s.kind.is_codebox() && s.start < offset && offset < s.end)
    }

    /// Whether spans of exactly `kind` cover all of `range`.
    fn covers(&self, kind: &SpanKind, range: &Range<usize>) -> bool {
        let mut pos = range.start;
        for s in self.spans.iter().filter(|s| &s.kind == kind && s.intersects(range)) {
            if s.start > pos {
                return false;
            }
            pos = pos.max(s.end);
            if pos >= range.end {
                return true;
            }
        }
        pos >= range.end
    }

    /// Cut `range` out of every span matching `pred`.
    fn carve(&mut self, range: &Range<usize>, pred: impl Fn(&Span) -> bool) {
        let mut cut = Vec::new();
        self.spans.retain(|s| {
            if pred(s) && s.intersects(range) {
                cut.push(s.clone());
                false
            } else {
                true
            }
        });
        for s in cut {
            if s.start < range.start {
                self.insert_ranked(Span {
                    kind: s.kind.clone(),
                    start: s.start,
                    end: range.start,
                    rank: s.rank,
                });
            }
            if s.end > range.end {
                let rank = self.bump_rank();
                self.insert_ranked(Span {
                    kind: s.kind,
                    start: range.end,
                    end: s.end,
                    rank,
                });
            }
        }
    }

    fn bump_rank(&mut self) -> u32 {
        let rank = self.next_rank;
        self.next_rank += 1;
        rank
    }

    fn insert(&mut self, kind: SpanKind, range: Range<usize>) -> SpanRef {
        let rank = self.bump_rank();
        self.insert_ranked(Span {
            kind,
            start: range.start,
            end: range.end,
            rank,
        });
        SpanRef(rank)
    }

    fn insert_ranked(&mut self, span: Span) {
        let key = span.sort_key();
        let idx = self.spans.partition_point(|s| s.sort_key() < key);
        self.spans.insert(idx, span);
    }

    /// Append a span read from markup.
    ///
    /// Same-slot formatting under the range is truncated (the later element
    /// wins) and a span continuing an identical span ending at `range.start`
    /// extends it instead of starting a new one. Codeboxes never merge.
    pub(crate) fn push_decoded(&mut self, kind: SpanKind, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let slot = kind.slot();
        self.carve(&range, |s| s.kind.slot() == slot);
        if !kind.is_codebox() {
            let prev = self
                .spans
                .iter_mut()
                .rev()
                .find(|s| s.kind == kind && s.end == range.start);
            if let Some(prev) = prev {
                prev.end = range.end;
                return;
            }
        }
        self.insert(kind, range);
    }

    /// Shift spans for `n` characters inserted at `at`.
    ///
    /// Spans starting at or after `at` move; a span strictly containing `at`
    /// grows; a span ending at `at` is not extended.
    pub(crate) fn shift_insert(&mut self, at: usize, n: usize) {
        for s in &mut self.spans {
            if s.start >= at {
                s.start += n;
                s.end += n;
            } else if s.end > at {
                s.end += n;
            }
        }
    }

    /// Shift spans for the deletion of `range`, dropping emptied spans.
    pub(crate) fn shift_delete(&mut self, range: &Range<usize>) {
        let width = range.end - range.start;
        let map = |x: usize| {
            if x <= range.start {
                x
            } else if x <= range.end {
                range.start
            } else {
                x - width
            }
        };
        for s in &mut self.spans {
            s.start = map(s.start);
            s.end = map(s.end);
        }
        self.spans.retain(|s| s.start < s.end);
        self.spans.sort_by_key(Span::sort_key);
    }

    /// Split at `at`: spans after it move to the returned set, rebased to 0.
    /// Spans crossing `at` are cut in two, both halves keeping their rank.
    pub(crate) fn split_off(&mut self, at: usize) -> SpanSet {
        let mut tail = SpanSet {
            spans: Vec::new(),
            next_rank: self.next_rank,
        };
        let mut kept = Vec::with_capacity(self.spans.len());
        for s in self.spans.drain(..) {
            if s.end <= at {
                kept.push(s);
            } else if s.start >= at {
                tail.spans.push(Span {
                    start: s.start - at,
                    end: s.end - at,
                    ..s
                });
            } else {
                tail.spans.push(Span {
                    kind: s.kind.clone(),
                    start: 0,
                    end: s.end - at,
                    rank: s.rank,
                });
                kept.push(Span { end: at, ..s });
            }
        }
        self.spans = kept;
        tail.spans.sort_by_key(Span::sort_key);
        tail
    }

    /// Append `other`, shifting its offsets by `shift` and its ranks past ours.
    pub(crate) fn append(&mut self, other: SpanSet, shift: usize) {
        let base = self.next_rank;
        for s in other.spans {
            self.spans.push(Span {
                start: s.start + shift,
                end: s.end + shift,
                rank: s.rank + base,
                kind: s.kind,
            });
        }
        self.next_rank = base + other.next_rank;
        self.spans.sort_by_key(Span::sort_key);
    }

    /// Renumber ranks densely in current order.
    pub(crate) fn renumber(&mut self) {
        self.spans.sort_by_key(Span::sort_key);
        for (i, s) in self.spans.iter_mut().enumerate() {
            s.rank = i as u32;
        }
        self.next_rank = self.spans.len() as u32;
    }
}

fn check_range(range: &Range<usize>, text_len: usize) -> Result<()> {
    if range.start >= range.end || range.end > text_len {
        return Err(Error::InvalidOperation(format!(
            "span range {}..{} invalid for run of length {}",
            range.start, range.end, text_len
        )));
    }
    Ok(())
}
