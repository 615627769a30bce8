//! Content blocks: text runs with their spans and objects, and tables.

use super::object::EmbeddedObject;
use super::span::{Span, SpanKind, SpanRef, SpanSet, SpanSlot};
use super::table::Table;
use super::text;
use super::types::Justification;
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A text run with its spans and embedded objects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBlock {
    text: String,
    spans: SpanSet,
    /// Ordered by offset, then rank
    objects: Vec<EmbeddedObject>,
    next_object_rank: u32,
}

impl PartialEq for TextBlock {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
            && self.spans == other.spans
            && self.objects == other.objects
    }
}

impl Eq for TextBlock {}

impl TextBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unformatted block holding `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    #[inline]
    pub fn char_len(&self) -> usize {
        text::char_len(&self.text)
    }

    #[inline]
    pub fn spans(&self) -> &SpanSet {
        &self.spans
    }

    #[inline]
    pub fn objects(&self) -> &[EmbeddedObject] {
        &self.objects
    }

    /// No text, spans or objects.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.spans.is_empty() && self.objects.is_empty()
    }

    /// Fails with [`Error::FormattingConflict`] when a codebox would swallow
    /// an embedded object.
    pub fn apply_span(&mut self, kind: SpanKind, range: Range<usize>) -> Result<SpanRef> {
        self.ensure_codebox_fits(&kind, &range)?;
        let len = self.char_len();
        self.spans.apply(kind, range, len)
    }

    pub fn remove_span(&mut self, span: SpanRef) -> Option<Span> {
        self.spans.remove(span)
    }

    pub fn spans_intersecting(&self, range: Range<usize>, slot: Option<SpanSlot>) -> Vec<&Span> {
        self.spans.intersecting(range, slot)
    }

    pub fn toggle_span(&mut self, kind: SpanKind, range: Range<usize>) -> Result<Option<SpanRef>> {
        self.ensure_codebox_fits(&kind, &range)?;
        let len = self.char_len();
        self.spans.toggle(kind, range, len)
    }

    /// Justification of the text at `offset`, if any was set.
    pub fn justification_at(&self, offset: usize) -> Option<Justification> {
        self.spans
            .intersecting(offset..offset, Some(SpanSlot::Justification))
            .first()
            .and_then(|s| match s.kind {
                SpanKind::Justify(j) => Some(j),
                _ => None,
            })
    }

    /// Set the justification of `range`.
    pub fn set_justification(
        &mut self,
        range: Range<usize>,
        justification: Justification,
    ) -> Result<SpanRef> {
        self.apply_span(SpanKind::Justify(justification), range)
    }

    fn ensure_codebox_fits(&self, kind: &SpanKind, range: &Range<usize>) -> Result<()> {
        if kind.is_codebox()
            && self
                .objects
                .iter()
                .any(|o| range.start < o.offset && o.offset < range.end)
        {
            return Err(Error::FormattingConflict {
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    pub fn clear_formatting(&mut self, range: Range<usize>) -> Result<()> {
        let len = self.char_len();
        self.spans.clear(range, len)
    }

    /// Place an object; returns its rank.
    pub fn insert_object(&mut self, mut object: EmbeddedObject) -> Result<u32> {
        let len = self.char_len();
        if object.offset > len {
            return Err(Error::InvalidOperation(format!(
                "object offset {} beyond run of length {}",
                object.offset, len
            )));
        }
        if self.spans.codebox_around(object.offset).is_some() {
            return Err(Error::FormattingConflict {
                start: object.offset,
                end: object.offset,
            });
        }
        object.rank = self.next_object_rank;
        self.next_object_rank += 1;
        let rank = object.rank;
        let key = (object.offset, object.rank);
        let idx = self
            .objects
            .partition_point(|o| (o.offset, o.rank) < key);
        self.objects.insert(idx, object);
        Ok(rank)
    }

    /// Remove the object with the given rank.
    pub fn remove_object(&mut self, rank: u32) -> Option<EmbeddedObject> {
        let idx = self.objects.iter().position(|o| o.rank == rank)?;
        Some(self.objects.remove(idx))
    }

    pub(crate) fn objects_mut(&mut self) -> &mut [EmbeddedObject] {
        &mut self.objects
    }

    /// Insert `s` at character `offset`, shifting spans and objects.
    pub fn insert_text(&mut self, offset: usize, s: &str) -> Result<()> {
        let len = self.char_len();
        if offset > len {
            return Err(Error::InvalidOperation(format!(
                "insert offset {} beyond run of length {}",
                offset, len
            )));
        }
        if s.is_empty() {
            return Ok(());
        }
        let n = text::char_len(s);
        let at = text::byte_index(&self.text, offset);
        self.text.insert_str(at, s);
        self.spans.shift_insert(offset, n);
        for o in &mut self.objects {
            if o.offset >= offset {
                o.offset += n;
            }
        }
        Ok(())
    }

    /// Delete a character range.
    ///
    /// Fails with [`Error::FormattingConflict`] when the range cuts across a
    /// codebox boundary; deleting a whole codebox or text inside one is fine.
    pub fn delete_text(&mut self, range: Range<usize>) -> Result<()> {
        self.check_delete(&range)?;
        if range.is_empty() {
            return Ok(());
        }
        let bytes = text::byte_range(&self.text, &range);
        self.text.replace_range(bytes, "");
        self.spans.shift_delete(&range);
        let width = range.end - range.start;
        self.objects
            .retain(|o| !(o.offset > range.start && o.offset < range.end));
        for o in &mut self.objects {
            if o.offset >= range.end {
                o.offset -= width;
            }
        }
        Ok(())
    }

    /// Replace a character range with `s`.
    pub fn replace_text(&mut self, range: Range<usize>, s: &str) -> Result<()> {
        self.check_delete(&range)?;
        let start = range.start;
        self.delete_text(range)?;
        self.insert_text(start, s)
    }

    fn check_delete(&self, range: &Range<usize>) -> Result<()> {
        let len = self.char_len();
        if range.start > range.end || range.end > len {
            return Err(Error::InvalidOperation(format!(
                "range {}..{} invalid for run of length {}",
                range.start, range.end, len
            )));
        }
        let crosses = self.spans.iter().any(|s| {
            s.kind.is_codebox()
                && s.start < range.end
                && range.start < s.end
                && !(range.start <= s.start && s.end <= range.end)
                && !(s.start <= range.start && range.end <= s.end)
        });
        if crosses {
            return Err(Error::FormattingConflict {
                start: range.start,
                end: range.end,
            });
        }
        Ok(())
    }

    /// Split at character `at`; the returned block holds the tail.
    ///
    /// Objects at exactly `at` stay with the head.
    pub fn split_off(&mut self, at: usize) -> Result<TextBlock> {
        let len = self.char_len();
        if at > len {
            return Err(Error::InvalidOperation(format!(
                "split offset {} beyond run of length {}",
                at, len
            )));
        }
        if let Some(cb) = self.spans.codebox_around(at) {
            return Err(Error::FormattingConflict {
                start: cb.start,
                end: cb.end,
            });
        }
        let tail_text = self.text.split_off(text::byte_index(&self.text, at));
        let tail_spans = self.spans.split_off(at);
        let split = self.objects.partition_point(|o| o.offset <= at);
        let tail_objects = self
            .objects
            .split_off(split)
            .into_iter()
            .map(|o| EmbeddedObject {
                offset: o.offset - at,
                ..o
            })
            .collect();
        Ok(TextBlock {
            text: tail_text,
            spans: tail_spans,
            objects: tail_objects,
            next_object_rank: self.next_object_rank,
        })
    }

    /// Concatenate `other` after this block, shifting its offsets and ranks.
    pub fn append(&mut self, other: TextBlock) {
        let shift = self.char_len();
        let base = self.next_object_rank;
        self.text.push_str(&other.text);
        self.spans.append(other.spans, shift);
        for o in other.objects {
            self.objects.push(EmbeddedObject {
                offset: o.offset + shift,
                rank: o.rank + base,
                ..o
            });
        }
        self.next_object_rank = base + other.next_object_rank;
    }

    /// Append a decoded run with the spans its attributes produced.
    pub(crate) fn push_run(&mut self, run: &str, kinds: impl IntoIterator<Item = SpanKind>) {
        let start = self.char_len();
        self.text.push_str(run);
        let end = start + text::char_len(run);
        for kind in kinds {
            self.spans.push_decoded(kind, start..end);
        }
    }

    /// Append a decoded object in document order.
    pub(crate) fn push_object(&mut self, mut object: EmbeddedObject) {
        object.rank = self.next_object_rank;
        self.next_object_rank += 1;
        self.objects.push(object);
    }

    /// Renumber span and object ranks densely after decoding.
    pub(crate) fn renumber(&mut self) {
        self.spans.renumber();
        self.objects.sort_by_key(|o| (o.offset, o.rank));
        for (i, o) in self.objects.iter_mut().enumerate() {
            o.rank = i as u32;
        }
        self.next_object_rank = self.objects.len() as u32;
    }
}

/// One entry of a node body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentBlock {
    Text(TextBlock),
    Table(Table),
}

impl ContentBlock {
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentBlock::Text(t) => Some(t),
            ContentBlock::Table(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            ContentBlock::Text(t) => Some(t),
            ContentBlock::Table(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            ContentBlock::Table(t) => Some(t),
            ContentBlock::Text(_) => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            ContentBlock::Table(t) => Some(t),
            ContentBlock::Text(_) => None,
        }
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self, ContentBlock::Table(_))
    }
}
