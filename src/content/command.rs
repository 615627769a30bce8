//! Editing commands over a [`ContentBlockModel`].
//!
//! Every edit the editor can make is one [`Command`] value. [`apply`] is the
//! pure form (returns a new model); [`ContentBlockModel::apply`] edits in
//! place and reports where the caret should go.

use super::list::{self, ListFamily};
use super::model::ContentBlockModel;
use super::object::{EmbeddedObject, ObjectKind};
use super::span::{SpanKind, SpanRef};
use super::text;
use super::types::{Caret, Justification};
use crate::common::Result;
use std::ops::Range;

/// One editing action.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    InsertText {
        block: usize,
        offset: usize,
        text: String,
    },
    DeleteText {
        block: usize,
        range: Range<usize>,
    },
    ApplySpan {
        block: usize,
        range: Range<usize>,
        kind: SpanKind,
    },
    ToggleSpan {
        block: usize,
        range: Range<usize>,
        kind: SpanKind,
    },
    RemoveSpan {
        block: usize,
        span: SpanRef,
    },
    ClearFormatting {
        block: usize,
        range: Range<usize>,
    },
    InsertTable {
        block: usize,
        offset: usize,
        /// Rows including the header
        rows: usize,
        cols: usize,
        col_width: u32,
        light: bool,
    },
    DeleteTable {
        block: usize,
    },
    SetCell {
        block: usize,
        row: usize,
        col: usize,
        text: String,
    },
    InsertRow {
        block: usize,
        index: usize,
    },
    RemoveRow {
        block: usize,
        index: usize,
    },
    InsertColumn {
        block: usize,
        index: usize,
    },
    RemoveColumn {
        block: usize,
        index: usize,
    },
    SetTableJustification {
        block: usize,
        justification: Justification,
    },
    InsertObject {
        block: usize,
        object: EmbeddedObject,
    },
    /// Clear the pending flag of every attachment
    CommitPending,
    ToggleList {
        caret: Option<Caret>,
        family: ListFamily,
    },
    InsertNewline {
        caret: Option<Caret>,
    },
    Indent {
        caret: Option<Caret>,
    },
    Unindent {
        caret: Option<Caret>,
    },
    CycleCheckbox {
        caret: Option<Caret>,
    },
}

/// Apply `cmd` to a copy of `model`.
///
/// `model` is untouched whatever the outcome.
pub fn apply(model: &ContentBlockModel, cmd: &Command) -> Result<ContentBlockModel> {
    let mut next = model.clone();
    next.apply(cmd.clone())?;
    Ok(next)
}

impl ContentBlockModel {
    /// Apply `cmd` in place.
    ///
    /// Returns the caret position the edit leaves behind, when it has one.
    /// Failing commands are checked before anything is changed.
    pub fn apply(&mut self, cmd: Command) -> Result<Option<Caret>> {
        match cmd {
            Command::InsertText {
                block,
                offset,
                text: s,
            } => {
                self.text_block_mut(block)?.insert_text(offset, &s)?;
                Ok(Some(Caret::text(block, offset + text::char_len(&s))))
            },
            Command::DeleteText { block, range } => {
                let start = range.start;
                self.text_block_mut(block)?.delete_text(range)?;
                Ok(Some(Caret::text(block, start)))
            },
            Command::ApplySpan { block, range, kind } => {
                self.text_block_mut(block)?.apply_span(kind, range)?;
                Ok(None)
            },
            Command::ToggleSpan { block, range, kind } => {
                self.text_block_mut(block)?.toggle_span(kind, range)?;
                Ok(None)
            },
            Command::RemoveSpan { block, span } => {
                self.text_block_mut(block)?.remove_span(span);
                Ok(None)
            },
            Command::ClearFormatting { block, range } => {
                self.text_block_mut(block)?.clear_formatting(range)?;
                Ok(None)
            },
            Command::InsertTable {
                block,
                offset,
                rows,
                cols,
                col_width,
                light,
            } => {
                let index = self.insert_table(block, offset, rows, cols, col_width, light)?;
                Ok(Some(Caret::Cell {
                    block: index,
                    row: 0,
                    col: 0,
                    offset: 0,
                }))
            },
            Command::DeleteTable { block } => {
                let before = match block.checked_sub(1).map(|i| self.text_block(i)) {
                    Some(Ok(t)) => Some(Caret::text(block - 1, t.char_len())),
                    _ => None,
                };
                self.delete_table(block)?;
                Ok(before.or(Some(Caret::text(0, 0))))
            },
            Command::SetCell {
                block,
                row,
                col,
                text: s,
            } => {
                self.table_mut(block)?.set_cell(row, col, s)?;
                Ok(None)
            },
            Command::InsertRow { block, index } => {
                self.table_mut(block)?.insert_row(index)?;
                Ok(None)
            },
            Command::RemoveRow { block, index } => {
                self.table_mut(block)?.remove_row(index)?;
                Ok(None)
            },
            Command::InsertColumn { block, index } => {
                self.table_mut(block)?.insert_column(index)?;
                Ok(None)
            },
            Command::RemoveColumn { block, index } => {
                self.table_mut(block)?.remove_column(index)?;
                Ok(None)
            },
            Command::SetTableJustification {
                block,
                justification,
            } => {
                self.table_mut(block)?.justification = justification;
                Ok(None)
            },
            Command::InsertObject { block, object } => {
                let offset = object.offset;
                self.text_block_mut(block)?.insert_object(object)?;
                Ok(Some(Caret::text(block, offset)))
            },
            Command::CommitPending => {
                self.commit_pending();
                Ok(None)
            },
            Command::ToggleList { caret, family } => list::toggle_list(self, caret, family).map(Some),
            Command::InsertNewline { caret } => list::insert_newline(self, caret).map(Some),
            Command::Indent { caret } => list::indent(self, caret).map(Some),
            Command::Unindent { caret } => list::unindent(self, caret).map(Some),
            Command::CycleCheckbox { caret } => list::cycle_checkbox(self, caret).map(Some),
        }
    }

    /// Mark every pending attachment as stored; returns how many changed.
    pub fn commit_pending(&mut self) -> usize {
        let mut committed = 0;
        for block in self.blocks_mut() {
            let Some(text) = block.as_text_mut() else {
                continue;
            };
            for object in text.objects_mut() {
                if let ObjectKind::Attachment(att) = &mut object.kind {
                    if att.pending {
                        att.pending = false;
                        committed += 1;
                    }
                }
            }
        }
        committed
    }
}
