//! Ordered node body.
//!
//! A [`ContentBlockModel`] always starts with a text block and never holds two
//! adjacent text blocks; tables may follow each other directly.

use super::block::{ContentBlock, TextBlock};
use super::table::Table;
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Blocks of one node body, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlockModel {
    blocks: Vec<ContentBlock>,
}

impl Default for ContentBlockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentBlockModel {
    /// A body holding one empty text block.
    pub fn new() -> Self {
        Self {
            blocks: vec![ContentBlock::Text(TextBlock::new())],
        }
    }

    /// Build from decoded blocks; an empty list becomes one empty text block.
    pub fn from_blocks(blocks: Vec<ContentBlock>) -> Self {
        if blocks.is_empty() {
            Self::new()
        } else {
            Self { blocks }
        }
    }

    #[inline]
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, index: usize) -> Option<&ContentBlock> {
        self.blocks.get(index)
    }

    /// Text block at `index`; a table there is [`Error::UnsupportedInTable`].
    pub fn text_block(&self, index: usize) -> Result<&TextBlock> {
        match self.blocks.get(index) {
            Some(ContentBlock::Text(t)) => Ok(t),
            Some(ContentBlock::Table(_)) => Err(Error::UnsupportedInTable),
            None => Err(no_block(index)),
        }
    }

    pub fn text_block_mut(&mut self, index: usize) -> Result<&mut TextBlock> {
        match self.blocks.get_mut(index) {
            Some(ContentBlock::Text(t)) => Ok(t),
            Some(ContentBlock::Table(_)) => Err(Error::UnsupportedInTable),
            None => Err(no_block(index)),
        }
    }

    pub fn table(&self, index: usize) -> Result<&Table> {
        self.blocks
            .get(index)
            .and_then(ContentBlock::as_table)
            .ok_or_else(|| Error::InvalidOperation(format!("block {} is not a table", index)))
    }

    pub fn table_mut(&mut self, index: usize) -> Result<&mut Table> {
        self.blocks
            .get_mut(index)
            .and_then(ContentBlock::as_table_mut)
            .ok_or_else(|| Error::InvalidOperation(format!("block {} is not a table", index)))
    }

    /// Insert an empty `rows` × `cols` table at `offset` of text block `block`.
    ///
    /// The text block is split in two around the table. An empty left part
    /// directly after another table, or an empty right part directly before
    /// another table, is dropped so tables at a block boundary sit next to
    /// their neighbour. Returns the new table's block index.
    pub fn insert_table(
        &mut self,
        block: usize,
        offset: usize,
        rows: usize,
        cols: usize,
        col_width: u32,
        light: bool,
    ) -> Result<usize> {
        let table = Table::with_size(rows, cols, col_width, light)?;
        let tail = self.text_block_mut(block)?.split_off(offset)?;

        let mut index = block + 1;
        let prev_is_table = block > 0 && self.blocks[block - 1].is_table();
        let next_is_table = self.blocks.get(block + 1).is_some_and(ContentBlock::is_table);

        if prev_is_table && self.blocks[block].as_text().is_some_and(TextBlock::is_empty) {
            self.blocks.remove(block);
            index -= 1;
        }
        self.blocks.insert(index, ContentBlock::Table(table));
        if !(tail.is_empty() && next_is_table) {
            self.blocks.insert(index + 1, ContentBlock::Text(tail));
        }
        Ok(index)
    }

    /// Remove table `index`, merging the text blocks on either side.
    pub fn delete_table(&mut self, index: usize) -> Result<Table> {
        let removed = self.table(index)?.clone();
        self.blocks.remove(index);

        let joinable = index > 0
            && matches!(self.blocks.get(index - 1), Some(ContentBlock::Text(_)))
            && matches!(self.blocks.get(index), Some(ContentBlock::Text(_)));
        if joinable {
            if let ContentBlock::Text(right) = self.blocks.remove(index) {
                if let Some(left) = self.blocks[index - 1].as_text_mut() {
                    left.append(right);
                }
            }
        }

        if !matches!(self.blocks.first(), Some(ContentBlock::Text(_))) {
            self.blocks.insert(0, ContentBlock::Text(TextBlock::new()));
        }
        Ok(removed)
    }

    /// Concatenated text of every text block, tables skipped.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(ContentBlock::as_text)
            .map(TextBlock::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Every embedded object with the index of its block.
    pub fn objects(&self) -> impl Iterator<Item = (usize, &super::object::EmbeddedObject)> {
        self.blocks.iter().enumerate().flat_map(|(i, b)| {
            b.as_text()
                .into_iter()
                .flat_map(move |t| t.objects().iter().map(move |o| (i, o)))
        })
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<ContentBlock> {
        &mut self.blocks
    }
}

fn no_block(index: usize) -> Error {
    Error::InvalidOperation(format!("no block at index {}", index))
}
