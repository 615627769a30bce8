//! Table sub-model.
//!
//! Row 0 is always the header row. Every row holds exactly as many cells as
//! the header; editing operations keep that invariant and the encoder checks
//! it before writing anything.
//!
//! `col_min`/`col_max` are the stored base widths. Their on-screen values
//! come from [`Table::display_min`]/[`Table::display_max`] and are never
//! written back.

use super::types::Justification;
use crate::common::{EncodeError, Error, Result};
use serde::{Deserialize, Serialize};

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell text content
    text: String,
}

impl Cell {
    /// Create a new cell.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Get the cell text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Row cells
    cells: Vec<Cell>,
}

impl Row {
    /// Create a new row.
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Row of `n` empty cells.
    pub fn empty(n: usize) -> Self {
        Self {
            cells: vec![Cell::default(); n],
        }
    }

    /// Add a cell to the row.
    pub fn add_cell(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    /// Get the number of cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Get all cells.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn cell_mut(&mut self, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(col)
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.cells.push(Cell::new(text));
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(Cell::new).collect(),
        }
    }
}

/// A table block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Header first, then data rows
    rows: Vec<Row>,
    /// Stored base minimum column width
    pub col_min: u32,
    /// Stored base maximum column width
    pub col_max: u32,
    /// Per-column widths as stored (0 means automatic)
    pub col_widths: Vec<u32>,
    pub justification: Justification,
    /// Cheaper rendering path; no effect on content
    pub light: bool,
}

impl Table {
    /// Create a table from a header row, without data rows.
    pub fn new(header: Row) -> Self {
        Self {
            col_widths: Vec::new(),
            rows: vec![header],
            col_min: 0,
            col_max: 0,
            justification: Justification::Left,
            light: false,
        }
    }

    /// Empty `rows` × `cols` grid (`rows` counts the header) as created by
    /// the insert-table action.
    pub fn with_size(rows: usize, cols: usize, col_width: u32, light: bool) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidOperation(format!(
                "table needs at least one row and one column, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self {
            rows: (0..rows).map(|_| Row::empty(cols)).collect(),
            col_min: col_width,
            col_max: col_width,
            col_widths: vec![0; cols],
            justification: Justification::Left,
            light,
        })
    }

    pub fn header(&self) -> &Row {
        &self.rows[0]
    }

    /// Data rows (everything after the header).
    pub fn data_rows(&self) -> &[Row] {
        &self.rows[1..]
    }

    /// Header followed by data rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Get the number of rows, header included.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header().cell_count()
    }

    /// Add a data row. Used by the decoder, which validates lengths later.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row)?.cell(col)
    }

    pub fn set_cell(&mut self, row: usize, col: usize, text: impl Into<String>) -> Result<()> {
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.cells.get_mut(col))
            .ok_or_else(|| Error::InvalidOperation(format!("no cell at {},{}", row, col)))?;
        cell.set_text(text);
        Ok(())
    }

    /// Insert an empty data row at `index` (1..=row_count).
    pub fn insert_row(&mut self, index: usize) -> Result<()> {
        if index == 0 || index > self.rows.len() {
            return Err(Error::InvalidOperation(format!(
                "row index {} out of range 1..={}",
                index,
                self.rows.len()
            )));
        }
        let cols = self.column_count();
        self.rows.insert(index, Row::empty(cols));
        Ok(())
    }

    /// Remove data row `index`. The header cannot be removed.
    pub fn remove_row(&mut self, index: usize) -> Result<Row> {
        if index == 0 || index >= self.rows.len() {
            return Err(Error::InvalidOperation(format!(
                "cannot remove row {} of {}",
                index,
                self.rows.len()
            )));
        }
        Ok(self.rows.remove(index))
    }

    /// Insert an empty column at `index` in every row.
    pub fn insert_column(&mut self, index: usize) -> Result<()> {
        if index > self.column_count() {
            return Err(Error::InvalidOperation(format!(
                "column index {} out of range 0..={}",
                index,
                self.column_count()
            )));
        }
        for row in &mut self.rows {
            row.cells.insert(index.min(row.cells.len()), Cell::default());
        }
        if !self.col_widths.is_empty() {
            self.col_widths.insert(index.min(self.col_widths.len()), 0);
        }
        Ok(())
    }

    /// Remove column `index`; the last column cannot be removed.
    pub fn remove_column(&mut self, index: usize) -> Result<()> {
        let cols = self.column_count();
        if cols <= 1 || index >= cols {
            return Err(Error::InvalidOperation(format!(
                "cannot remove column {} of {}",
                index, cols
            )));
        }
        for row in &mut self.rows {
            if index < row.cells.len() {
                row.cells.remove(index);
            }
        }
        if index < self.col_widths.len() {
            self.col_widths.remove(index);
        }
        Ok(())
    }

    /// On-screen minimum column width.
    pub fn display_min(&self, scale: f32) -> u32 {
        (self.col_min as f32 * scale).round() as u32
    }

    /// On-screen maximum column width.
    pub fn display_max(&self, scale: f32) -> u32 {
        (self.col_max as f32 * scale).round() as u32
    }

    /// Check that every row matches the header's cell count.
    pub fn validate(&self) -> std::result::Result<(), EncodeError> {
        let expected = self.column_count();
        for (i, row) in self.rows.iter().enumerate() {
            if row.cell_count() != expected {
                return Err(EncodeError::RowLength {
                    row: i,
                    expected,
                    found: row.cell_count(),
                });
            }
        }
        Ok(())
    }

    /// Mutable access to a row, for callers that rebuild tables cell by cell.
    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }
}
