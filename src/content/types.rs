//! Small value types shared across the content model.

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Horizontal justification of a run, table, codebox or embedded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justification {
    #[default]
    Left,
    Right,
    Center,
    Fill,
}

impl Justification {
    /// Wire value of the `justification` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Justification::Left => "left",
            Justification::Right => "right",
            Justification::Center => "center",
            Justification::Fill => "fill",
        }
    }

    /// Parse a wire value.
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "left" => Ok(Justification::Left),
            "right" => Ok(Justification::Right),
            "center" => Ok(Justification::Center),
            "fill" => Ok(Justification::Fill),
            other => Err(Error::malformed(
                "justification",
                format!("unknown justification '{}'", other),
            )),
        }
    }
}

impl fmt::Display for Justification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of the editing caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Caret {
    /// Inside a text block, at a character offset
    Text { block: usize, offset: usize },
    /// Inside a table cell
    Cell {
        block: usize,
        row: usize,
        col: usize,
        offset: usize,
    },
}

impl Caret {
    #[inline]
    pub const fn text(block: usize, offset: usize) -> Self {
        Caret::Text { block, offset }
    }

    pub fn block(&self) -> usize {
        match *self {
            Caret::Text { block, .. } | Caret::Cell { block, .. } => block,
        }
    }
}
