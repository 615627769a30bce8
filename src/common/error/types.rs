//! Error taxonomy for the content core.
//!
//! Decode failures are fatal to one node only, editing failures are
//! recoverable no-ops, and encode failures abort before any byte is emitted.
use crate::common::id::NodeId;
use thiserror::Error;

/// Main error type for content operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Low-level XML error reported by the reader
    #[error("XML error: {0}")]
    Xml(String),

    /// Node markup that cannot be turned into a content model
    #[error("Malformed document at <{element}>: {reason}")]
    MalformedDocument { element: String, reason: String },

    /// A restyle touched a codebox
    #[error("Formatting conflict: range {start}..{end} intersects a codebox")]
    FormattingConflict { start: usize, end: usize },

    /// List operation attempted without a caret
    #[error("No insertion point is placed")]
    NoInsertionPoint,

    /// List operation attempted inside a table cell
    #[error("Operation is not supported inside a table")]
    UnsupportedInTable,

    /// The in-memory model cannot be serialized
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Node id unknown to the tree index
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Move would detach the node from the tree or create a cycle
    #[error("Invalid move: {0}")]
    InvalidMove(String),

    /// Block index, range or cell address out of bounds
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Edit session used out of order
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a [`Error::MalformedDocument`].
    pub fn malformed(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedDocument {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error leaves the model untouched and the user can simply
    /// retry with a different selection or caret.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::FormattingConflict { .. }
                | Error::NoInsertionPoint
                | Error::UnsupportedInTable
                | Error::InvalidOperation(_)
        )
    }
}

/// Structural problems found while encoding a content model.
///
/// These indicate a bug in the editing layer rather than a user error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A table row does not match the header's cell count
    #[error("table row {row} has {found} cells, header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An image or attachment references bytes the blob store does not hold
    #[error("no blob stored for checksum {0}")]
    MissingBlob(String),

    /// Content addressed to an alias node instead of its master
    #[error("node {node_id} shares the content of master {master_id}")]
    SharedNode { node_id: NodeId, master_id: NodeId },

    /// A span lies outside its run
    #[error("invalid span {start}..{end} over text of length {len}")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// An object is positioned past the end of its run
    #[error("object offset {offset} beyond text of length {len}")]
    InvalidObjectOffset { offset: usize, len: usize },

    /// An object sits strictly inside a codebox
    #[error("object offset {offset} falls inside codebox {start}..{end}")]
    ObjectInCodebox {
        offset: usize,
        start: usize,
        end: usize,
    },
}

/// Result type for content operations.
pub type Result<T> = std::result::Result<T, Error>;
