//! In-memory content model of one node body.
//!
//! The model is an ordered list of [`ContentBlock`]s: text runs carrying
//! [`Span`]s and [`EmbeddedObject`]s, and [`Table`]s. It is edited through
//! [`Command`] values and turned into markup by the [`crate::codec`].

pub mod blob;
pub mod block;
pub mod command;
pub mod list;
pub mod model;
pub mod object;
pub mod span;
pub mod table;
pub mod text;
pub mod types;

pub use blob::{BlobStore, Checksum, MemoryBlobStore};
pub use block::{ContentBlock, TextBlock};
pub use command::{Command, apply};
pub use list::{CheckState, ListFamily, ListLine, Marker};
pub use model::ContentBlockModel;
pub use object::{
    AnchorObject, AttachmentObject, EmbeddedObject, FormulaObject, ImageObject, ObjectKind,
};
pub use span::{CodeboxProps, Span, SpanKind, SpanRef, SpanSet, SpanSlot};
pub use table::{Cell, Row, Table};
pub use types::{Caret, Justification};
