//! Node tree index and `.ctd` document files.
//!
//! The [`NodeTree`] maps node ids to their properties, position in the tree
//! and stored markup. Content is kept as raw markup and only decoded by the
//! [`crate::codec`] when a node is opened.

pub mod ctd;
mod index;
mod node;

pub use ctd::{parse_ctd, read_ctd, to_ctd, write_ctd};
pub use index::NodeTree;
pub use node::{
    Node, NodeFlags, NodeMetadata, NodeProperties, NodeType, PROG_LANG_PLAIN_TEXT,
    PROG_LANG_RICH_TEXT,
};
