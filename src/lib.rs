//! cherrytree-core - content model and markup codec for CherryTree documents
//!
//! This library reads and writes the node markup of CherryTree hierarchical
//! notes. A node's body is decoded into an editable content model of text
//! runs, formatting spans, embedded objects and tables, edited through
//! command values, and encoded back to the same XML dialect.
//!
//! # Features
//!
//! - **Codec**: Decode node markup into a [`content::ContentBlockModel`] and
//!   encode it back, keeping span offsets, object order and table layout
//! - **Content model**: Range-addressed spans with split-on-toggle, atomic
//!   codeboxes, tables, embedded objects and list markers
//! - **Node tree**: Node ids, master/alias sharing, search exclusion and
//!   whole-document `.ctd` files
//! - **Edit sessions**: Open, edit and save a node with shared-node
//!   redirection
//!
//! # Example - Editing a node
//!
//! ```
//! use cherrytree_core::codec;
//! use cherrytree_core::common::NodeId;
//! use cherrytree_core::config::CodecConfig;
//! use cherrytree_core::content::{Command, MemoryBlobStore, SpanKind};
//! use cherrytree_core::tree::NodeMetadata;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CodecConfig::default().with_xml_declaration(false);
//! let mut store = MemoryBlobStore::new();
//!
//! let markup = b"<node><rich_text>Hello world</rich_text></node>";
//! let mut model = codec::decode(NodeId(1), markup, &config, &mut store)?;
//!
//! model.apply(Command::ToggleSpan { block: 0, range: 0..5, kind: SpanKind::Bold })?;
//!
//! let bytes = codec::encode(&NodeMetadata::rich_text(NodeId(1)), &model, &config, &store)?;
//! assert_eq!(
//!     String::from_utf8(bytes)?,
//!     r#"<node><rich_text weight="heavy">Hello</rich_text><rich_text> world</rich_text></node>"#
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Loading a document
//!
//! ```no_run
//! use cherrytree_core::tree::read_ctd;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = read_ctd("notes.ctd")?;
//! for (id, depth) in tree.depth_first() {
//!     println!("{}{}", "  ".repeat(depth), tree.node(id)?.name());
//! }
//! # Ok(())
//! # }
//! ```

/// Errors, ids, colors and XML helpers shared by every module
pub mod common;

/// Codec options
pub mod config;

/// In-memory content model of a node body
pub mod content;

/// Node markup decoder and encoder
pub mod codec;

/// Node tree index and `.ctd` files
pub mod tree;

/// Open-edit-save lifecycle for one node
pub mod session;

// Re-export commonly used types for convenience
pub use codec::{decode, encode};
pub use common::{EncodeError, Error, NodeId, Result};
pub use config::{CodecConfig, HeaderRow};
pub use content::{Command, ContentBlock, ContentBlockModel};
pub use session::{EditSession, SessionState};
pub use tree::{NodeMetadata, NodeTree};
