//! Embedded objects positioned inside a text run.

use super::blob::Checksum;
use super::types::Justification;
use crate::common::NodeId;
use serde::{Deserialize, Serialize};

/// An image stored inline in the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageObject {
    /// Node the image was read from or attached to
    pub node_id: NodeId,
    /// Save timestamp as written on the wire
    pub time: String,
    pub checksum: Checksum,
    /// Optional link target (same encoding as a link span's `link` value)
    pub link: Option<String>,
}

/// A file attached to the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentObject {
    pub node_id: NodeId,
    pub filename: String,
    pub time: String,
    pub checksum: Checksum,
    /// Attached client-side and not yet committed to storage
    pub pending: bool,
}

/// A rendered LaTeX formula; only the source travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaObject {
    pub source: String,
    pub time: String,
}

/// A named anchor that node links can target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorObject {
    pub name: String,
}

/// Closed set of embedded object kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Image(ImageObject),
    Formula(FormulaObject),
    Attachment(AttachmentObject),
    Anchor(AnchorObject),
}

/// An object sitting at a character offset of its run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedObject {
    /// Character offset inside the owning text block
    pub offset: usize,
    /// Tie-break among objects at the same offset (document order)
    pub rank: u32,
    pub justification: Justification,
    pub kind: ObjectKind,
}

impl EmbeddedObject {
    pub fn new(offset: usize, justification: Justification, kind: ObjectKind) -> Self {
        Self {
            offset,
            rank: 0,
            justification,
            kind,
        }
    }

    /// Blob key for objects whose payload lives in a blob store.
    pub fn checksum(&self) -> Option<&Checksum> {
        match &self.kind {
            ObjectKind::Image(img) => Some(&img.checksum),
            ObjectKind::Attachment(att) => Some(&att.checksum),
            ObjectKind::Formula(_) | ObjectKind::Anchor(_) => None,
        }
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(&self.kind, ObjectKind::Attachment(att) if att.pending)
    }
}
