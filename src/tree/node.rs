//! Tree node records.

use crate::common::NodeId;
use bitflags::bitflags;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// `prog_lang` value of rich text nodes.
pub const PROG_LANG_RICH_TEXT: &str = "custom-colors";

/// `prog_lang` value of plain text nodes.
pub const PROG_LANG_PLAIN_TEXT: &str = "plain-text";

bitflags! {
    /// Per-node boolean properties.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct NodeFlags: u8 {
        /// Content cannot be edited (`readonly`)
        const READ_ONLY = 0x01;
        /// Node itself is skipped by search (`nosearch_me`)
        const EXCLUDE_SELF = 0x02;
        /// Every descendant is skipped by search (`nosearch_ch`)
        const EXCLUDE_CHILDREN = 0x04;
        /// Name shown in bold (`is_bold`)
        const BOLD = 0x08;
    }
}

/// How a node's content is edited and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeType {
    #[default]
    RichText,
    PlainText,
    /// Syntax highlighted with the named language
    Code(String),
}

impl NodeType {
    pub fn from_prog_lang(value: &str) -> Self {
        match value {
            PROG_LANG_RICH_TEXT => NodeType::RichText,
            PROG_LANG_PLAIN_TEXT => NodeType::PlainText,
            lang => NodeType::Code(lang.to_string()),
        }
    }

    pub fn prog_lang(&self) -> &str {
        match self {
            NodeType::RichText => PROG_LANG_RICH_TEXT,
            NodeType::PlainText => PROG_LANG_PLAIN_TEXT,
            NodeType::Code(lang) => lang,
        }
    }
}

/// User-editable node properties.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NodeProperties {
    pub name: String,
    pub node_type: NodeType,
    pub flags: NodeFlags,
    /// Space separated tags, as written
    pub tags: String,
    pub custom_icon_id: u32,
    /// Name color (`#rrggbb`), empty for the default
    pub foreground: String,
}

impl NodeProperties {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = node_type;
        self
    }

    #[inline]
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    /// Node whose content this one shares
    pub(crate) master: Option<NodeId>,
    pub(crate) props: NodeProperties,
    /// Creation time in seconds, as written
    pub(crate) ts_creation: String,
    /// Last save time in seconds, as written
    pub(crate) ts_lastsave: String,
    /// Node markup of the content
    pub(crate) markup: Bytes,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, props: NodeProperties) -> Self {
        let now = timestamp_now();
        Self {
            id,
            master: None,
            props,
            ts_creation: now.clone(),
            ts_lastsave: now,
            markup: Bytes::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn master(&self) -> Option<NodeId> {
        self.master
    }

    #[inline]
    pub fn properties(&self) -> &NodeProperties {
        &self.props
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.props.name
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn ts_creation(&self) -> &str {
        &self.ts_creation
    }

    pub fn ts_lastsave(&self) -> &str {
        &self.ts_lastsave
    }

    pub fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            id: self.id,
            master: self.master,
            node_type: self.props.node_type.clone(),
            flags: self.props.flags,
        }
    }
}

/// What the codec needs to know about a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMetadata {
    pub id: NodeId,
    pub master: Option<NodeId>,
    pub node_type: NodeType,
    pub flags: NodeFlags,
}

impl NodeMetadata {
    /// Metadata of a standalone rich text node.
    pub fn rich_text(id: NodeId) -> Self {
        Self {
            id,
            master: None,
            node_type: NodeType::RichText,
            flags: NodeFlags::empty(),
        }
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.master.is_some()
    }
}

/// Current time as the seconds string written to `ts_*` attributes.
pub(crate) fn timestamp_now() -> String {
    let now = chrono::Utc::now();
    format!("{}.{:03}", now.timestamp(), now.timestamp_subsec_millis())
}
