use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a tree node (`unique_id` on the wire).
///
/// Ids are assigned at creation and never reused. The value `0` is reserved
/// for "no master" in the `master_id` attribute and is never a valid node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Wire value meaning "this node is not an alias".
    pub const NONE: NodeId = NodeId(0);

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Interpret a wire `master_id`: zero means no master.
    #[inline]
    pub fn master_from_wire(raw: u64) -> Option<NodeId> {
        (raw != 0).then_some(NodeId(raw))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(NodeId)
    }
}
