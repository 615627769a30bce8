//! Node tree index.
//!
//! Holds every node by id together with the parent/child order, node markup
//! and bookmarks. Node ids grow monotonically and are never handed out twice,
//! even after a node leaves the index.

use super::node::{Node, NodeFlags, NodeMetadata, NodeProperties, timestamp_now};
use crate::common::{Error, NodeId, Result};
use bytes::Bytes;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    /// Top-level nodes in order
    roots: Vec<NodeId>,
    bookmarks: Vec<NodeId>,
    /// Highest id ever assigned
    max_id: u64,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(Error::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(Error::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn next_id(&mut self) -> NodeId {
        self.max_id += 1;
        NodeId(self.max_id)
    }

    /// Create a node as the last child of `parent` (or as a top-level node).
    pub fn add_child(&mut self, parent: Option<NodeId>, props: NodeProperties) -> Result<NodeId> {
        if let Some(p) = parent {
            self.node(p)?;
        }
        let id = self.next_id();
        let mut node = Node::new(id, props);
        node.parent = parent;
        self.nodes.insert(id, node);
        self.siblings_mut(parent)?.push(id);
        log::debug!("event=add_node id={} parent={:?}", id, parent.map(NodeId::get));
        Ok(id)
    }

    /// Create a node directly after `of`, under the same parent.
    pub fn add_sibling(&mut self, of: NodeId, props: NodeProperties) -> Result<NodeId> {
        let parent = self.node(of)?.parent;
        let id = self.next_id();
        let mut node = Node::new(id, props);
        node.parent = parent;
        self.nodes.insert(id, node);
        let siblings = self.siblings_mut(parent)?;
        let pos = siblings.iter().position(|&s| s == of).map_or(siblings.len(), |p| p + 1);
        siblings.insert(pos, id);
        log::debug!("event=add_node id={} sibling_of={}", id, of);
        Ok(id)
    }

    /// Replace a node's name, type, flags and cosmetic properties.
    pub fn update_properties(&mut self, id: NodeId, props: NodeProperties) -> Result<()> {
        self.node_mut(id)?.props = props;
        Ok(())
    }

    /// Make `id` share the content of `master`.
    pub fn set_master(&mut self, id: NodeId, master: Option<NodeId>) -> Result<()> {
        if let Some(m) = master {
            if m == id {
                return Err(Error::InvalidOperation(format!(
                    "node {} cannot be its own master",
                    id
                )));
            }
            self.node(m)?;
        }
        self.node_mut(id)?.master = master;
        Ok(())
    }

    /// Reparent `id` under `new_parent` at `position` (end when `None`).
    ///
    /// The node keeps its id and its subtree. Moving a node under itself or
    /// one of its descendants is an [`Error::InvalidMove`].
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        position: Option<usize>,
    ) -> Result<()> {
        let old_parent = self.node(id)?.parent;
        if let Some(p) = new_parent {
            self.node(p)?;
            if p == id || self.is_ancestor(id, p) {
                return Err(Error::InvalidMove(format!(
                    "node {} cannot move under its own subtree ({})",
                    id, p
                )));
            }
        }

        let old = self.siblings_mut(old_parent)?;
        let old_pos = old.iter().position(|&s| s == id);
        if let Some(pos) = old_pos {
            old.remove(pos);
        }
        let target = self.siblings_mut(new_parent)?;
        let pos = match position {
            Some(pos) if pos <= target.len() => pos,
            Some(pos) => {
                let len = target.len();
                // Put the node back before failing.
                if let Some(old_pos) = old_pos {
                    self.siblings_mut(old_parent)?.insert(old_pos, id);
                }
                return Err(Error::InvalidMove(format!(
                    "position {} out of range 0..={}",
                    pos, len
                )));
            },
            None => target.len(),
        };
        target.insert(pos, id);
        self.node_mut(id)?.parent = new_parent;
        log::debug!(
            "event=move_node id={} parent={:?} position={}",
            id,
            new_parent.map(NodeId::get),
            pos
        );
        Ok(())
    }

    /// Whether `ancestor` is a proper ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut cur = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.nodes.get(&p).and_then(|n| n.parent);
        }
        false
    }

    /// Children of `parent`, or the top-level nodes.
    pub fn children(&self, parent: Option<NodeId>) -> Result<&[NodeId]> {
        match parent {
            Some(p) => Ok(&self.node(p)?.children),
            None => Ok(&self.roots),
        }
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    pub fn has_children(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.has_children())
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> Result<&mut Vec<NodeId>> {
        match parent {
            Some(p) => Ok(&mut self.node_mut(p)?.children),
            None => Ok(&mut self.roots),
        }
    }

    /// Node markup as last stored.
    pub fn load_raw_markup(&self, id: NodeId) -> Result<Bytes> {
        Ok(self.node(id)?.markup.clone())
    }

    /// Store node markup and stamp the save time.
    pub fn store_raw_markup(&mut self, id: NodeId, markup: impl Into<Bytes>) -> Result<()> {
        let node = self.node_mut(id)?;
        node.markup = markup.into();
        node.ts_lastsave = timestamp_now();
        log::debug!("event=store_markup id={} bytes={}", id, node.markup.len());
        Ok(())
    }

    pub fn node_metadata(&self, id: NodeId) -> Result<NodeMetadata> {
        Ok(self.node(id)?.metadata())
    }

    /// Follow master links to the node that owns the content.
    pub fn resolve_master(&self, id: NodeId) -> Result<NodeId> {
        let mut cur = id;
        for _ in 0..=self.nodes.len() {
            match self.node(cur)?.master {
                Some(m) => cur = m,
                None => return Ok(cur),
            }
        }
        Err(Error::InvalidOperation(format!(
            "master chain of node {} loops",
            id
        )))
    }

    /// Nodes a search should visit, in document order.
    ///
    /// A node is skipped when it excludes itself or when any ancestor
    /// excludes its children.
    pub fn search_candidates(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.props.flags.contains(NodeFlags::EXCLUDE_SELF) {
                out.push(id);
            }
            if !node.props.flags.contains(NodeFlags::EXCLUDE_CHILDREN) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every node with its depth, parents before children.
    pub fn depth_first(&self) -> Vec<(NodeId, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(NodeId, usize)> = self.roots.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }
        out
    }

    #[inline]
    pub fn bookmarks(&self) -> &[NodeId] {
        &self.bookmarks
    }

    /// Bookmark a node; bookmarking twice is a no-op.
    pub fn add_bookmark(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        if !self.bookmarks.contains(&id) {
            self.bookmarks.push(id);
        }
        Ok(())
    }

    pub fn remove_bookmark(&mut self, id: NodeId) -> bool {
        let before = self.bookmarks.len();
        self.bookmarks.retain(|&b| b != id);
        self.bookmarks.len() != before
    }

    /// Insert a node read from a file, keeping its id.
    pub(crate) fn insert_loaded(&mut self, mut node: Node, parent: Option<NodeId>) -> Result<()> {
        let id = node.id;
        if id == NodeId::NONE || self.nodes.contains_key(&id) {
            return Err(Error::malformed(
                "node",
                format!("duplicate or reserved unique_id {}", id),
            ));
        }
        node.parent = parent;
        self.siblings_mut(parent)?.push(id);
        self.max_id = self.max_id.max(id.get());
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Attach markup read from a file, keeping the stored save time.
    pub(crate) fn set_loaded_markup(&mut self, id: NodeId, markup: Bytes) -> Result<()> {
        self.node_mut(id)?.markup = markup;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// a
    /// ├── b
    /// │   └── c
    /// └── d
    /// e
    fn sample() -> (NodeTree, [NodeId; 5]) {
        let mut t = NodeTree::new();
        let a = t.add_child(None, NodeProperties::new("a")).unwrap();
        let b = t.add_child(Some(a), NodeProperties::new("b")).unwrap();
        let c = t.add_child(Some(b), NodeProperties::new("c")).unwrap();
        let d = t.add_child(Some(a), NodeProperties::new("d")).unwrap();
        let e = t.add_sibling(a, NodeProperties::new("e")).unwrap();
        (t, [a, b, c, d, e])
    }

    #[test]
    fn test_ids_and_order() {
        let (mut t, [a, b, _c, d, e]) = sample();
        assert_eq!(e, NodeId(5));
        assert_eq!(t.children(None).unwrap(), &[a, e]);
        assert_eq!(t.children(Some(a)).unwrap(), &[b, d]);
        let x = t.add_sibling(b, NodeProperties::new("x")).unwrap();
        assert_eq!(t.children(Some(a)).unwrap(), &[b, x, d]);
        assert!(t.has_children(a).unwrap());
        assert!(!t.has_children(d).unwrap());
        assert_eq!(t.parent(x).unwrap(), Some(a));
    }

    #[test]
    fn test_move_rejects_cycle() {
        let (mut t, [a, b, c, d, _e]) = sample();
        assert!(matches!(t.move_node(a, Some(c), None), Err(Error::InvalidMove(_))));
        assert!(matches!(t.move_node(b, Some(b), None), Err(Error::InvalidMove(_))));
        assert!(t.move_node(d, Some(b), Some(9)).is_err());
        assert_eq!(t.children(Some(a)).unwrap(), &[b, d]);

        t.move_node(c, None, Some(0)).unwrap();
        assert_eq!(t.children(None).unwrap()[0], c);
        assert_eq!(t.parent(c).unwrap(), None);
        assert!(!t.has_children(b).unwrap());
    }

    #[test]
    fn test_search_candidates_respects_flags() {
        let (mut t, [a, b, c, d, e]) = sample();
        assert_eq!(t.search_candidates(), vec![a, b, c, d, e]);
        let props = t.node(b).unwrap().properties().clone();
        t.update_properties(b, props.with_flags(NodeFlags::EXCLUDE_CHILDREN))
            .unwrap();
        let props = t.node(d).unwrap().properties().clone();
        t.update_properties(d, props.with_flags(NodeFlags::EXCLUDE_SELF))
            .unwrap();
        assert_eq!(t.search_candidates(), vec![a, b, e]);
        assert_eq!(t.node(b).unwrap().name(), "b");
    }

    #[test]
    fn test_resolve_master() {
        let (mut t, [a, b, c, _d, _e]) = sample();
        t.set_master(c, Some(b)).unwrap();
        t.set_master(b, Some(a)).unwrap();
        assert_eq!(t.resolve_master(c).unwrap(), a);
        assert!(t.node_metadata(c).unwrap().is_shared());
        t.set_master(a, Some(c)).unwrap();
        assert!(t.resolve_master(c).is_err());
        assert!(t.set_master(a, Some(a)).is_err());
    }

    #[test]
    fn test_markup_and_bookmarks() {
        let (mut t, [a, _b, _c, d, _e]) = sample();
        assert!(t.load_raw_markup(a).unwrap().is_empty());
        t.store_raw_markup(a, b"<node/>".to_vec()).unwrap();
        assert_eq!(&t.load_raw_markup(a).unwrap()[..], b"<node/>");
        assert!(matches!(
            t.load_raw_markup(NodeId(99)),
            Err(Error::NodeNotFound(NodeId(99)))
        ));

        t.add_bookmark(d).unwrap();
        t.add_bookmark(d).unwrap();
        assert_eq!(t.bookmarks(), &[d]);
        assert!(t.remove_bookmark(d));
        assert!(t.add_bookmark(NodeId(42)).is_err());
    }

    #[test]
    fn test_depth_first() {
        let (t, [a, b, c, d, e]) = sample();
        assert_eq!(t.depth_first(), vec![(a, 0), (b, 1), (c, 2), (d, 1), (e, 0)]);
    }
}
