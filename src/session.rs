//! Edit session for one node.
//!
//! An [`EditSession`] walks the lifecycle
//! `Unloaded → Decoding → Ready → Editing → Encoding → Persisted`.
//! Opening resolves the master of a shared node, so edits to an alias are
//! always read from and written to the node that owns the content. A failure
//! while decoding or encoding leaves the session in [`SessionState::Failed`].
//!
//! The session does not lock anything: callers keep at most one session per
//! node open at a time.
//!
//! # Example
//!
//! ```
//! use cherrytree_core::content::{Command, MemoryBlobStore};
//! use cherrytree_core::config::CodecConfig;
//! use cherrytree_core::session::{EditSession, SessionState};
//! use cherrytree_core::tree::{NodeProperties, NodeTree};
//!
//! let mut tree = NodeTree::new();
//! let id = tree.add_child(None, NodeProperties::new("notes"))?;
//!
//! let mut session = EditSession::new(CodecConfig::default(), MemoryBlobStore::new());
//! session.open(&tree, id)?;
//! session.apply(Command::InsertText { block: 0, offset: 0, text: "hello".into() })?;
//! session.save(&mut tree)?;
//! assert_eq!(session.state(), SessionState::Persisted);
//! # Ok::<(), cherrytree_core::common::Error>(())
//! ```

use crate::codec;
use crate::common::{Error, NodeId, Result};
use crate::config::CodecConfig;
use crate::content::{BlobStore, Caret, Command, ContentBlockModel, MemoryBlobStore};
use crate::tree::NodeTree;

/// Lifecycle state of an [`EditSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unloaded,
    Decoding,
    /// Decoded and unchanged since
    Ready,
    /// Holds edits not yet saved
    Editing,
    Encoding,
    /// Last edit has been written back to the tree
    Persisted,
    /// Decoding or encoding failed; the session cannot be used further
    Failed,
}

impl SessionState {
    /// Whether a decoded model is available for editing.
    #[inline]
    pub fn has_model(self) -> bool {
        matches!(
            self,
            SessionState::Ready | SessionState::Editing | SessionState::Persisted
        )
    }
}

/// Decode, edit and re-encode the content of one node.
pub struct EditSession<S: BlobStore = MemoryBlobStore> {
    config: CodecConfig,
    store: S,
    state: SessionState,
    /// Node the session was opened for
    node: NodeId,
    /// Node owning the content (differs from `node` for aliases)
    master: NodeId,
    model: Option<ContentBlockModel>,
    caret: Option<Caret>,
}

impl<S: BlobStore> EditSession<S> {
    pub fn new(config: CodecConfig, store: S) -> Self {
        Self {
            config,
            store,
            state: SessionState::Unloaded,
            node: NodeId::NONE,
            master: NodeId::NONE,
            model: None,
            caret: None,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Node the session was opened for.
    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Node whose content is being edited.
    #[inline]
    pub fn master_id(&self) -> NodeId {
        self.master
    }

    pub fn model(&self) -> Option<&ContentBlockModel> {
        self.model.as_ref()
    }

    /// Caret position reported by the last list command.
    pub fn caret(&self) -> Option<Caret> {
        self.caret
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Load and decode node `id` from `tree`.
    ///
    /// A shared node is redirected to its master. Unsaved edits must be saved
    /// before another node is opened.
    pub fn open(&mut self, tree: &NodeTree, id: NodeId) -> Result<&ContentBlockModel> {
        match self.state {
            SessionState::Unloaded | SessionState::Ready | SessionState::Persisted => {},
            other => {
                return Err(Error::InvalidState(format!(
                    "cannot open node {} while {:?}",
                    id, other
                )));
            },
        }
        let master = tree.resolve_master(id)?;
        let markup = tree.load_raw_markup(master)?;

        self.state = SessionState::Decoding;
        self.node = id;
        self.master = master;
        self.model = None;
        self.caret = None;
        match codec::decode(master, &markup, &self.config, &mut self.store) {
            Ok(model) => {
                log::debug!("event=session_open node={} master={}", id, master);
                self.state = SessionState::Ready;
                Ok(self.model.insert(model))
            },
            Err(e) => {
                log::warn!("event=session_failed node={} phase=decode error={}", id, e);
                self.state = SessionState::Failed;
                Err(e)
            },
        }
    }

    /// Apply one edit. A rejected edit leaves model and state untouched.
    pub fn apply(&mut self, cmd: Command) -> Result<Option<Caret>> {
        if !self.state.has_model() {
            return Err(Error::InvalidState(format!(
                "cannot edit while {:?}",
                self.state
            )));
        }
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no model loaded".to_string()))?;
        let caret = model.apply(cmd)?;
        if caret.is_some() {
            self.caret = caret;
        }
        self.state = SessionState::Editing;
        Ok(caret)
    }

    /// Encode the model and store it under the master node.
    ///
    /// Pending attachments are committed once the markup is stored.
    pub fn save(&mut self, tree: &mut NodeTree) -> Result<()> {
        if !self.state.has_model() {
            return Err(Error::InvalidState(format!(
                "cannot save while {:?}",
                self.state
            )));
        }
        let model = self
            .model
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no model loaded".to_string()))?;
        let meta = tree.node_metadata(self.master)?;

        self.state = SessionState::Encoding;
        let bytes = match codec::encode(&meta, model, &self.config, &self.store) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!(
                    "event=session_failed node={} phase=encode error={}",
                    self.node,
                    e
                );
                self.state = SessionState::Failed;
                return Err(e);
            },
        };
        let len = bytes.len();
        if let Err(e) = tree.store_raw_markup(self.master, bytes) {
            self.state = SessionState::Failed;
            return Err(e);
        }
        let committed = model.commit_pending();
        log::debug!(
            "event=session_save node={} master={} bytes={} committed={}",
            self.node,
            self.master,
            len,
            committed
        );
        self.state = SessionState::Persisted;
        Ok(())
    }
}
