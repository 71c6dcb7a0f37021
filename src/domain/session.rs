//! An editing session owning the authoritative condition tree.
//!
//! The session is opened empty or from a stored document, mutated through
//! [`Edit`]s, and either committed (encoded once) or discarded. Each applied
//! edit can be undone; history is capped at `history_limit` entries.

use std::collections::VecDeque;

use crate::domain::builder::TreeBuilder;
use crate::domain::catalog::{DEFAULT_HISTORY_LIMIT, load_history_limit};
use crate::domain::codec::{decode_or_default, encode_compact};
use crate::domain::condition::ConditionTree;
use crate::domain::edit::Edit;
use crate::domain::error::ConditionError;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone)]
pub struct EditSession {
    builder: TreeBuilder,
    tree: ConditionTree,
    opened: ConditionTree,
    undo: VecDeque<ConditionTree>,
    redo: Vec<ConditionTree>,
    history_limit: usize,
}

impl EditSession {
    pub fn new(builder: TreeBuilder) -> Self {
        Self::with_tree(builder, ConditionTree::default())
    }

    /// Start from a stored document, or from the default tree when `stored`
    /// is absent or blank.
    pub fn open(builder: TreeBuilder, stored: Option<&str>) -> Result<Self, ConditionError> {
        let tree = decode_or_default(stored).inspect_err(|e| {
            tracing::warn!(error = %e, "stored condition document rejected");
        })?;
        Ok(Self::with_tree(builder, tree))
    }

    pub fn with_tree(builder: TreeBuilder, tree: ConditionTree) -> Self {
        Self {
            builder,
            opened: tree.clone(),
            tree,
            undo: VecDeque::new(),
            redo: Vec::new(),
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        while self.undo.len() > self.history_limit {
            self.undo.pop_front();
        }
        self
    }

    /// Builder and history limit both taken from configuration.
    pub fn from_config(
        config: &dyn ConfigPort,
        stored: Option<&str>,
    ) -> Result<Self, ConditionError> {
        let builder = TreeBuilder::from_config(config)?;
        let limit = load_history_limit(config)?;
        Ok(Self::open(builder, stored)?.with_history_limit(limit))
    }

    pub fn tree(&self) -> &ConditionTree {
        &self.tree
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Apply `edit`. On error the current tree and history are untouched.
    pub fn apply(&mut self, edit: Edit) -> Result<&ConditionTree, ConditionError> {
        let name = edit.name();
        let next = match edit.apply(&self.builder, &self.tree) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(edit = name, error = %e, "edit rejected");
                return Err(e);
            }
        };
        let previous = std::mem::replace(&mut self.tree, next);
        self.undo.push_back(previous);
        if self.undo.len() > self.history_limit {
            self.undo.pop_front();
        }
        self.redo.clear();
        tracing::debug!(edit = name, rules = self.tree.rule_count(), "edit applied");
        Ok(&self.tree)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.undo.pop_back() else {
            return false;
        };
        let current = std::mem::replace(&mut self.tree, previous);
        self.redo.push(current);
        tracing::debug!(remaining = self.undo.len(), "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.redo.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.tree, next);
        self.undo.push_back(current);
        tracing::debug!(remaining = self.redo.len(), "redo");
        true
    }

    /// Whether the tree differs from the one the session was opened with.
    pub fn is_dirty(&self) -> bool {
        self.tree != self.opened
    }

    /// Encode the final tree for the persistence collaborator.
    pub fn commit(self) -> Result<String, ConditionError> {
        let text = encode_compact(&self.tree)?;
        tracing::debug!(bytes = text.len(), condition = %self.tree, "session committed");
        Ok(text)
    }

    pub fn discard(self) {
        tracing::debug!(dirty = self.is_dirty(), "session discarded");
    }
}
