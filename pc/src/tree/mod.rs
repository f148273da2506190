//! Tree provider contract
//!
//! The prompt hierarchy lives in the authoring application's store. The
//! engine reads it through this narrow interface: node lookup plus ordered
//! children. Child order is the provider's stable ordering (typically a
//! lexicographic position key) and is also the execution order within a
//! level.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::{NodeId, NodeRecord};

/// Read contract the engine requires from the tree store
#[async_trait]
pub trait TreeProvider: Send + Sync {
    /// Look up a single node; None if it does not exist
    async fn node(&self, id: &NodeId) -> Option<NodeRecord>;

    /// Ordered children of a node
    ///
    /// Unknown ids yield an empty list rather than an error.
    async fn children_of(&self, id: &NodeId) -> Vec<NodeRecord>;
}

/// In-memory tree provider
///
/// Useful for hosts without a backing store, demos, and tests. Children keep
/// insertion order.
#[derive(Debug, Default)]
pub struct StaticTree {
    nodes: HashMap<NodeId, NodeRecord>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl StaticTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, optionally under a parent
    ///
    /// Roots are inserted with `parent = None`. Sibling order is insertion
    /// order.
    pub fn insert(&mut self, parent: Option<&str>, node: NodeRecord) -> &mut Self {
        debug!(node_id = %node.id, ?parent, "StaticTree::insert: called");
        if let Some(parent_id) = parent {
            self.children
                .entry(parent_id.to_string())
                .or_default()
                .push(node.id.clone());
        }
        self.nodes.insert(node.id.clone(), node);
        self
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[async_trait]
impl TreeProvider for StaticTree {
    async fn node(&self, id: &NodeId) -> Option<NodeRecord> {
        debug!(%id, "StaticTree::node: called");
        self.nodes.get(id).cloned()
    }

    async fn children_of(&self, id: &NodeId) -> Vec<NodeRecord> {
        debug!(%id, "StaticTree::children_of: called");
        self.children
            .get(id)
            .map(|ids| ids.iter().filter_map(|cid| self.nodes.get(cid).cloned()).collect())
            .unwrap_or_default()
    }
}
