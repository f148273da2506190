//! Node types as seen by the cascade engine
//!
//! The authoring application owns arbitrary per-node payloads (prompt fields,
//! icons, editor state). The engine only ever reads this narrow view: identity
//! plus the flags that decide eligibility.

use serde::{Deserialize, Serialize};

/// Identifier of a prompt node in the authoring tree
pub type NodeId = String;

/// Narrow view of a prompt node
///
/// Supplied by the [`TreeProvider`](crate::tree::TreeProvider). Everything the
/// cascade does not need stays on the provider's side of the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique identifier
    pub id: NodeId,

    /// Display name, shown by progress observers
    pub name: String,

    /// AI-backed conversational node
    #[serde(default)]
    pub is_assistant: bool,

    /// Node opted out of cascade execution
    #[serde(default)]
    pub exclude_from_cascade: bool,

    /// Soft-deleted (trashed) in the authoring tree
    #[serde(default)]
    pub is_deleted: bool,
}

impl NodeRecord {
    /// Create a node record with default flags
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_assistant: false,
            exclude_from_cascade: false,
            is_deleted: false,
        }
    }

    /// Set the assistant flag
    pub fn with_assistant(mut self, is_assistant: bool) -> Self {
        self.is_assistant = is_assistant;
        self
    }

    /// Set the cascade exclusion flag
    pub fn with_excluded(mut self, excluded: bool) -> Self {
        self.exclude_from_cascade = excluded;
        self
    }

    /// Set the soft-deleted flag
    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.is_deleted = deleted;
        self
    }

    /// Whether this node is eligible for cascade execution
    ///
    /// Eligible means not flagged `exclude_from_cascade` and not soft-deleted.
    pub fn is_eligible(&self) -> bool {
        !self.exclude_from_cascade && !self.is_deleted
    }
}
