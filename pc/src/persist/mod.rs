//! Result persistence collaborator contract
//!
//! On success, a node's generation output is handed to the host for storage
//! alongside the node (the engine keeps no results of its own). A sink
//! failure affects that node only; the run continues.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::NodeId;
use crate::generation::GenerationOutput;

/// Error persisting one node's result
#[derive(Debug, Error)]
#[error("failed to persist result for node {node_id}: {message}")]
pub struct PersistError {
    pub node_id: NodeId,
    pub message: String,
}

impl PersistError {
    pub fn new(node_id: impl Into<NodeId>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
        }
    }
}

/// Persists a node's generation output
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist(&self, node_id: &NodeId, output: &GenerationOutput) -> Result<(), PersistError>;
}
