//! Prompt resolution collaborator contract
//!
//! Before a node is sent to the generation client, the host resolves its
//! effective inputs: prompt fields, inherited conversation context, and
//! variable substitution (system variables may be seeded by earlier siblings'
//! outputs, which is why execution order is load-bearing). All of that logic
//! lives on the host's side of this trait.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{NodeId, NodeRecord};

/// Effective generation inputs for one node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrompt {
    /// Final prompt text after variable substitution
    pub text: String,

    /// Conversation context contributed by ancestor nodes
    #[serde(default)]
    pub system: Option<String>,

    /// Values substituted into the template, kept for observability
    #[serde(default)]
    pub variables: HashMap<String, serde_json::Value>,
}

impl ResolvedPrompt {
    /// Create a resolved prompt from plain text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            system: None,
            variables: HashMap::new(),
        }
    }
}

/// Errors from prompt resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The node's prompt fields could not produce inputs; the node fails and
    /// the run continues
    #[error("cannot resolve inputs for node {node_id}: {message}")]
    NodeInputs { node_id: NodeId, message: String },

    /// The substitution subsystem itself is unavailable; fatal to the run
    #[error("prompt resolution unavailable: {0}")]
    Unavailable(String),
}

impl ResolveError {
    /// Whether this failure aborts the whole run rather than one node
    pub fn is_structural(&self) -> bool {
        matches!(self, ResolveError::Unavailable(_))
    }
}

/// Resolves a node's effective generation inputs
#[async_trait]
pub trait PromptResolver: Send + Sync {
    async fn resolve(&self, node: &NodeRecord) -> Result<ResolvedPrompt, ResolveError>;
}
