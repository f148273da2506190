//! Generation request/response types
//!
//! Models one generation call for a single node. Provider-agnostic: the host
//! wires whatever backend it uses behind [`GenerationClient`](super::GenerationClient).

use serde::{Deserialize, Serialize};

use crate::domain::NodeRecord;
use crate::prompts::ResolvedPrompt;

/// A generation request - everything needed for one call
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Identifier of the cascade run issuing this call
    pub run_id: String,

    /// The node being generated
    pub node: NodeRecord,

    /// Effective inputs resolved by the host
    pub prompt: ResolvedPrompt,

    /// Suppress the per-node preview confirmation step
    ///
    /// Read from run state at dispatch time; the operator may toggle it
    /// mid-run.
    pub skip_preview: bool,
}

/// Result of a successful generation call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// The textual result
    pub text: String,

    /// Usage and latency metadata
    #[serde(default)]
    pub usage: UsageMetadata,
}

impl GenerationOutput {
    /// Create an output with default usage metadata
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: UsageMetadata::default(),
        }
    }
}

/// Usage metadata reported by the generation backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Input tokens consumed
    pub input_tokens: u64,
    /// Output tokens produced
    pub output_tokens: u64,
    /// Wall-clock latency of the call in milliseconds
    pub latency_ms: u64,
}
