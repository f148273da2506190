//! Event types for cascade activity streaming
//!
//! These events represent all observable activity in a cascade run:
//! - Run lifecycle (started, completed, failed)
//! - Level and node progress
//! - Control activity (pause, resume, cancel, preview toggle)

use serde::{Deserialize, Serialize};

use crate::domain::SkipReason;

/// Core event enum - the vocabulary of cascade activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CascadeEvent {
    // === Run Lifecycle ===
    /// A cascade run has started
    RunStarted {
        run_id: String,
        root_id: String,
        total_levels: usize,
        total_node_count: usize,
    },
    /// A run finished; cancelled runs also end here with partial results
    RunCompleted {
        run_id: String,
        completed: usize,
        failed: usize,
        skipped: usize,
        cancelled: bool,
    },
    /// A structural error aborted the run
    RunFailed { run_id: String, message: String },

    // === Level / Node Progress ===
    /// A level has started
    LevelStarted {
        run_id: String,
        level_index: usize,
        total_levels: usize,
        node_count: usize,
    },
    /// A node's generation step is being dispatched
    NodeStarted {
        run_id: String,
        node_id: String,
        node_name: String,
        level_index: usize,
    },
    /// A node's result was generated and persisted
    NodeCompleted {
        run_id: String,
        node_id: String,
        input_tokens: u64,
        output_tokens: u64,
        latency_ms: u64,
    },
    /// A node failed with a per-node error; the run continues
    NodeFailed {
        run_id: String,
        node_id: String,
        message: String,
    },
    /// A node was excluded by eligibility rules during planning
    NodeSkipped {
        run_id: String,
        node_id: String,
        reason: SkipReason,
    },

    // === Control Activity ===
    /// The loop reached a suspension point with a pause latched
    RunPaused { run_id: String },
    /// The loop resumed at the next unprocessed node
    RunResumed { run_id: String },
    /// A cancel was latched; the in-flight call may still settle
    CancelRequested { run_id: String },
    /// The skip-all-previews toggle changed
    PreviewSkipToggled { run_id: String, skip_all: bool },
}

impl CascadeEvent {
    /// Get the run ID for this event
    pub fn run_id(&self) -> &str {
        match self {
            CascadeEvent::RunStarted { run_id, .. }
            | CascadeEvent::RunCompleted { run_id, .. }
            | CascadeEvent::RunFailed { run_id, .. }
            | CascadeEvent::LevelStarted { run_id, .. }
            | CascadeEvent::NodeStarted { run_id, .. }
            | CascadeEvent::NodeCompleted { run_id, .. }
            | CascadeEvent::NodeFailed { run_id, .. }
            | CascadeEvent::NodeSkipped { run_id, .. }
            | CascadeEvent::RunPaused { run_id }
            | CascadeEvent::RunResumed { run_id }
            | CascadeEvent::CancelRequested { run_id }
            | CascadeEvent::PreviewSkipToggled { run_id, .. } => run_id,
        }
    }

    /// Get a short type name for logging and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            CascadeEvent::RunStarted { .. } => "RunStarted",
            CascadeEvent::RunCompleted { .. } => "RunCompleted",
            CascadeEvent::RunFailed { .. } => "RunFailed",
            CascadeEvent::LevelStarted { .. } => "LevelStarted",
            CascadeEvent::NodeStarted { .. } => "NodeStarted",
            CascadeEvent::NodeCompleted { .. } => "NodeCompleted",
            CascadeEvent::NodeFailed { .. } => "NodeFailed",
            CascadeEvent::NodeSkipped { .. } => "NodeSkipped",
            CascadeEvent::RunPaused { .. } => "RunPaused",
            CascadeEvent::RunResumed { .. } => "RunResumed",
            CascadeEvent::CancelRequested { .. } => "CancelRequested",
            CascadeEvent::PreviewSkipToggled { .. } => "PreviewSkipToggled",
        }
    }
}
