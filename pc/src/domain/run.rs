//! Run state domain types
//!
//! Tracks the runtime state of one cascade run. A run is ephemeral: it lives
//! in memory for one interactive session and is discarded on terminal
//! transition or on the next start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Cascade run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// No cascade active
    #[default]
    Idle,
    /// Actively processing nodes
    Running,
    /// User paused; resumes at the next unprocessed node
    Paused,
    /// Cancel requested; the in-flight call may still be settling
    Cancelling,
    /// Terminal: run finished, including cooperative cancellation
    Completed,
    /// Terminal: a structural error aborted the run
    Failed,
}

impl RunStatus {
    /// Whether the run has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a run is currently in progress
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Cancelling)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Cancelling => write!(f, "cancelling"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why a node was excluded during planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The node's `exclude_from_cascade` flag is set
    ExcludedFlag,
    /// The node is soft-deleted in the authoring tree
    SoftDeleted,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExcludedFlag => write!(f, "excluded_flag"),
            Self::SoftDeleted => write!(f, "soft_deleted"),
        }
    }
}

/// A node excluded by eligibility rules, recorded at planning time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedNode {
    pub node_id: NodeId,
    pub node_name: String,
    pub reason: SkipReason,
}

/// A node whose generation step failed with a per-node error
///
/// Distinct from both completed and skipped nodes: a failed node was
/// attempted, and its failure does not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedNode {
    pub node_id: NodeId,
    pub node_name: String,
    pub error: String,
}

/// Usage totals accumulated across the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunUsage {
    /// Total input tokens across all generation calls
    pub input_tokens: u64,
    /// Total output tokens across all generation calls
    pub output_tokens: u64,
    /// Total generation latency in milliseconds
    pub generation_ms: u64,
}

/// The single live state of a cascade
///
/// Exactly one instance exists per executor. All mutation goes through the
/// [`RunStateStore`](crate::state::RunStateStore) command API; observers see
/// read-only clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique identifier of the current (or most recent) run
    pub run_id: Option<String>,

    /// Current status
    pub status: RunStatus,

    /// Node the cascade was started from
    pub root_id: Option<NodeId>,

    /// Index of the level currently being processed (0-based)
    pub current_level_index: usize,

    /// Number of non-empty levels in the plan
    pub total_levels: usize,

    /// Node currently being (or about to be) processed
    pub current_node_id: Option<NodeId>,

    /// Display name of the current node
    pub current_node_name: Option<String>,

    /// Count of all eligible nodes across all levels, fixed at planning
    pub total_node_count: usize,

    /// Nodes that finished successfully, in execution order; never shrinks
    pub completed_node_ids: Vec<NodeId>,

    /// Nodes excluded by eligibility rules; append-only
    pub skipped_nodes: Vec<SkippedNode>,

    /// Nodes attempted and failed with a per-node error; append-only
    pub failed_nodes: Vec<FailedNode>,

    /// Set once at the transition to Running; None once the run ends
    pub started_at: Option<DateTime<Utc>>,

    /// Suppress the per-node preview confirmation step
    pub skip_all_previews: bool,

    /// Message of the structural error that failed the run, if any
    pub last_error: Option<String>,

    /// Accumulated usage metadata
    pub usage: RunUsage,
}

impl Default for RunState {
    fn default() -> Self {
        Self::idle()
    }
}

impl RunState {
    /// State before any cascade has started
    pub fn idle() -> Self {
        Self {
            run_id: None,
            status: RunStatus::Idle,
            root_id: None,
            current_level_index: 0,
            total_levels: 0,
            current_node_id: None,
            current_node_name: None,
            total_node_count: 0,
            completed_node_ids: Vec::new(),
            skipped_nodes: Vec::new(),
            failed_nodes: Vec::new(),
            started_at: None,
            skip_all_previews: false,
            last_error: None,
            usage: RunUsage::default(),
        }
    }

    /// Number of successfully completed nodes
    pub fn completed_count(&self) -> usize {
        self.completed_node_ids.len()
    }

    /// Number of nodes that failed with a per-node error
    pub fn failed_count(&self) -> usize {
        self.failed_nodes.len()
    }

    /// Number of nodes excluded by eligibility rules
    pub fn skipped_count(&self) -> usize {
        self.skipped_nodes.len()
    }

    /// One-line end-of-run summary for display
    pub fn summary(&self) -> String {
        format!(
            "{} completed / {} failed / {} skipped",
            self.completed_count(),
            self.failed_count(),
            self.skipped_count()
        )
    }
}
