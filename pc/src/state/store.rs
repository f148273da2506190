//! RunStateStore - single-writer run state with reactive snapshots
//!
//! Exactly one [`RunState`] lives behind this store. The executor mutates it
//! through the command methods below (crate-private, preserving the
//! single-writer discipline); observers read clones through [`snapshot`] or
//! subscribe to the watch channel and receive a fresh snapshot after every
//! mutation.
//!
//! [`snapshot`]: RunStateStore::snapshot

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{FailedNode, NodeId, RunState, RunStatus, SkippedNode};
use crate::generation::UsageMetadata;

/// Handle to the single live run state
///
/// Cheap to clone; all clones address the same state.
#[derive(Clone)]
pub struct RunStateStore {
    tx: watch::Sender<RunState>,
}

impl RunStateStore {
    /// Create a store holding an idle state
    pub fn new() -> Self {
        debug!("RunStateStore::new: called");
        let (tx, _) = watch::channel(RunState::idle());
        Self { tx }
    }

    /// Read a snapshot of the current state
    pub fn snapshot(&self) -> RunState {
        self.tx.borrow().clone()
    }

    /// Current status without cloning the full state
    pub fn status(&self) -> RunStatus {
        self.tx.borrow().status
    }

    /// Subscribe to state changes
    ///
    /// The receiver yields a full snapshot after every mutation. Callers
    /// compute elapsed time themselves from `started_at`.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        debug!("RunStateStore::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Atomically claim the store for a fresh run
    ///
    /// Fails (returns false) if a run is already active. On success the prior
    /// state is discarded, except the skip-previews toggle, which is an
    /// operator preference that outlives a single run.
    pub(crate) fn try_begin_run(
        &self,
        run_id: &str,
        root_id: &NodeId,
        total_levels: usize,
        total_node_count: usize,
        skipped_nodes: Vec<SkippedNode>,
    ) -> bool {
        debug!(%run_id, %root_id, total_levels, total_node_count, "RunStateStore::try_begin_run: called");
        let mut claimed = false;
        self.tx.send_modify(|state| {
            if state.status.is_active() {
                return;
            }
            let skip_all_previews = state.skip_all_previews;
            *state = RunState::idle();
            state.run_id = Some(run_id.to_string());
            state.status = RunStatus::Running;
            state.root_id = Some(root_id.clone());
            state.total_levels = total_levels;
            state.total_node_count = total_node_count;
            state.skipped_nodes = skipped_nodes;
            state.started_at = Some(chrono::Utc::now());
            state.skip_all_previews = skip_all_previews;
            claimed = true;
        });
        if !claimed {
            warn!(%run_id, "RunStateStore::try_begin_run: a run is already active");
        }
        claimed
    }

    /// Fill in the numbers produced by planning
    ///
    /// Called once per run, after the claim and before the first node.
    pub(crate) fn set_plan(&self, total_levels: usize, total_node_count: usize, skipped_nodes: Vec<SkippedNode>) {
        debug!(total_levels, total_node_count, skipped = skipped_nodes.len(), "RunStateStore::set_plan: called");
        self.tx.send_modify(|state| {
            state.total_levels = total_levels;
            state.total_node_count = total_node_count;
            state.skipped_nodes = skipped_nodes;
        });
    }

    /// Advance to a level
    pub(crate) fn enter_level(&self, level_index: usize) {
        debug!(level_index, "RunStateStore::enter_level: called");
        self.tx.send_modify(|state| {
            state.current_level_index = level_index;
        });
    }

    /// Mark a node as the one currently being processed
    pub(crate) fn node_started(&self, node_id: &NodeId, node_name: &str) {
        debug!(%node_id, %node_name, "RunStateStore::node_started: called");
        self.tx.send_modify(|state| {
            state.current_node_id = Some(node_id.clone());
            state.current_node_name = Some(node_name.to_string());
        });
    }

    /// Record a successful node
    pub(crate) fn node_completed(&self, node_id: &NodeId, usage: UsageMetadata) {
        debug!(%node_id, "RunStateStore::node_completed: called");
        self.tx.send_modify(|state| {
            state.completed_node_ids.push(node_id.clone());
            state.usage.input_tokens += usage.input_tokens;
            state.usage.output_tokens += usage.output_tokens;
            state.usage.generation_ms += usage.latency_ms;
        });
    }

    /// Record a per-node failure
    pub(crate) fn node_failed(&self, node_id: &NodeId, node_name: &str, error: &str) {
        debug!(%node_id, %error, "RunStateStore::node_failed: called");
        self.tx.send_modify(|state| {
            state.failed_nodes.push(FailedNode {
                node_id: node_id.clone(),
                node_name: node_name.to_string(),
                error: error.to_string(),
            });
        });
    }

    /// The loop reached a suspension point with a pause latched
    ///
    /// No-op unless the run is currently Running; Cancelling is one-way.
    pub(crate) fn mark_paused(&self) {
        debug!("RunStateStore::mark_paused: called");
        self.tx.send_modify(|state| {
            if state.status == RunStatus::Running {
                state.status = RunStatus::Paused;
            }
        });
    }

    /// The loop resumed from a pause
    pub(crate) fn mark_running(&self) {
        debug!("RunStateStore::mark_running: called");
        self.tx.send_modify(|state| {
            if state.status == RunStatus::Paused {
                state.status = RunStatus::Running;
            }
        });
    }

    /// Latch a cancel: Running or Paused becomes Cancelling
    ///
    /// Returns false when there is nothing to cancel (idle, terminal, or
    /// already cancelling), making repeated calls a no-op.
    pub(crate) fn request_cancel(&self) -> bool {
        debug!("RunStateStore::request_cancel: called");
        let mut latched = false;
        self.tx.send_modify(|state| {
            if matches!(state.status, RunStatus::Running | RunStatus::Paused) {
                state.status = RunStatus::Cancelling;
                latched = true;
            }
        });
        latched
    }

    /// Set the skip-all-previews toggle; takes effect on the next node
    pub(crate) fn set_skip_all_previews(&self, skip_all: bool) {
        debug!(skip_all, "RunStateStore::set_skip_all_previews: called");
        self.tx.send_modify(|state| {
            state.skip_all_previews = skip_all;
        });
    }

    /// Read the skip-all-previews toggle
    pub(crate) fn skip_all_previews(&self) -> bool {
        self.tx.borrow().skip_all_previews
    }

    /// Terminate the run as Failed with a structural error
    pub(crate) fn fail_run(&self, message: &str) {
        debug!(%message, "RunStateStore::fail_run: called");
        self.tx.send_modify(|state| {
            state.status = RunStatus::Failed;
            state.last_error = Some(message.to_string());
            state.current_node_id = None;
            state.current_node_name = None;
            state.started_at = None;
        });
    }

    /// Terminate the run as Completed
    ///
    /// Also the terminal state of a cancelled run: completed nodes reflect
    /// only what finished before cancellation took effect.
    pub(crate) fn finish_run(&self) {
        debug!("RunStateStore::finish_run: called");
        self.tx.send_modify(|state| {
            state.status = RunStatus::Completed;
            state.current_node_id = None;
            state.current_node_name = None;
            state.started_at = None;
        });
    }
}

impl Default for RunStateStore {
    fn default() -> Self {
        Self::new()
    }
}
