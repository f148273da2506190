//! Level planner
//!
//! Computes the ordered sequence of levels to execute: a breadth-first,
//! depth-grouped traversal starting at the chosen root's direct children.
//! The root itself is never executed - it is the conversation context, not a
//! generation target. Eligibility filtering happens here, so the executor
//! only ever sees nodes it should run.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{NodeId, NodeRecord, SkipReason, SkippedNode};
use crate::tree::TreeProvider;

/// Errors from planning
#[derive(Debug, Error)]
pub enum PlanError {
    /// The requested root does not exist in the tree
    #[error("root node {0} not found")]
    RootNotFound(NodeId),
}

/// The ordered execution plan for one cascade
#[derive(Debug, Clone, Default)]
pub struct CascadePlan {
    /// Node the plan was computed from
    pub root_id: NodeId,

    /// Non-empty levels in execution order; within a level, provider child
    /// order
    pub levels: Vec<Vec<NodeRecord>>,

    /// Nodes excluded by eligibility rules, in traversal order
    pub skipped: Vec<SkippedNode>,
}

impl CascadePlan {
    /// Number of non-empty levels
    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    /// Count of eligible nodes across all levels
    pub fn total_node_count(&self) -> usize {
        self.levels.iter().map(|level| level.len()).sum()
    }

    /// Whether the plan holds no executable nodes
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Compute the level plan for a cascade rooted at `root_id`
///
/// Level 0 is the root's immediate children; level *k* holds the nodes at
/// tree depth *k+1* from the root. An ineligible node is recorded as skipped
/// but its descendants are still traversed - exclusion is per node, not
/// sub-tree pruning. Levels left empty by filtering are dropped.
pub async fn plan(tree: &dyn TreeProvider, root_id: &NodeId) -> Result<CascadePlan, PlanError> {
    debug!(%root_id, "plan: called");

    if tree.node(root_id).await.is_none() {
        debug!(%root_id, "plan: root not found");
        return Err(PlanError::RootNotFound(root_id.clone()));
    }

    let mut levels: Vec<Vec<NodeRecord>> = Vec::new();
    let mut skipped: Vec<SkippedNode> = Vec::new();
    // Guards against a malformed provider handing back cycles
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(root_id.clone());

    let mut frontier = tree.children_of(root_id).await;

    while !frontier.is_empty() {
        let mut level: Vec<NodeRecord> = Vec::new();
        let mut next: Vec<NodeRecord> = Vec::new();

        for node in frontier {
            if !visited.insert(node.id.clone()) {
                debug!(node_id = %node.id, "plan: node already visited, skipping");
                continue;
            }

            if node.exclude_from_cascade {
                debug!(node_id = %node.id, "plan: node excluded by flag");
                skipped.push(SkippedNode {
                    node_id: node.id.clone(),
                    node_name: node.name.clone(),
                    reason: SkipReason::ExcludedFlag,
                });
            } else if node.is_deleted {
                debug!(node_id = %node.id, "plan: node soft-deleted");
                skipped.push(SkippedNode {
                    node_id: node.id.clone(),
                    node_name: node.name.clone(),
                    reason: SkipReason::SoftDeleted,
                });
            } else {
                level.push(node.clone());
            }

            next.extend(tree.children_of(&node.id).await);
        }

        if !level.is_empty() {
            levels.push(level);
        }
        frontier = next;
    }

    let plan = CascadePlan {
        root_id: root_id.clone(),
        levels,
        skipped,
    };
    info!(
        %root_id,
        total_levels = plan.total_levels(),
        total_node_count = plan.total_node_count(),
        skipped = plan.skipped.len(),
        "plan: complete"
    );
    Ok(plan)
}
