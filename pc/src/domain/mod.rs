//! Domain types for the cascade engine
//!
//! Node identity as seen by the engine, plus the run-state model shared
//! between the executor and progress observers.

mod node;
mod run;

pub use node::{NodeId, NodeRecord};
pub use run::{FailedNode, RunState, RunStatus, RunUsage, SkipReason, SkippedNode};
