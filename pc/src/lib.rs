//! PromptCascade - cascade execution engine for hierarchical prompt trees
//!
//! The authoring application organizes prompts as a tree; a cascade walks one
//! root's descendants level by level and drives a generation call for every
//! eligible node, while a human operator can pause, resume, cancel, or skip
//! previews mid-run. Partial failure never corrupts sibling or ancestor
//! state.
//!
//! # Core Guarantees
//!
//! - **Strict ordering**: level by level, left to right within a level;
//!   sibling generations may read variables seeded by earlier siblings
//! - **One call in flight**: at most one generation call per run, ever
//! - **Cooperative control**: pause/cancel latch and apply only between
//!   nodes; an in-flight call always settles and is recorded
//! - **Single writer**: run state is mutated only by the executor; observers
//!   get reactive snapshots and an event stream
//!
//! # Modules
//!
//! - [`cascade`] - planner, executor, configuration, control protocol
//! - [`domain`] - node identity and run-state model
//! - [`tree`] - tree provider contract (the authoring store's side)
//! - [`generation`] - generation client contract and error taxonomy
//! - [`prompts`] - prompt resolution collaborator contract
//! - [`persist`] - result persistence collaborator contract
//! - [`state`] - run state store with watch-channel snapshots
//! - [`events`] - broadcast activity stream for progress UIs
//! - [`logging`] - tracing setup for hosts

pub mod cascade;
pub mod domain;
pub mod events;
pub mod generation;
pub mod logging;
pub mod persist;
pub mod prompts;
pub mod state;
pub mod tree;

// Re-export commonly used types
pub use cascade::{CascadeConfig, CascadeError, CascadeExecutor, CascadePlan, PlanError, plan};
pub use domain::{FailedNode, NodeId, NodeRecord, RunState, RunStatus, RunUsage, SkipReason, SkippedNode};
pub use events::{CascadeEvent, EventBus, EventEmitter};
pub use generation::{GenerationClient, GenerationError, GenerationOutput, GenerationRequest, UsageMetadata};
pub use persist::{PersistError, ResultSink};
pub use prompts::{PromptResolver, ResolveError, ResolvedPrompt};
pub use state::RunStateStore;
pub use tree::{StaticTree, TreeProvider};
