//! CascadeExecutor - drives one cascade run over a prompt tree
//!
//! The executor consumes the level plan strictly in order: level by level,
//! left to right within a level, with at most one in-flight generation call
//! at any time. Sibling order is load-bearing - later siblings may read
//! system variables seeded by earlier siblings' outputs - so nothing here is
//! ever parallelized.
//!
//! Control commands (pause/resume/cancel) latch flags that the run loop
//! observes only at suspension points between node steps; an in-flight call
//! always settles first and its result is recorded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{NodeId, NodeRecord, RunState, RunStatus};
use crate::events::{EventBus, EventEmitter};
use crate::generation::{GenerationClient, GenerationRequest};
use crate::persist::ResultSink;
use crate::prompts::PromptResolver;
use crate::state::RunStateStore;
use crate::tree::TreeProvider;

use super::config::CascadeConfig;
use super::control::ControlFlags;
use super::planner::{self, CascadePlan, PlanError};

/// Errors surfaced by the executor's control API
#[derive(Debug, Error)]
pub enum CascadeError {
    /// A cascade is already active on this executor; cancel it first
    #[error("a cascade is already running")]
    AlreadyRunning,

    /// Planning failed before any execution began
    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// Outcome of one node step
enum StepOutcome {
    /// Result generated and persisted
    Completed,
    /// Per-node failure, recorded; the run continues
    Failed,
    /// Fatal failure; the run stops immediately
    Structural(String),
}

/// Outcome of the level loop
enum LevelsOutcome {
    /// Levels exhausted or cancellation observed
    Finished,
    /// Fatal failure with the causing message
    Structural(String),
}

/// The cascade execution engine
///
/// Owns the single live [`RunState`] and the event bus. One executor drives
/// at most one run at a time; observers subscribe to state snapshots or
/// events and issue control commands from any task.
pub struct CascadeExecutor {
    tree: Arc<dyn TreeProvider>,
    client: Arc<dyn GenerationClient>,
    resolver: Arc<dyn PromptResolver>,
    sink: Arc<dyn ResultSink>,
    config: CascadeConfig,
    store: RunStateStore,
    events: Arc<EventBus>,
    control: Arc<ControlFlags>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CascadeExecutor {
    /// Create an executor with default configuration
    pub fn new(
        tree: Arc<dyn TreeProvider>,
        client: Arc<dyn GenerationClient>,
        resolver: Arc<dyn PromptResolver>,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self::with_config(tree, client, resolver, sink, CascadeConfig::default())
    }

    /// Create an executor with explicit configuration
    pub fn with_config(
        tree: Arc<dyn TreeProvider>,
        client: Arc<dyn GenerationClient>,
        resolver: Arc<dyn PromptResolver>,
        sink: Arc<dyn ResultSink>,
        config: CascadeConfig,
    ) -> Self {
        debug!(?config, "CascadeExecutor::with_config: called");
        let events = Arc::new(EventBus::new(config.event_capacity));
        Self {
            tree,
            client,
            resolver,
            sink,
            config,
            store: RunStateStore::new(),
            events,
            control: Arc::new(ControlFlags::new()),
            task: Mutex::new(None),
        }
    }

    /// Handle to the run state store (read-only surface)
    pub fn state(&self) -> RunStateStore {
        self.store.clone()
    }

    /// Snapshot of the current run state
    pub fn snapshot(&self) -> RunState {
        self.store.snapshot()
    }

    /// Subscribe to run state snapshots
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<RunState> {
        self.store.subscribe()
    }

    /// Subscribe to the cascade activity stream
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<crate::events::CascadeEvent> {
        self.events.subscribe()
    }

    /// Begin a cascade from `root_id`
    ///
    /// Plans the levels, initializes run state, and spawns the run loop.
    /// Fails with [`CascadeError::AlreadyRunning`] while a run is active; a
    /// fresh start after a terminal run discards the prior state. Planning
    /// failures are recorded as a `Failed` run (so observers see them on the
    /// state surface) and returned to the caller.
    pub async fn start(&self, root_id: impl Into<NodeId>) -> Result<(), CascadeError> {
        let root_id = root_id.into();
        let run_id = Uuid::now_v7().to_string();
        debug!(%root_id, %run_id, "CascadeExecutor::start: called");

        // Claim the store first so concurrent starts cannot race past the
        // active check
        if !self.store.try_begin_run(&run_id, &root_id, 0, 0, Vec::new()) {
            warn!(%root_id, "CascadeExecutor::start: rejected, run already active");
            return Err(CascadeError::AlreadyRunning);
        }
        self.control.reset();

        let emitter = self.events.emitter_for(&run_id);
        let plan = match planner::plan(self.tree.as_ref(), &root_id).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(%root_id, error = %e, "CascadeExecutor::start: planning failed");
                self.store.fail_run(&e.to_string());
                emitter.run_failed(&e.to_string());
                return Err(e.into());
            }
        };

        self.store
            .set_plan(plan.total_levels(), plan.total_node_count(), plan.skipped.clone());
        emitter.run_started(&root_id, plan.total_levels(), plan.total_node_count());
        for skipped in &plan.skipped {
            emitter.node_skipped(&skipped.node_id, skipped.reason);
        }

        info!(
            %run_id,
            %root_id,
            total_levels = plan.total_levels(),
            total_node_count = plan.total_node_count(),
            "Starting cascade"
        );

        let task = RunTask {
            client: self.client.clone(),
            resolver: self.resolver.clone(),
            sink: self.sink.clone(),
            store: self.store.clone(),
            control: self.control.clone(),
            emitter,
            config: self.config.clone(),
        };
        let handle = tokio::spawn(task.run(plan));
        *self.task.lock().expect("task lock poisoned") = Some(handle);

        Ok(())
    }

    /// Request a pause
    ///
    /// Takes effect at the next suspension point: an in-flight generation
    /// call runs to completion and its result is recorded before the status
    /// becomes `Paused`. No-op unless the run is currently `Running`.
    pub fn pause(&self) {
        debug!("CascadeExecutor::pause: called");
        if self.store.status() != RunStatus::Running {
            debug!("CascadeExecutor::pause: no running cascade, ignoring");
            return;
        }
        if self.control.request_pause() {
            info!("Pause requested, will take effect after the current node settles");
        }
    }

    /// Resume a paused run at the next unprocessed node
    ///
    /// No-op when no pause is latched.
    pub fn resume(&self) {
        debug!("CascadeExecutor::resume: called");
        if self.control.clear_pause() {
            info!("Resume requested");
        } else {
            debug!("CascadeExecutor::resume: not paused, ignoring");
        }
    }

    /// Request cancellation
    ///
    /// Cooperative: the in-flight call (if any) is allowed to finish and its
    /// result is recorded, then no further nodes are started and the run
    /// terminates as `Completed` with partial results. No-op when nothing is
    /// running or the run is already cancelling.
    pub fn cancel(&self) {
        debug!("CascadeExecutor::cancel: called");
        if !self.store.request_cancel() {
            debug!("CascadeExecutor::cancel: nothing to cancel, ignoring");
            return;
        }
        self.control.request_cancel();
        info!("Cancel requested, finishing the current node then stopping");
        if let Some(run_id) = self.store.snapshot().run_id {
            self.events.emitter_for(run_id).cancel_requested();
        }
    }

    /// Toggle suppression of the per-node preview confirmation
    ///
    /// May be called at any time; takes effect on the next node dispatched.
    pub fn set_skip_all_previews(&self, skip_all: bool) {
        debug!(skip_all, "CascadeExecutor::set_skip_all_previews: called");
        self.store.set_skip_all_previews(skip_all);
        let snapshot = self.store.snapshot();
        if let Some(run_id) = snapshot.run_id
            && snapshot.status.is_active()
        {
            self.events.emitter_for(run_id).preview_skip_toggled(skip_all);
        }
    }

    /// Wait until the current run (if any) leaves its active states
    ///
    /// Returns the state observed at that point; returns immediately when no
    /// run is active.
    pub async fn wait(&self) -> RunState {
        debug!("CascadeExecutor::wait: called");
        let mut rx = self.store.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            if !state.status.is_active() {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.store.snapshot();
            }
        }
    }

    /// Join the spawned run task, if one exists
    ///
    /// Useful for orderly shutdown; [`wait`](Self::wait) is usually enough.
    pub async fn join(&self) {
        debug!("CascadeExecutor::join: called");
        let handle = self.task.lock().expect("task lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Everything the spawned run loop needs, detached from the executor
struct RunTask {
    client: Arc<dyn GenerationClient>,
    resolver: Arc<dyn PromptResolver>,
    sink: Arc<dyn ResultSink>,
    store: RunStateStore,
    control: Arc<ControlFlags>,
    emitter: EventEmitter,
    config: CascadeConfig,
}

impl RunTask {
    /// Execute the plan to a terminal state
    async fn run(self, plan: CascadePlan) {
        debug!(run_id = %self.emitter.run_id(), "RunTask::run: called");
        match self.run_levels(&plan).await {
            LevelsOutcome::Finished => {
                let cancelled = self.control.cancel_requested();
                let state = self.store.snapshot();
                self.store.finish_run();
                info!(
                    run_id = %self.emitter.run_id(),
                    cancelled,
                    summary = %state.summary(),
                    "Cascade finished"
                );
                self.emitter.run_completed(
                    state.completed_count(),
                    state.failed_count(),
                    state.skipped_count(),
                    cancelled,
                );
            }
            LevelsOutcome::Structural(message) => {
                warn!(run_id = %self.emitter.run_id(), %message, "Cascade failed");
                self.store.fail_run(&message);
                self.emitter.run_failed(&message);
            }
        }
    }

    /// Walk levels strictly in order; left to right within a level
    async fn run_levels(&self, plan: &CascadePlan) -> LevelsOutcome {
        let total_levels = plan.total_levels();
        for (level_index, level) in plan.levels.iter().enumerate() {
            debug!(level_index, nodes = level.len(), "RunTask::run_levels: entering level");
            self.store.enter_level(level_index);
            self.emitter.level_started(level_index, total_levels, level.len());

            for node in level {
                // Suspension point: latched pause/cancel apply here, never
                // mid-call
                if !self.checkpoint().await {
                    debug!(node_id = %node.id, "RunTask::run_levels: cancellation observed");
                    return LevelsOutcome::Finished;
                }

                match self.run_node(node, level_index).await {
                    StepOutcome::Completed => {}
                    StepOutcome::Failed => {
                        if self.config.halt_on_node_failure {
                            return LevelsOutcome::Structural(format!(
                                "node {} failed and halt_on_node_failure is set",
                                node.id
                            ));
                        }
                    }
                    StepOutcome::Structural(message) => return LevelsOutcome::Structural(message),
                }

                if self.config.inter_node_delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(self.config.inter_node_delay_ms)).await;
                }
            }
        }
        LevelsOutcome::Finished
    }

    /// Check latched control flags; returns false when the run must stop
    async fn checkpoint(&self) -> bool {
        if self.control.cancel_requested() {
            return false;
        }
        if self.control.pause_requested() {
            debug!("RunTask::checkpoint: pause latched, parking");
            self.store.mark_paused();
            self.emitter.run_paused();
            self.control.wait_while_paused().await;
            if self.control.cancel_requested() {
                debug!("RunTask::checkpoint: cancelled while paused");
                return false;
            }
            debug!("RunTask::checkpoint: resuming");
            self.store.mark_running();
            self.emitter.run_resumed();
        }
        true
    }

    /// Run one node to a settled outcome
    async fn run_node(&self, node: &NodeRecord, level_index: usize) -> StepOutcome {
        debug!(node_id = %node.id, level_index, "RunTask::run_node: called");
        self.store.node_started(&node.id, &node.name);
        self.emitter.node_started(&node.id, &node.name, level_index);

        let prompt = match self.resolver.resolve(node).await {
            Ok(prompt) => prompt,
            Err(e) if e.is_structural() => return StepOutcome::Structural(e.to_string()),
            Err(e) => {
                warn!(node_id = %node.id, error = %e, "Node input resolution failed");
                self.store.node_failed(&node.id, &node.name, &e.to_string());
                self.emitter.node_failed(&node.id, &e.to_string());
                return StepOutcome::Failed;
            }
        };

        let request = GenerationRequest {
            run_id: self.emitter.run_id().to_string(),
            node: node.clone(),
            prompt,
            skip_preview: self.store.skip_all_previews(),
        };

        // The only truly blocking step; at most one in flight per run
        match self.client.generate(request).await {
            Ok(output) => {
                if let Err(e) = self.sink.persist(&node.id, &output).await {
                    warn!(node_id = %node.id, error = %e, "Result persistence failed");
                    self.store.node_failed(&node.id, &node.name, &e.to_string());
                    self.emitter.node_failed(&node.id, &e.to_string());
                    return StepOutcome::Failed;
                }
                debug!(node_id = %node.id, "RunTask::run_node: completed");
                self.store.node_completed(&node.id, output.usage);
                self.emitter.node_completed(
                    &node.id,
                    output.usage.input_tokens,
                    output.usage.output_tokens,
                    output.usage.latency_ms,
                );
                StepOutcome::Completed
            }
            Err(e) if e.is_structural() => {
                warn!(node_id = %node.id, error = %e, "Structural generation error");
                StepOutcome::Structural(e.to_string())
            }
            Err(e) => {
                warn!(node_id = %node.id, error = %e, "Node generation failed");
                self.store.node_failed(&node.id, &node.name, &e.to_string());
                self.emitter.node_failed(&node.id, &e.to_string());
                StepOutcome::Failed
            }
        }
    }
}
