//! Integration tests for the cascade engine
//!
//! These drive the public API end-to-end over an in-memory tree, with the
//! collaborators faked the way a host would wire them.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use promptcascade::{
    CascadeEvent, CascadeExecutor, GenerationClient, GenerationError, GenerationOutput, GenerationRequest, NodeId,
    NodeRecord, PersistError, PromptResolver, ResolveError, ResolvedPrompt, ResultSink, RunStatus, StaticTree,
    UsageMetadata,
};

const TICK: Duration = Duration::from_secs(5);

// =============================================================================
// Fakes
// =============================================================================

/// Client that answers from a script: listed nodes fail, everything else
/// succeeds with fixed usage numbers
struct ScriptedClient {
    fail_nodes: Vec<NodeId>,
    calls: Mutex<Vec<NodeId>>,
}

impl ScriptedClient {
    fn ok() -> Self {
        Self::failing(Vec::new())
    }

    fn failing(fail_nodes: Vec<NodeId>) -> Self {
        Self {
            fail_nodes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<NodeId> {
        self.calls.lock().expect("call lock poisoned").clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        self.calls
            .lock()
            .expect("call lock poisoned")
            .push(request.node.id.clone());
        if self.fail_nodes.contains(&request.node.id) {
            return Err(GenerationError::CallFailed(format!(
                "scripted failure for {}",
                request.node.id
            )));
        }
        Ok(GenerationOutput {
            text: format!("generated: {}", request.prompt.text),
            usage: UsageMetadata {
                input_tokens: 10,
                output_tokens: 20,
                latency_ms: 5,
            },
        })
    }
}

/// Client that holds every call until the test hands out a permit
struct GatedClient {
    gate: Arc<Semaphore>,
    inner: ScriptedClient,
}

#[async_trait]
impl GenerationClient for GatedClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        let permit = self.gate.acquire().await.expect("gate closed");
        permit.forget();
        self.inner.generate(request).await
    }
}

struct EchoResolver;

#[async_trait]
impl PromptResolver for EchoResolver {
    async fn resolve(&self, node: &NodeRecord) -> Result<ResolvedPrompt, ResolveError> {
        Ok(ResolvedPrompt::text(node.name.clone()))
    }
}

#[derive(Default)]
struct MemorySink {
    results: Mutex<Vec<(NodeId, String)>>,
}

impl MemorySink {
    fn stored_ids(&self) -> Vec<NodeId> {
        self.results
            .lock()
            .expect("result lock poisoned")
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn persist(&self, node_id: &NodeId, output: &GenerationOutput) -> Result<(), PersistError> {
        self.results
            .lock()
            .expect("result lock poisoned")
            .push((node_id.clone(), output.text.clone()));
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// root -> a, b ; a -> c : execution order [a, b, c]
fn sample_tree() -> Arc<StaticTree> {
    let mut tree = StaticTree::new();
    tree.insert(None, NodeRecord::new("root", "Root"));
    tree.insert(Some("root"), NodeRecord::new("a", "A").with_assistant(true));
    tree.insert(Some("root"), NodeRecord::new("b", "B").with_assistant(true));
    tree.insert(Some("a"), NodeRecord::new("c", "C").with_assistant(true));
    Arc::new(tree)
}

fn executor_with(tree: Arc<StaticTree>, client: Arc<dyn GenerationClient>, sink: Arc<MemorySink>) -> CascadeExecutor {
    CascadeExecutor::new(tree, client, Arc::new(EchoResolver), sink)
}

async fn next_matching(
    rx: &mut tokio::sync::broadcast::Receiver<CascadeEvent>,
    pred: impl Fn(&CascadeEvent) -> bool,
) -> CascadeEvent {
    loop {
        let event = timeout(TICK, rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event bus closed");
        if pred(&event) {
            return event;
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn full_cascade_visits_levels_in_order() {
    let client = Arc::new(ScriptedClient::ok());
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client.clone(), sink.clone());

    exec.start("root").await.expect("start should succeed");
    let state = exec.wait().await;

    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.completed_node_ids, vec!["a", "b", "c"]);
    assert_eq!(state.total_node_count, 3);
    assert_eq!(state.total_levels, 2);
    assert_eq!(client.calls(), vec!["a", "b", "c"]);
    assert_eq!(sink.stored_ids(), vec!["a", "b", "c"]);

    // Usage accumulated across all three calls
    assert_eq!(state.usage.input_tokens, 30);
    assert_eq!(state.usage.output_tokens, 60);
}

#[tokio::test]
async fn sibling_failure_does_not_stop_the_run() {
    let client = Arc::new(ScriptedClient::failing(vec!["b".to_string()]));
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client.clone(), sink.clone());

    exec.start("root").await.expect("start should succeed");
    let state = exec.wait().await;

    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.completed_node_ids, vec!["a", "c"]);
    assert_eq!(state.failed_nodes.len(), 1);
    assert_eq!(state.failed_nodes[0].node_id, "b");
    assert_eq!(state.summary(), "2 completed / 1 failed / 0 skipped");
    // B was attempted; C was still attempted after B failed
    assert_eq!(client.calls(), vec!["a", "b", "c"]);
    assert_eq!(sink.stored_ids(), vec!["a", "c"]);
}

#[tokio::test]
async fn cancel_during_first_node_stops_the_rest() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient {
        gate: gate.clone(),
        inner: ScriptedClient::ok(),
    });
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client.clone(), sink.clone());
    let mut events = exec.subscribe_events();

    exec.start("root").await.expect("start should succeed");
    next_matching(&mut events, |e| {
        matches!(e, CascadeEvent::NodeStarted { node_id, .. } if node_id == "a")
    })
    .await;

    exec.cancel();
    assert_eq!(exec.snapshot().status, RunStatus::Cancelling);

    // The in-flight call for A settles and is recorded; B and C are never
    // attempted
    gate.add_permits(1);
    let state = exec.wait().await;

    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.completed_node_ids, vec!["a"]);
    assert!(state.skipped_nodes.is_empty());
    assert_eq!(client.inner.calls(), vec!["a"]);
    assert_eq!(sink.stored_ids(), vec!["a"]);

    let done = next_matching(&mut events, |e| matches!(e, CascadeEvent::RunCompleted { .. })).await;
    assert!(matches!(done, CascadeEvent::RunCompleted { cancelled: true, .. }));
}

#[tokio::test]
async fn pause_takes_effect_between_nodes() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient {
        gate: gate.clone(),
        inner: ScriptedClient::ok(),
    });
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client, sink);
    let mut events = exec.subscribe_events();

    exec.start("root").await.expect("start should succeed");
    next_matching(&mut events, |e| {
        matches!(e, CascadeEvent::NodeStarted { node_id, .. } if node_id == "a")
    })
    .await;

    exec.pause();
    gate.add_permits(1);
    next_matching(&mut events, |e| matches!(e, CascadeEvent::RunPaused { .. })).await;

    let state = exec.snapshot();
    assert_eq!(state.status, RunStatus::Paused);
    assert_eq!(state.completed_node_ids, vec!["a"]);

    exec.resume();
    gate.add_permits(16);
    let state = exec.wait().await;
    assert_eq!(state.status, RunStatus::Completed);
    assert_eq!(state.completed_node_ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn excluded_node_is_recorded_exactly_once() {
    let mut tree = StaticTree::new();
    tree.insert(None, NodeRecord::new("root", "Root"));
    tree.insert(Some("root"), NodeRecord::new("a", "A").with_excluded(true));
    tree.insert(Some("root"), NodeRecord::new("b", "B"));
    tree.insert(Some("a"), NodeRecord::new("c", "C"));

    let client = Arc::new(ScriptedClient::ok());
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(Arc::new(tree), client.clone(), sink);

    exec.start("root").await.expect("start should succeed");
    let state = exec.wait().await;

    assert!(!state.completed_node_ids.contains(&"a".to_string()));
    let skipped_a: Vec<_> = state.skipped_nodes.iter().filter(|s| s.node_id == "a").collect();
    assert_eq!(skipped_a.len(), 1);
    // Descendants of the excluded node still run
    assert_eq!(state.completed_node_ids, vec!["b", "c"]);
    assert_eq!(client.calls(), vec!["b", "c"]);
}

#[tokio::test]
async fn event_stream_tells_the_whole_story() {
    let client = Arc::new(ScriptedClient::ok());
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client, sink);
    let mut events = exec.subscribe_events();

    exec.start("root").await.expect("start should succeed");

    let mut seen = Vec::new();
    loop {
        let event = timeout(TICK, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event bus closed");
        let done = matches!(event, CascadeEvent::RunCompleted { .. });
        seen.push(event.event_type());
        if done {
            break;
        }
    }
    assert_eq!(
        seen,
        vec![
            "RunStarted",
            "LevelStarted",
            "NodeStarted",
            "NodeCompleted",
            "NodeStarted",
            "NodeCompleted",
            "LevelStarted",
            "NodeStarted",
            "NodeCompleted",
            "RunCompleted",
        ]
    );
}

#[tokio::test]
async fn observers_see_running_then_completed() {
    let client = Arc::new(ScriptedClient::ok());
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client, sink);

    let mut rx = exec.subscribe();
    assert_eq!(rx.borrow_and_update().status, RunStatus::Idle);

    exec.start("root").await.expect("start should succeed");
    let final_state = exec.wait().await;
    assert_eq!(final_state.status, RunStatus::Completed);

    // The watch channel always holds the latest snapshot
    let latest = rx.borrow_and_update().clone();
    assert_eq!(latest.status, RunStatus::Completed);
    assert_eq!(latest.summary(), "3 completed / 0 failed / 0 skipped");
}

#[tokio::test]
async fn second_cascade_must_wait_for_the_first() {
    let gate = Arc::new(Semaphore::new(0));
    let client = Arc::new(GatedClient {
        gate: gate.clone(),
        inner: ScriptedClient::ok(),
    });
    let sink = Arc::new(MemorySink::default());
    let exec = executor_with(sample_tree(), client, sink);

    exec.start("root").await.expect("first start should succeed");
    assert!(exec.start("root").await.is_err());

    gate.add_permits(16);
    exec.wait().await;

    // After the first run ends, a fresh start is accepted
    exec.start("root").await.expect("start after completion should succeed");
    gate.add_permits(16);
    let state = exec.wait().await;
    assert_eq!(state.completed_node_ids, vec!["a", "b", "c"]);
}
