//! Event Bus - pub/sub surface for cascade activity
//!
//! Uses a tokio broadcast channel to deliver events to all subscribers with
//! minimal latency. The executor emits, consumers (progress UI, loggers)
//! subscribe.

use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::SkipReason;

use super::types::CascadeEvent;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcast bus for cascade activity
///
/// Every significant step of a run emits an event here. Emission is
/// fire-and-forget: with no subscribers the event is dropped, and slow
/// subscribers lose the oldest events first.
pub struct EventBus {
    tx: broadcast::Sender<CascadeEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: CascadeEvent) {
        debug!(event_type = event.event_type(), run_id = event.run_id(), "EventBus::emit");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<CascadeEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter handle bound to a run
    pub fn emitter_for(&self, run_id: impl Into<String>) -> EventEmitter {
        let run_id = run_id.into();
        debug!(%run_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            run_id,
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Handle for emitting events with a pre-set run ID
///
/// Cheap to clone; the executor holds one per run.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<CascadeEvent>,
    run_id: String,
}

impl EventEmitter {
    /// Get the run ID this emitter is bound to
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Emit a raw event
    pub fn emit(&self, event: CascadeEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    pub fn run_started(&self, root_id: &str, total_levels: usize, total_node_count: usize) {
        self.emit(CascadeEvent::RunStarted {
            run_id: self.run_id.clone(),
            root_id: root_id.to_string(),
            total_levels,
            total_node_count,
        });
    }

    pub fn run_completed(&self, completed: usize, failed: usize, skipped: usize, cancelled: bool) {
        self.emit(CascadeEvent::RunCompleted {
            run_id: self.run_id.clone(),
            completed,
            failed,
            skipped,
            cancelled,
        });
    }

    pub fn run_failed(&self, message: &str) {
        self.emit(CascadeEvent::RunFailed {
            run_id: self.run_id.clone(),
            message: message.to_string(),
        });
    }

    pub fn level_started(&self, level_index: usize, total_levels: usize, node_count: usize) {
        self.emit(CascadeEvent::LevelStarted {
            run_id: self.run_id.clone(),
            level_index,
            total_levels,
            node_count,
        });
    }

    pub fn node_started(&self, node_id: &str, node_name: &str, level_index: usize) {
        self.emit(CascadeEvent::NodeStarted {
            run_id: self.run_id.clone(),
            node_id: node_id.to_string(),
            node_name: node_name.to_string(),
            level_index,
        });
    }

    pub fn node_completed(&self, node_id: &str, input_tokens: u64, output_tokens: u64, latency_ms: u64) {
        self.emit(CascadeEvent::NodeCompleted {
            run_id: self.run_id.clone(),
            node_id: node_id.to_string(),
            input_tokens,
            output_tokens,
            latency_ms,
        });
    }

    pub fn node_failed(&self, node_id: &str, message: &str) {
        self.emit(CascadeEvent::NodeFailed {
            run_id: self.run_id.clone(),
            node_id: node_id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn node_skipped(&self, node_id: &str, reason: SkipReason) {
        self.emit(CascadeEvent::NodeSkipped {
            run_id: self.run_id.clone(),
            node_id: node_id.to_string(),
            reason,
        });
    }

    pub fn run_paused(&self) {
        self.emit(CascadeEvent::RunPaused {
            run_id: self.run_id.clone(),
        });
    }

    pub fn run_resumed(&self) {
        self.emit(CascadeEvent::RunResumed {
            run_id: self.run_id.clone(),
        });
    }

    pub fn cancel_requested(&self) {
        self.emit(CascadeEvent::CancelRequested {
            run_id: self.run_id.clone(),
        });
    }

    pub fn preview_skip_toggled(&self, skip_all: bool) {
        self.emit(CascadeEvent::PreviewSkipToggled {
            run_id: self.run_id.clone(),
            skip_all,
        });
    }
}
