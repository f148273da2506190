//! Cascade engine configuration

use serde::{Deserialize, Serialize};

/// Knobs for one executor instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// Capacity of the event broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Settle delay between node steps, milliseconds (0 = none)
    #[serde(default)]
    pub inter_node_delay_ms: u64,

    /// Treat the first per-node failure as fatal to the whole run
    ///
    /// Off by default: a failed node is recorded and the cascade moves on to
    /// its next sibling.
    #[serde(default)]
    pub halt_on_node_failure: bool,
}

fn default_event_capacity() -> usize {
    crate::events::DEFAULT_CHANNEL_CAPACITY
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            event_capacity: default_event_capacity(),
            inter_node_delay_ms: 0,
            halt_on_node_failure: false,
        }
    }
}
