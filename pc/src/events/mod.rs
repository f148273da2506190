//! Cascade activity events
//!
//! A broadcast stream of everything a run does, for progress UIs and loggers
//! that want more than the state snapshot channel.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter};
pub use types::CascadeEvent;
