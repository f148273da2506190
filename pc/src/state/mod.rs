//! Run state store
//!
//! Single-writer, multi-reader state for the one live cascade. Mutation is
//! crate-private (only the engine writes); observers take snapshots or
//! subscribe to the watch channel.

mod store;

pub use store::RunStateStore;
