//! Cascade execution module
//!
//! The planner computes breadth-first, depth-grouped levels; the executor
//! walks them strictly in order, one generation call at a time, integrating
//! the cooperative pause/cancel protocol and the per-node error policy.

mod config;
mod control;
mod executor;
mod planner;

pub use config::CascadeConfig;
pub use executor::{CascadeError, CascadeExecutor};
pub use planner::{CascadePlan, PlanError, plan};
