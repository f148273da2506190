//! Generation client module
//!
//! The engine never talks to a model backend directly; it dispatches
//! [`GenerationRequest`]s through the [`GenerationClient`] trait and records
//! the outcome. Error classification (per-call vs structural) drives the
//! executor's error policy.

pub mod client;
mod error;
mod types;

pub use client::GenerationClient;
pub use error::GenerationError;
pub use types::{GenerationOutput, GenerationRequest, UsageMetadata};
