//! Generation error types

use std::time::Duration;
use thiserror::Error;

/// Errors reported by the generation backend
///
/// The executor treats structural errors (auth, configuration, connectivity)
/// as fatal to the whole run; everything else fails only the node that was
/// being generated.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend rejected or could not complete this call
    #[error("generation failed: {0}")]
    CallFailed(String),

    /// The backend rate-limited this call
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// The call did not complete in time (enforced by the backend, never by
    /// the engine)
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// The backend returned something unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Credentials rejected; no further call can succeed
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// The client is misconfigured; no further call can succeed
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The backend is unreachable
    #[error("backend unreachable: {0}")]
    Connectivity(String),
}

impl GenerationError {
    /// Whether this error aborts the whole run rather than one node
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            GenerationError::Auth(_) | GenerationError::Configuration(_) | GenerationError::Connectivity(_)
        )
    }

    /// Check if this is a rate limit error
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, GenerationError::RateLimited { .. })
    }

    /// Get the retry duration if this is a rate limit error
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GenerationError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
