//! GenerationClient trait definition

use async_trait::async_trait;

use super::{GenerationError, GenerationOutput, GenerationRequest};

/// The external collaborator performing the actual generation call per node
///
/// Each call is independent: the engine dispatches at most one at a time and
/// never retries on its own. The backend is expected to enforce its own
/// timeout; a hung call stalls the cascade by design.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one generation call for a node (blocking until settled)
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted outcome for one mock call
    pub enum MockOutcome {
        Ok(GenerationOutput),
        Err(GenerationError),
    }

    /// Mock generation client for unit tests
    ///
    /// Returns scripted outcomes in call order and records every request it
    /// receives.
    pub struct MockGenerationClient {
        outcomes: Mutex<Vec<MockOutcome>>,
        requests: Mutex<Vec<GenerationRequest>>,
        call_count: AtomicUsize,
    }

    impl MockGenerationClient {
        pub fn new(outcomes: Vec<MockOutcome>) -> Self {
            debug!(outcome_count = outcomes.len(), "MockGenerationClient::new: called");
            Self {
                outcomes: Mutex::new(outcomes),
                requests: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// A client that answers every call with the same text
        pub fn always_ok() -> Self {
            Self::new(Vec::new())
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        /// Requests received so far, in call order
        pub fn requests(&self) -> Vec<GenerationRequest> {
            self.requests.lock().expect("request lock poisoned").clone()
        }
    }

    #[async_trait]
    impl GenerationClient for MockGenerationClient {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(idx, node_id = %request.node.id, "MockGenerationClient::generate: called");
            let node_name = request.node.name.clone();
            self.requests.lock().expect("request lock poisoned").push(request);

            let mut outcomes = self.outcomes.lock().expect("outcome lock poisoned");
            if outcomes.is_empty() {
                return Ok(GenerationOutput::text(format!("generated: {}", node_name)));
            }
            match outcomes.remove(0) {
                MockOutcome::Ok(output) => Ok(output),
                MockOutcome::Err(err) => Err(err),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::NodeRecord;
        use crate::prompts::ResolvedPrompt;

        fn request_for(id: &str) -> GenerationRequest {
            GenerationRequest {
                run_id: "run-1".to_string(),
                node: NodeRecord::new(id, id.to_uppercase()),
                prompt: ResolvedPrompt::text("hello"),
                skip_preview: false,
            }
        }

        #[tokio::test]
        async fn test_mock_returns_scripted_outcomes_in_order() {
            let client = MockGenerationClient::new(vec![
                MockOutcome::Ok(GenerationOutput::text("first")),
                MockOutcome::Err(GenerationError::CallFailed("second".to_string())),
            ]);

            let out = client.generate(request_for("a")).await.unwrap();
            assert_eq!(out.text, "first");

            let err = client.generate(request_for("b")).await.unwrap_err();
            assert!(!err.is_structural());

            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn test_always_ok_echoes_node_name() {
            let client = MockGenerationClient::always_ok();
            let out = client.generate(request_for("a")).await.unwrap();
            assert_eq!(out.text, "generated: A");
        }

        #[tokio::test]
        async fn test_requests_are_recorded() {
            let client = MockGenerationClient::always_ok();
            client.generate(request_for("a")).await.unwrap();
            client.generate(request_for("b")).await.unwrap();

            let requests = client.requests();
            assert_eq!(requests.len(), 2);
            assert_eq!(requests[0].node.id, "a");
            assert_eq!(requests[1].node.id, "b");
        }
    }
}
