//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, LlmError};

/// Stateless LLM client - each call is independent
///
/// Conversation state lives with the caller: every request carries the full
/// history it wants the model to see.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::llm::StopReason;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted outcome for one mock call
    pub enum MockReply {
        Text(String),
        /// Text cut off at the token limit
        Truncated(String),
        Empty,
        ApiError(u16),
    }

    /// Mock LLM client for unit tests
    pub struct MockLlmClient {
        replies: Mutex<Vec<MockReply>>,
        requests: Mutex<Vec<CompletionRequest>>,
        call_count: AtomicUsize,
    }

    impl MockLlmClient {
        pub fn new(replies: Vec<MockReply>) -> Self {
            debug!(reply_count = %replies.len(), "MockLlmClient::new: called");
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn texts(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| MockReply::Text(t.to_string())).collect())
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            debug!("MockLlmClient::complete: called");
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            match self.replies.lock().unwrap().pop() {
                Some(MockReply::Text(text)) => Ok(CompletionResponse::text(text)),
                Some(MockReply::Truncated(text)) => Ok(CompletionResponse {
                    stop_reason: StopReason::MaxTokens,
                    ..CompletionResponse::text(text)
                }),
                Some(MockReply::Empty) => Err(LlmError::EmptyChoices),
                Some(MockReply::ApiError(status)) => Err(LlmError::ApiError {
                    status,
                    message: "mock failure".to_string(),
                }),
                None => Err(LlmError::InvalidResponse("No more mock responses".to_string())),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_responses() {
            let client = MockLlmClient::texts(&["Response 1", "Response 2"]);
            let req = CompletionRequest::new("Test", vec![], 1000);

            let resp1 = client.complete(req.clone()).await.unwrap();
            assert_eq!(resp1.content, Some("Response 1".to_string()));

            let resp2 = client.complete(req).await.unwrap();
            assert_eq!(resp2.content, Some("Response 2".to_string()));

            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockLlmClient::new(vec![]);
            let result = client.complete(CompletionRequest::new("Test", vec![], 1000)).await;
            assert!(result.is_err());
        }
    }
}
