//! The reasoning collaborator seam
//!
//! Anything that can turn a `SuggestionPayload` into reply text implements
//! `ReasoningCollaborator`. The suggestion flow only sees this trait, so the
//! HTTP client can be swapped for a mock in tests.

use async_trait::async_trait;
use correlation_engine_rs::SuggestionPayload;

use crate::error::Result;

/// External capability that analyzes one failure payload
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReasoningCollaborator: Send + Sync {
    /// Send the payload and return the raw reply text
    ///
    /// Implementations retry transient failures themselves; an error here is
    /// final for this payload.
    async fn analyze(&self, payload: &SuggestionPayload) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use correlation_engine_rs::CandidateSet;
    use std::sync::Arc;

    #[test]
    fn test_mock_behind_trait_object() {
        let mut mock = MockReasoningCollaborator::new();
        mock.expect_analyze()
            .withf(|payload: &SuggestionPayload| payload.failed_request == "GET /cart")
            .times(1)
            .returning(|_| Ok("{}".to_string()));

        let collaborator: Arc<dyn ReasoningCollaborator> = Arc::new(mock);
        let payload = SuggestionPayload {
            failed_request: "GET /cart".to_string(),
            failed_response: String::new(),
            candidate_dynamic_values: CandidateSet::default(),
        };

        let reply = tokio_test::block_on(collaborator.analyze(&payload)).unwrap();
        assert_eq!(reply, "{}");
    }
}
