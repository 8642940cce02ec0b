//! Per-failure suggestion flow
//!
//! For each failure: take its attached candidate set (or extract one), build
//! the payload, ask the collaborator and parse the reply tolerantly. The flow
//! never fails outward; every problem ends as `SuggestionOutcome::NoSuggestion`.

use std::sync::Arc;

use correlation_engine_rs::{
    parse_suggestion, CandidateSet, FailureRecord, HeuristicExtractor, NoSuggestionReason,
    SuggestionOutcome, SuggestionPayload,
};
use futures::stream::{self, StreamExt};
use log::{error, info, warn};

use crate::collaborator::ReasoningCollaborator;

/// Default number of failures analyzed at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Drives the reasoning collaborator over failure records
#[derive(Clone)]
pub struct SuggestionService {
    collaborator: Arc<dyn ReasoningCollaborator>,
    extractor: HeuristicExtractor,
    concurrency: usize,
}

impl SuggestionService {
    /// Create a service around a collaborator with the default extractor
    pub fn new(collaborator: Arc<dyn ReasoningCollaborator>) -> Self {
        Self {
            collaborator,
            extractor: HeuristicExtractor::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Use a configured extractor for failures without a candidate set
    pub fn with_extractor(mut self, extractor: HeuristicExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Bound the number of concurrent collaborator calls (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Concurrency bound for `analyze_all`
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// The attached candidate set, or a fresh extraction
    pub fn candidates_for(&self, failure: &FailureRecord) -> CandidateSet {
        match failure.candidate_set() {
            Some(candidates) => candidates.clone(),
            None => self
                .extractor
                .extract(failure.previous_response.as_deref(), failure.request_data.as_deref()),
        }
    }

    /// Build the collaborator payload for one failure
    pub fn payload_for(&self, failure: &FailureRecord) -> SuggestionPayload {
        SuggestionPayload::new(failure, self.candidates_for(failure))
    }

    /// Ask the collaborator about one failure
    pub async fn analyze_failure(&self, failure: &FailureRecord) -> SuggestionOutcome {
        let payload = self.payload_for(failure);

        let outcome = match self.collaborator.analyze(&payload).await {
            Ok(reply) => parse_suggestion(&reply),
            Err(e) => {
                error!(
                    "Collaborator failed for {} (thread {:?}, index {}): {}",
                    failure.sampler_label.as_deref().unwrap_or("<unlabeled>"),
                    failure.thread_id,
                    failure.sequence_index,
                    e
                );
                SuggestionOutcome::NoSuggestion(NoSuggestionReason::CollaboratorFailed(e.to_string()))
            }
        };

        match &outcome {
            SuggestionOutcome::Suggested(suggestion) => info!(
                "Suggestion for {}: {} (correlation issue: {}, confidence {:.2})",
                failure.sampler_label.as_deref().unwrap_or("<unlabeled>"),
                suggestion.failure_category,
                suggestion.correlation_issue,
                suggestion.confidence_score
            ),
            SuggestionOutcome::NoSuggestion(reason @ NoSuggestionReason::NonConforming(_)) => warn!(
                "No suggestion for {}: {}",
                failure.sampler_label.as_deref().unwrap_or("<unlabeled>"),
                reason
            ),
            SuggestionOutcome::NoSuggestion(NoSuggestionReason::CollaboratorFailed(_)) => {}
        }

        outcome
    }

    /// Analyze every failure, at most `concurrency` at a time, in input order
    pub async fn analyze_all(&self, failures: &[FailureRecord]) -> Vec<SuggestionOutcome> {
        info!(
            "Requesting suggestions for {} failures (concurrency {})",
            failures.len(),
            self.concurrency
        );

        stream::iter(failures.iter().map(|failure| self.analyze_failure(failure)))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
