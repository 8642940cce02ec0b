//! Suggestion contract
//!
//! Types exchanged with the external reasoning collaborator: the payload
//! describing one failure, the structured suggestion expected back, and a
//! tolerant parser that turns free-form collaborator text into either a
//! suggestion or an explicit "no suggestion" outcome.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidates::CandidateSet;
use crate::json_snippet::extract_balanced_object;
use crate::scanner::FailureRecord;

/// Instructions sent to the reasoning collaborator ahead of the payload
pub const SYSTEM_PROMPT: &str = r#"You are an expert JMeter test analyst. You will be provided a JSON payload with the following keys:
- failed_request: the raw request of the failed sampler
- failed_response: the raw response of the failed sampler
- candidate_dynamic_values: field paths and values from the previous sampler's response that look dynamic

Return a strict JSON object with the following schema:
{
  "failure_category": "string",
  "correlation_issue": true|false,
  "recommended_extractor": {"type":"jsonpath|regex|xpath","expression":"string","source":"previous_response"},
  "assertion_improvements": ["suggestion strings"],
  "confidence_score": 0-1
}

If the response looks like an HTTP 500 with stacktrace, classify as "server_error" and set correlation_issue=false but provide hints.

Only return JSON. Do not include extra commentary."#;

/// Payload describing one failure to the reasoning collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionPayload {
    /// Request text of the failed sampler, empty when absent
    pub failed_request: String,
    /// Response text of the failed sampler, empty when absent
    pub failed_response: String,
    /// Candidate dynamic values from the predecessor's response
    pub candidate_dynamic_values: CandidateSet,
}

impl SuggestionPayload {
    /// Build the payload for a failure and its candidate set
    pub fn new(failure: &FailureRecord, candidates: CandidateSet) -> Self {
        Self {
            failed_request: failure.request_data.clone().unwrap_or_default(),
            failed_response: failure.response_data.clone().unwrap_or_default(),
            candidate_dynamic_values: candidates,
        }
    }

    /// Serialize the payload as the user message body
    pub fn to_message(&self) -> String {
        // A CandidateSet and plain strings always serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Kind of extractor the collaborator recommends adding to the script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// JSON path extractor
    JsonPath,
    /// Regular expression extractor
    Regex,
    /// XPath extractor
    XPath,
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonPath => write!(f, "jsonpath"),
            Self::Regex => write!(f, "regex"),
            Self::XPath => write!(f, "xpath"),
        }
    }
}

/// Extractor the collaborator recommends for carrying a value forward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedExtractor {
    /// Extractor type
    #[serde(rename = "type")]
    pub kind: ExtractorKind,
    /// Expression to configure on the extractor
    pub expression: String,
    /// Where the extractor reads from, e.g. `previous_response`
    pub source: String,
}

/// Structured suggestion returned by the reasoning collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Free-form failure category, e.g. `correlation` or `server_error`
    pub failure_category: String,

    /// Whether the failure is caused by a missing correlation
    pub correlation_issue: bool,

    /// Recommended extractor, if the collaborator proposes one
    #[serde(default)]
    pub recommended_extractor: Option<RecommendedExtractor>,

    /// Suggested assertion changes, in priority order
    #[serde(default)]
    pub assertion_improvements: Vec<String>,

    /// Confidence in [0, 1]
    pub confidence_score: f64,
}

impl Suggestion {
    /// Whether the suggestion satisfies the contract beyond its shape
    pub fn is_conforming(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence_score)
    }
}

/// Why no suggestion could be produced for a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum NoSuggestionReason {
    /// The collaborator replied with text that holds no conforming object
    NonConforming(String),
    /// The collaborator could not be reached or kept failing
    CollaboratorFailed(String),
}

impl fmt::Display for NoSuggestionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConforming(detail) => write!(f, "non-conforming reply: {}", detail),
            Self::CollaboratorFailed(detail) => write!(f, "collaborator failed: {}", detail),
        }
    }
}

/// Result of asking the collaborator about one failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    /// A conforming suggestion
    Suggested(Suggestion),
    /// No suggestion available
    NoSuggestion(NoSuggestionReason),
}

impl SuggestionOutcome {
    /// The suggestion, if one was produced
    pub fn suggestion(&self) -> Option<&Suggestion> {
        match self {
            Self::Suggested(suggestion) => Some(suggestion),
            Self::NoSuggestion(_) => None,
        }
    }
}

/// Parse collaborator text into a suggestion
///
/// Tries the whole text first, then the first embedded JSON object. Never
/// panics; anything else becomes `NoSuggestion`.
pub fn parse_suggestion(text: &str) -> SuggestionOutcome {
    let direct = serde_json::from_str::<Suggestion>(text.trim());
    let parsed = match direct {
        Ok(suggestion) => Ok(suggestion),
        Err(direct_err) => {
            log::warn!("Collaborator returned non-conforming JSON, looking for an embedded object");
            match extract_balanced_object(text) {
                Some(snippet) => serde_json::from_str::<Suggestion>(snippet).map_err(|e| e.to_string()),
                None => Err(direct_err.to_string()),
            }
        }
    };

    match parsed {
        Ok(suggestion) if suggestion.is_conforming() => SuggestionOutcome::Suggested(suggestion),
        Ok(suggestion) => SuggestionOutcome::NoSuggestion(NoSuggestionReason::NonConforming(format!(
            "confidence_score {} outside [0, 1]",
            suggestion.confidence_score
        ))),
        Err(detail) => SuggestionOutcome::NoSuggestion(NoSuggestionReason::NonConforming(detail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TraceRecord;

    const CONFORMING: &str = r#"{
        "failure_category": "correlation",
        "correlation_issue": true,
        "recommended_extractor": {"type": "jsonpath", "expression": "$.token", "source": "previous_response"},
        "assertion_improvements": ["Assert response code 200", "Assert token is not empty"],
        "confidence_score": 0.85
    }"#;

    #[test]
    fn test_parse_conforming_reply() {
        let outcome = parse_suggestion(CONFORMING);
        let suggestion = outcome.suggestion().expect("suggestion");
        assert_eq!(suggestion.failure_category, "correlation");
        assert!(suggestion.correlation_issue);
        let extractor = suggestion.recommended_extractor.as_ref().unwrap();
        assert_eq!(extractor.kind, ExtractorKind::JsonPath);
        assert_eq!(extractor.expression, "$.token");
        assert_eq!(suggestion.assertion_improvements.len(), 2);
        assert_eq!(suggestion.confidence_score, 0.85);
    }

    #[test]
    fn test_parse_reply_wrapped_in_prose() {
        let text = format!("Sure! Here is the analysis:\n```json\n{}\n```\nHope it helps.", CONFORMING);
        assert!(parse_suggestion(&text).suggestion().is_some());
    }

    #[test]
    fn test_non_json_reply_is_no_suggestion() {
        let outcome = parse_suggestion("I could not determine the cause.");
        assert!(matches!(
            outcome,
            SuggestionOutcome::NoSuggestion(NoSuggestionReason::NonConforming(_))
        ));
    }

    #[test]
    fn test_wrong_shape_is_no_suggestion() {
        let outcome = parse_suggestion(r#"{"error": "non_json_response"}"#);
        assert!(outcome.suggestion().is_none());

        let bad_kind = r#"{"failure_category":"x","correlation_issue":false,
            "recommended_extractor":{"type":"css","expression":"a","source":"b"},"confidence_score":0.5}"#;
        assert!(parse_suggestion(bad_kind).suggestion().is_none());
    }

    #[test]
    fn test_confidence_out_of_range_is_no_suggestion() {
        let text = r#"{"failure_category":"x","correlation_issue":false,"confidence_score":1.5}"#;
        assert!(parse_suggestion(text).suggestion().is_none());
    }

    #[test]
    fn test_server_error_without_extractor() {
        let text = r#"{"failure_category":"server_error","correlation_issue":false,"confidence_score":0.6}"#;
        let outcome = parse_suggestion(text);
        let suggestion = outcome.suggestion().unwrap();
        assert!(suggestion.recommended_extractor.is_none());
        assert!(suggestion.assertion_improvements.is_empty());
    }

    #[test]
    fn test_payload_defaults_absent_text_to_empty() {
        let record = TraceRecord::new("T1", "step", false);
        let failure = FailureRecord::new(&record, 0, None);
        let payload = SuggestionPayload::new(&failure, CandidateSet::default());

        assert_eq!(
            payload.to_message(),
            r#"{"failed_request":"","failed_response":"","candidate_dynamic_values":{}}"#
        );
    }
}
