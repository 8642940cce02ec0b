//! Heuristic candidate extraction
//!
//! Mines a predecessor's response for values that look generated or
//! session-scoped (tokens, ids, keys) and checks whether the failed request
//! carries them verbatim:
//!
//! 1. Parse the response as JSON, falling back to its first embedded object.
//! 2. Walk the document depth-first, pre-order, collecting fields whose name
//!    contains a dynamic token and whose value is a long alphanumeric string.
//! 3. Keep the candidates that occur verbatim in the failed request.
//! 4. When none do, return the first raw candidates instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidates::CandidateSet;
use crate::error::{EngineError, Result};
use crate::json_snippet::parse_lenient;

/// Field-name fragments that suggest a generated or session-scoped value
pub const DEFAULT_DYNAMIC_TOKENS: &[&str] = &[
    "id",
    "token",
    "session",
    "auth",
    "csrf",
    "key",
    "reference",
    "number",
];

/// Tunables for the candidate extractor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Field-name fragments matched case-insensitively
    pub dynamic_tokens: Vec<String>,

    /// Values must be strictly longer than this many characters
    pub min_value_len: usize,

    /// Values must contain an ASCII alphanumeric run of at least this length
    pub min_alnum_run: usize,

    /// Maximum raw candidates collected before filtering
    pub raw_cap: usize,

    /// Maximum candidates returned
    pub result_cap: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            dynamic_tokens: DEFAULT_DYNAMIC_TOKENS.iter().map(|t| t.to_string()).collect(),
            min_value_len: 8,
            min_alnum_run: 8,
            raw_cap: 50,
            result_cap: 10,
        }
    }
}

impl ExtractorConfig {
    /// Validate this configuration
    pub fn validate(&self) -> Result<()> {
        if self.dynamic_tokens.iter().all(|t| t.is_empty()) {
            return Err(EngineError::configuration("At least one dynamic token is required"));
        }

        if self.result_cap == 0 {
            return Err(EngineError::configuration("Result cap must be greater than zero"));
        }

        if self.raw_cap < self.result_cap {
            return Err(EngineError::configuration(format!(
                "Raw cap ({}) must not be smaller than result cap ({})",
                self.raw_cap, self.result_cap
            )));
        }

        Ok(())
    }
}

/// Extracts correlation candidates from a predecessor's response
#[derive(Debug, Clone)]
pub struct HeuristicExtractor {
    config: ExtractorConfig,
    tokens: Vec<String>,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        let config = ExtractorConfig::default();
        let tokens = lowered_tokens(&config);
        Self { config, tokens }
    }
}

impl HeuristicExtractor {
    /// Create an extractor from a validated configuration
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.validate()?;
        let tokens = lowered_tokens(&config);
        Ok(Self { config, tokens })
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Produce the candidate set for one failure
    ///
    /// Never fails: an absent or unparsable response yields an empty set.
    pub fn extract(&self, previous_response: Option<&str>, failed_request: Option<&str>) -> CandidateSet {
        let document = match previous_response.and_then(parse_lenient) {
            Some(document) => document,
            None => return CandidateSet::with_capacity_limit(self.config.result_cap),
        };

        let raw = self.collect_raw(&document);
        let request = failed_request.unwrap_or("");

        let matched = raw.select(self.config.result_cap, |c| request.contains(c.value.as_str()));
        let candidates = if matched.is_empty() {
            raw.select(self.config.result_cap, |_| true)
        } else {
            matched
        };

        log::info!("Heuristic candidates: {:?}", candidates.paths());
        candidates
    }

    /// Collect raw candidates in traversal order, up to the raw cap
    pub fn collect_raw(&self, document: &Value) -> CandidateSet {
        let mut raw = CandidateSet::with_capacity_limit(self.config.raw_cap);
        self.walk(document, "", &mut raw);
        raw
    }

    fn walk(&self, value: &Value, path: &str, raw: &mut CandidateSet) {
        if raw.is_full() {
            return;
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let full_key = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    if self.is_dynamic_key(key) {
                        if let Value::String(text) = child {
                            if self.looks_generated(text) {
                                raw.upsert(full_key.clone(), text.clone());
                            }
                        }
                    }

                    self.walk(child, &full_key, raw);
                    if raw.is_full() {
                        return;
                    }
                }
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.walk(item, &format!("{}[{}]", path, idx), raw);
                    if raw.is_full() {
                        return;
                    }
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }

    /// Whether a field name contains one of the dynamic tokens
    pub fn is_dynamic_key(&self, key: &str) -> bool {
        let lowered = key.to_lowercase();
        self.tokens.iter().any(|token| lowered.contains(token.as_str()))
    }

    /// Whether a value is long enough and contains a long alphanumeric run
    pub fn looks_generated(&self, value: &str) -> bool {
        value.chars().count() > self.config.min_value_len
            && has_alnum_run(value, self.config.min_alnum_run)
    }
}

/// Extract candidates with the default configuration
pub fn extract_candidates(previous_response: Option<&str>, failed_request: Option<&str>) -> CandidateSet {
    HeuristicExtractor::default().extract(previous_response, failed_request)
}

fn lowered_tokens(config: &ExtractorConfig) -> Vec<String> {
    config
        .dynamic_tokens
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn has_alnum_run(value: &str, min_run: usize) -> bool {
    let mut run = 0usize;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            run += 1;
            if run >= min_run {
                return true;
            }
        } else {
            run = 0;
        }
    }
    min_run == 0
}
