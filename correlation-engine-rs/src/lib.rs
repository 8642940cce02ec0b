//! # Correlation Engine
//!
//! Failure correlation for load-test execution traces.
//!
//! This crate provides:
//!
//! - The trace record model produced by trace ingestion
//! - Grouping of trace records into per-thread sequences
//! - A failure scanner pairing each failed attempt with its predecessor
//! - A heuristic extractor mining the predecessor's response for dynamic values
//! - The suggestion contract exchanged with an external reasoning collaborator
//!
//! ## Architecture
//!
//! Everything in this crate is a pure, synchronous batch computation:
//!
//! - `group_by_thread`: flat records → ordered per-thread sequences
//! - `scan_failures`: per-thread sequences → `FailureRecord`s
//! - `HeuristicExtractor`: predecessor response + failed request → `CandidateSet`
//! - `CorrelationEngine`: runs the three stages and builds a `CorrelationReport`
//!
//! Reading trace files and calling the reasoning collaborator happen elsewhere.

// Trace record model
pub mod model;
pub use model::{is_truthy, TraceRecord, TRUTHY_LITERALS};

// Grouping and scanning
pub mod grouping;
pub use grouping::{group_by_thread, ThreadGroups};

pub mod scanner;
pub use scanner::{scan_failures, FailureRecord, Predecessor};

// Heuristic extraction
pub mod candidates;
pub use candidates::{Candidate, CandidateSet};

pub mod heuristics;
pub use heuristics::{extract_candidates, ExtractorConfig, HeuristicExtractor};

mod json_snippet;
pub use json_snippet::{extract_balanced_object, parse_lenient};

// Reasoning collaborator boundary
pub mod suggestion;
pub use suggestion::{
    parse_suggestion, ExtractorKind, NoSuggestionReason, RecommendedExtractor, Suggestion,
    SuggestionOutcome, SuggestionPayload,
};

// Run summary
pub mod report;
pub use report::{CorrelationEngine, CorrelationReport};

// Error handling
pub mod error;
pub use error::{EngineError, Result};

#[cfg(test)]
mod tests;
