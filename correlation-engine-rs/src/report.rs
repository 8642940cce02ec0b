//! Correlation run
//!
//! `CorrelationEngine` chains grouping, scanning and candidate extraction over
//! one complete batch of trace records and returns a `CorrelationReport` for
//! presentation.

use serde::Serialize;

use crate::grouping::group_by_thread;
use crate::heuristics::HeuristicExtractor;
use crate::model::TraceRecord;
use crate::scanner::{scan_failures, FailureRecord};

/// Summary and per-failure detail of one correlation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// Number of trace records analyzed
    pub total_records: usize,
    /// Number of distinct execution threads
    pub thread_count: usize,
    /// Failures in thread-then-sequence order, each with its candidate set
    pub failures: Vec<FailureRecord>,
}

impl CorrelationReport {
    /// Number of failed samples
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Failed samples as a percentage of all records, 0 for an empty run
    pub fn failure_percentage(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.failure_count() as f64 / self.total_records as f64 * 100.0
        }
    }

    /// Whether every sample succeeded
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the failure correlation pipeline
#[derive(Debug, Clone, Default)]
pub struct CorrelationEngine {
    extractor: HeuristicExtractor,
}

impl CorrelationEngine {
    /// Create an engine around a configured extractor
    pub fn new(extractor: HeuristicExtractor) -> Self {
        Self { extractor }
    }

    /// The extractor used for candidate sets
    pub fn extractor(&self) -> &HeuristicExtractor {
        &self.extractor
    }

    /// Group, scan and attach candidate sets for one batch of records
    pub fn analyze(&self, records: &[TraceRecord]) -> CorrelationReport {
        let groups = group_by_thread(records);
        let mut failures = scan_failures(&groups);

        for failure in &mut failures {
            let candidates = self
                .extractor
                .extract(failure.previous_response.as_deref(), failure.request_data.as_deref());
            failure.attach_candidates(candidates);
        }

        CorrelationReport {
            total_records: records.len(),
            thread_count: groups.len(),
            failures,
        }
    }
}
