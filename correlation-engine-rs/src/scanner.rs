//! Failure scanning
//!
//! Walks each per-thread sequence and emits one `FailureRecord` per
//! unsuccessful sample, paired with the attempt immediately before it in the
//! same thread. The predecessor does not have to be successful.

use serde::Serialize;

use crate::candidates::CandidateSet;
use crate::grouping::ThreadGroups;
use crate::model::TraceRecord;

/// The attempt immediately preceding a failure in its thread
#[derive(Debug, Clone, Copy)]
pub struct Predecessor<'a> {
    /// Index of the predecessor within the thread sequence
    pub index: usize,
    /// The predecessor record
    pub record: &'a TraceRecord,
}

/// One failed sample together with its predecessor's request and response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    /// Thread the failure belongs to
    pub thread_id: Option<String>,

    /// Label of the failed sampler
    pub sampler_label: Option<String>,

    /// Position of the failure within its thread sequence
    pub sequence_index: usize,

    /// Request payload, or the request headers when no payload was captured
    pub request_data: Option<String>,

    /// Response payload of the failed sample
    pub response_data: Option<String>,

    /// Label of the preceding sampler
    pub previous_label: Option<String>,

    /// Request payload of the preceding sampler
    pub previous_request: Option<String>,

    /// Response payload of the preceding sampler
    pub previous_response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_set: Option<CandidateSet>,
}

impl FailureRecord {
    /// Build a failure record from the failing sample and its predecessor
    pub fn new(failed: &TraceRecord, sequence_index: usize, predecessor: Option<Predecessor<'_>>) -> Self {
        let previous = predecessor.map(|p| p.record);

        Self {
            thread_id: failed.thread_id.clone(),
            sampler_label: failed.label.clone(),
            sequence_index,
            request_data: failed.request_text().map(str::to_string),
            response_data: failed.response_payload.clone(),
            previous_label: previous.and_then(|r| r.label.clone()),
            previous_request: previous.and_then(|r| r.request_payload.clone()),
            previous_response: previous.and_then(|r| r.response_payload.clone()),
            candidate_set: None,
        }
    }

    /// Whether this failure had an earlier attempt in its thread
    pub fn has_predecessor(&self) -> bool {
        self.sequence_index > 0
    }

    /// Candidate set, once attached
    pub fn candidate_set(&self) -> Option<&CandidateSet> {
        self.candidate_set.as_ref()
    }

    /// Attach the candidate set computed for this failure
    ///
    /// A candidate set can be attached only once; later attempts are refused
    /// and return false.
    pub fn attach_candidates(&mut self, candidates: CandidateSet) -> bool {
        if self.candidate_set.is_some() {
            log::warn!(
                "Candidate set already attached for {:?}/{:?}, ignoring",
                self.thread_id,
                self.sampler_label
            );
            return false;
        }
        self.candidate_set = Some(candidates);
        true
    }
}

/// Emit a failure record for every unsuccessful sample
///
/// Threads are visited in first-seen order and samples in sequence order.
pub fn scan_failures(groups: &ThreadGroups<'_>) -> Vec<FailureRecord> {
    let mut failures = Vec::new();

    for (_, sequence) in groups.iter() {
        for (i, record) in sequence.iter().enumerate() {
            if record.success {
                continue;
            }

            let predecessor = if i > 0 {
                Some(Predecessor {
                    index: i - 1,
                    record: sequence[i - 1],
                })
            } else {
                None
            };

            failures.push(FailureRecord::new(record, i, predecessor));
        }
    }

    log::info!("Detected {} failures", failures.len());
    failures
}
