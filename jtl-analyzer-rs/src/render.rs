//! Report rendering
//!
//! Turns a `CorrelationReport` and optional suggestion outcomes into either a
//! human-readable text report or a JSON document.

use std::fmt;

use correlation_engine_rs::{CorrelationReport, FailureRecord, SuggestionOutcome};
use serde::Serialize;

const PREVIEW_CHARS: usize = 160;

#[derive(Serialize)]
struct Summary {
    total_records: usize,
    thread_count: usize,
    failure_count: usize,
    failure_percentage: f64,
}

#[derive(Serialize)]
struct FailureEntry<'a> {
    #[serde(flatten)]
    failure: &'a FailureRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a SuggestionOutcome>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: Summary,
    failures: Vec<FailureEntry<'a>>,
}

/// Render the report as pretty-printed JSON
pub fn render_json(
    report: &CorrelationReport,
    suggestions: Option<&[SuggestionOutcome]>,
) -> serde_json::Result<String> {
    let failures = report
        .failures
        .iter()
        .enumerate()
        .map(|(idx, failure)| FailureEntry {
            failure,
            suggestion: suggestions.and_then(|s| s.get(idx)),
        })
        .collect();

    let document = JsonReport {
        summary: Summary {
            total_records: report.total_records,
            thread_count: report.thread_count,
            failure_count: report.failure_count(),
            failure_percentage: report.failure_percentage(),
        },
        failures,
    };

    serde_json::to_string_pretty(&document)
}

/// Render the report as plain text
pub fn render_text(report: &CorrelationReport, suggestions: Option<&[SuggestionOutcome]>) -> String {
    TextReport { report, suggestions }.to_string()
}

struct TextReport<'a> {
    report: &'a CorrelationReport,
    suggestions: Option<&'a [SuggestionOutcome]>,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(
            f,
            "Analyzed {} samples across {} threads",
            report.total_records, report.thread_count
        )?;
        writeln!(
            f,
            "Failures: {} ({:.2}%)",
            report.failure_count(),
            report.failure_percentage()
        )?;

        if report.all_passed() {
            return writeln!(f, "\nAll samples passed.");
        }

        for (idx, failure) in report.failures.iter().enumerate() {
            write_failure(f, idx, failure)?;
            if let Some(outcome) = self.suggestions.and_then(|s| s.get(idx)) {
                write_outcome(f, outcome)?;
            }
        }
        Ok(())
    }
}

fn write_failure(f: &mut fmt::Formatter<'_>, idx: usize, failure: &FailureRecord) -> fmt::Result {
    writeln!(
        f,
        "\n[{}] {} (thread {}, step {})",
        idx + 1,
        failure.sampler_label.as_deref().unwrap_or("<unlabeled>"),
        failure.thread_id.as_deref().unwrap_or("<none>"),
        failure.sequence_index
    )?;

    match &failure.previous_label {
        Some(label) => writeln!(f, "    after:    {}", label)?,
        None if !failure.has_predecessor() => writeln!(f, "    after:    (first step in thread)")?,
        None => {}
    }

    if let Some(request) = &failure.request_data {
        writeln!(f, "    request:  {}", preview(request))?;
    }
    if let Some(response) = &failure.response_data {
        writeln!(f, "    response: {}", preview(response))?;
    }

    match failure.candidate_set() {
        Some(candidates) if !candidates.is_empty() => {
            writeln!(f, "    candidates:")?;
            for candidate in candidates {
                writeln!(f, "      {} = {}", candidate.path, preview(&candidate.value))?;
            }
            Ok(())
        }
        _ => writeln!(f, "    candidates: none"),
    }
}

fn write_outcome(f: &mut fmt::Formatter<'_>, outcome: &SuggestionOutcome) -> fmt::Result {
    match outcome {
        SuggestionOutcome::Suggested(suggestion) => {
            writeln!(
                f,
                "    suggestion: {} (correlation issue: {}, confidence {:.2})",
                suggestion.failure_category,
                if suggestion.correlation_issue { "yes" } else { "no" },
                suggestion.confidence_score
            )?;
            if let Some(extractor) = &suggestion.recommended_extractor {
                writeln!(
                    f,
                    "      extractor: {} `{}` from {}",
                    extractor.kind, extractor.expression, extractor.source
                )?;
            }
            for improvement in &suggestion.assertion_improvements {
                writeln!(f, "      assertion: {}", improvement)?;
            }
            Ok(())
        }
        SuggestionOutcome::NoSuggestion(reason) => writeln!(f, "    suggestion: none ({})", reason),
    }
}

fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let flat = flat.trim();

    if flat.chars().count() <= PREVIEW_CHARS {
        flat.to_string()
    } else {
        let head: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", head)
    }
}
