//! Trace record model
//!
//! One `TraceRecord` is one observed request/response pair from a load-test
//! execution log. Records are produced once per run by trace ingestion and
//! are never mutated afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Literals that mark a sample as successful, compared case-insensitively
pub const TRUTHY_LITERALS: &[&str] = &["true", "1", "y", "yes"];

/// Check a raw success flag against [`TRUTHY_LITERALS`]
///
/// Absent values are false. No trimming or other coercion is applied.
pub fn is_truthy(raw: Option<&str>) -> bool {
    match raw {
        Some(value) => {
            let lowered = value.to_lowercase();
            TRUTHY_LITERALS.iter().any(|literal| *literal == lowered)
        }
        None => false,
    }
}

/// One observed request/response in the trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Logical execution thread (not an OS thread)
    #[serde(default, alias = "threadName", alias = "tn")]
    pub thread_id: Option<String>,

    /// Human name of the request
    #[serde(default, alias = "lb")]
    pub label: Option<String>,

    /// Whether the sample succeeded
    #[serde(default, alias = "s", deserialize_with = "deserialize_success")]
    pub success: bool,

    /// Request body as sent (JTL `samplerData`)
    #[serde(default, alias = "samplerData")]
    pub request_payload: Option<String>,

    /// Response body as received (JTL `responseData`)
    #[serde(default, alias = "responseData")]
    pub response_payload: Option<String>,

    /// Raw request headers
    #[serde(default, alias = "requestHeaders", alias = "requestHeader")]
    pub request_headers: Option<String>,

    /// Raw response headers
    #[serde(default, alias = "responseHeaders", alias = "responseHeader")]
    pub response_headers: Option<String>,
}

impl TraceRecord {
    /// Create a record with only the identifying fields set
    pub fn new(thread_id: impl Into<String>, label: impl Into<String>, success: bool) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            label: Some(label.into()),
            success,
            ..Self::default()
        }
    }

    /// Create a record whose success flag is given as a raw JTL literal
    pub fn from_raw_flag(
        thread_id: Option<String>,
        label: Option<String>,
        raw_success: Option<&str>,
    ) -> Self {
        Self {
            thread_id,
            label,
            success: is_truthy(raw_success),
            ..Self::default()
        }
    }

    /// Set the request payload
    pub fn with_request(mut self, payload: impl Into<String>) -> Self {
        self.request_payload = Some(payload.into());
        self
    }

    /// Set the response payload
    pub fn with_response(mut self, payload: impl Into<String>) -> Self {
        self.response_payload = Some(payload.into());
        self
    }

    /// Set the request headers
    pub fn with_request_headers(mut self, headers: impl Into<String>) -> Self {
        self.request_headers = Some(headers.into());
        self
    }

    /// Set the response headers
    pub fn with_response_headers(mut self, headers: impl Into<String>) -> Self {
        self.response_headers = Some(headers.into());
        self
    }

    /// Request text used when reporting a failure: payload first, then headers
    pub fn request_text(&self) -> Option<&str> {
        self.request_payload
            .as_deref()
            .or(self.request_headers.as_deref())
    }
}

/// Accept a bool, string, number or null and apply the truthy literal set
fn deserialize_success<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let flag = match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => is_truthy(Some(&s)),
        Some(Value::Number(n)) => is_truthy(Some(&n.to_string())),
        Some(_) => false,
    };
    Ok(flag)
}
