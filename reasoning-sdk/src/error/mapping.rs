//! Error mapping for the chat-completions API
//!
//! Converts HTTP error responses into `ServiceError`s. The status code is
//! always recorded on the context so retry decisions can see it.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

/// Map an OpenAI-style error body to a ServiceError
///
/// Understands `{"error": {"message", "type", "code"}}` and falls back to a
/// top-level `message`.
pub fn map_openai_error(status: StatusCode, json: &Value, context: &mut ErrorContext) -> ServiceError {
    context.service = "openai".to_string();

    let message = match json.get("error") {
        Some(error) => {
            if let Some(error_type) = error.get("type").and_then(|t| t.as_str()) {
                context.add("error_type", error_type);
            }
            if let Some(code) = error.get("code").and_then(|c| c.as_str()) {
                context.error_code = Some(code.to_string());
            }
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .unwrap_or("Unknown OpenAI error")
        }
        None => json
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error"),
    };

    error_for_status(status, message)
}

/// Map an HTTP error response to a ServiceError with its context attached
pub fn map_http_error(status: StatusCode, body: &str, mut context: ErrorContext) -> ServiceError {
    context.status_code = Some(status.as_u16());
    context.add("category", classify_http_error(status));

    let error = match serde_json::from_str::<Value>(body) {
        Ok(json) => map_openai_error(status, &json, &mut context),
        Err(_) => {
            let message = if body.is_empty() {
                status.to_string()
            } else if body.chars().count() > 100 {
                format!("{}: {}...", status, body.chars().take(100).collect::<String>())
            } else {
                format!("{}: {}", status, body)
            };
            error_for_status(status, message)
        }
    };

    error.with_context(context)
}

fn error_for_status(status: StatusCode, message: impl Into<String>) -> ServiceError {
    let message = message.into();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::authentication(message),
        StatusCode::FORBIDDEN => ServiceError::authorization(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::validation(message),
        StatusCode::NOT_FOUND => ServiceError::service(format!("Resource not found: {}", message)),
        _ => ServiceError::service(message),
    }
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openai_error_body() {
        let body = json!({
            "error": {"message": "Invalid API key", "type": "invalid_request_error", "code": "invalid_api_key"}
        });
        let mut context = ErrorContext::new();
        let error = map_openai_error(StatusCode::UNAUTHORIZED, &body, &mut context);

        assert!(matches!(error, ServiceError::Authentication(ref m) if m == "Invalid API key"));
        assert_eq!(context.service, "openai");
        assert_eq!(context.error_code.as_deref(), Some("invalid_api_key"));
        assert_eq!(context.data.get("error_type").map(String::as_str), Some("invalid_request_error"));
    }

    #[test]
    fn test_plain_text_body_keeps_status() {
        let error = map_http_error(StatusCode::BAD_GATEWAY, "upstream down", ErrorContext::new());
        assert_eq!(error.status_code(), Some(502));
        assert!(error.is_retryable());
        assert!(error.to_string().contains("upstream down"));
    }

    #[test]
    fn test_long_body_is_shortened() {
        let body = "x".repeat(500);
        let error = map_http_error(StatusCode::INTERNAL_SERVER_ERROR, &body, ErrorContext::new());
        assert!(error.to_string().len() < 200);
    }

    #[test]
    fn test_validation_is_not_retryable() {
        let body = r#"{"error": {"message": "max_tokens too large"}}"#;
        let error = map_http_error(StatusCode::BAD_REQUEST, body, ErrorContext::new());
        assert!(matches!(error.root(), ServiceError::Validation(_)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(classify_http_error(StatusCode::TOO_MANY_REQUESTS), "rate_limit");
        assert_eq!(classify_http_error(StatusCode::SERVICE_UNAVAILABLE), "server");
        assert!(map_http_error(StatusCode::SERVICE_UNAVAILABLE, "", ErrorContext::new()).is_retryable());
        assert!(!map_http_error(StatusCode::NOT_FOUND, "", ErrorContext::new()).is_retryable());
    }
}
