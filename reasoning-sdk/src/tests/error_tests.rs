//! Tests for the error taxonomy
//!
//! These tests verify constructors, context propagation and the retry
//! classification the collaborator client depends on.

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::error::mapping::map_http_error;
    use crate::error::{ErrorContext, ServiceError};

    #[test]
    fn test_error_display() {
        assert_eq!(ServiceError::network("reset").to_string(), "Network failure: reset");
        assert_eq!(ServiceError::rate_limit("slow down").to_string(), "Rate limited: slow down");
        assert_eq!(ServiceError::configuration("missing").to_string(), "Invalid configuration: missing");

        let wrapped = ServiceError::timeout("30s").with_context(ErrorContext::for_service("openai"));
        assert_eq!(wrapped.to_string(), "Timed out: 30s");
    }

    #[test]
    fn test_retry_classification() {
        assert!(ServiceError::network("x").is_retryable());
        assert!(ServiceError::timeout("x").is_retryable());
        assert!(ServiceError::rate_limit("x").is_retryable());

        assert!(ServiceError::validation("x").is_permanent());
        assert!(ServiceError::authentication("x").is_permanent());
        assert!(ServiceError::authorization("x").is_permanent());
        assert!(ServiceError::parsing("x").is_permanent());
        assert!(ServiceError::configuration("x").is_permanent());
        assert!(ServiceError::internal("x").is_permanent());
    }

    #[test]
    fn test_service_errors_retry_only_on_server_status() {
        let bare = ServiceError::service("boom");
        assert!(!bare.is_retryable());

        let server = ServiceError::service("boom").with_context(ErrorContext::new().status_code(503));
        assert!(server.is_retryable());

        let missing = ServiceError::service("gone").with_context(ErrorContext::new().status_code(404));
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_context_accessors_search_nested_wrappers() {
        let error = ServiceError::service("boom")
            .with_context(
                ErrorContext::for_service("openai")
                    .status_code(500)
                    .error_code("server_error")
                    .request_id("req-1")
                    .endpoint("chat/completions"),
            )
            .with_context_value("attempts", 3);

        assert_eq!(error.status_code(), Some(500));
        assert_eq!(error.error_code(), Some("server_error"));
        assert!(matches!(error.root(), ServiceError::Service(_)));
        assert!(error.is_retryable());

        match &error {
            ServiceError::WithContext { context, .. } => {
                assert_eq!(context.data.get("attempts").map(String::as_str), Some("3"));
            }
            other => panic!("expected context wrapper, got {:?}", other),
        }
    }

    #[test]
    fn test_mapped_http_errors() {
        let rate_limited = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#,
            ErrorContext::for_service("openai"),
        );
        assert!(matches!(rate_limited.root(), ServiceError::RateLimit(_)));
        assert_eq!(rate_limited.status_code(), Some(429));
        assert_eq!(rate_limited.error_code(), Some("rate_limit_exceeded"));
        assert!(rate_limited.is_retryable());

        let unauthorized = map_http_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided"}}"#,
            ErrorContext::for_service("openai"),
        );
        assert!(matches!(unauthorized.root(), ServiceError::Authentication(_)));
        assert!(!unauthorized.is_retryable());

        let html = map_http_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<html>Internal Server Error</html>",
            ErrorContext::for_service("openai"),
        );
        assert!(matches!(html.root(), ServiceError::Service(_)));
        assert!(html.is_retryable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error = ServiceError::from(err);
        assert!(matches!(error.root(), ServiceError::Parsing(_)));
        assert_eq!(error.service_name(), Some("json"));
    }

    #[test]
    fn test_contexts_outermost_first() {
        let error = ServiceError::timeout("slow")
            .with_context(ErrorContext::for_service("openai").status_code(504))
            .with_context_value("attempts", 2);

        let services: Vec<_> = error.contexts().map(|c| c.service.as_str()).collect();
        assert_eq!(services, vec!["unknown", "openai"]);
        assert_eq!(error.service_name(), Some("unknown"));
        assert_eq!(error.status_code(), Some(504));
        assert_eq!(ServiceError::network("x").contexts().count(), 0);
    }
}
