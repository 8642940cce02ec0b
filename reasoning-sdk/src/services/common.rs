//! HTTP plumbing shared by collaborator clients

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;

use crate::error::mapping::map_http_error;
use crate::error::{ErrorContext, Result, ServiceError};

/// `User-Agent` sent with every request, e.g. `jtl-analyzer/0.1.0 (chat-completions)`
#[derive(Debug, Clone)]
pub struct UserAgent {
    pub app_name: String,
    pub version: String,
    /// Component tag shown in parentheses
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "jtl-analyzer".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("reasoning-sdk".to_string()),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.extra {
            Some(extra) => write!(f, "{}/{} ({})", self.app_name, self.version, extra),
            None => write!(f, "{}/{}", self.app_name, self.version),
        }
    }
}

/// Client with gzip, a fixed user agent and a per-request timeout
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Duration) -> Result<Client> {
    let agent = user_agent.unwrap_or_default().to_string();
    let agent = HeaderValue::from_str(&agent)
        .map_err(|e| ServiceError::configuration(format!("User agent {:?} is not a valid header: {}", agent, e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, agent);

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Cannot build HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into a ServiceError
pub async fn parse_error_response(
    service_name: &str,
    endpoint: &str,
    request_id: &str,
    response: reqwest::Response,
) -> ServiceError {
    let status = response.status();
    let context = ErrorContext::for_service(service_name)
        .status_code(status.as_u16())
        .endpoint(endpoint)
        .request_id(request_id);

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable error body: {}>", e));

    map_http_error(status, &body, context)
}
