//! Collaborator error taxonomy
//!
//! Every failure talking to the reasoning collaborator ends up as a
//! `ServiceError`. The variant says what kind of failure it was; an optional
//! chain of `ErrorContext` wrappers records where it happened (HTTP status,
//! provider error code, request id, retry attempts). The retry executor
//! decides from the variant and the innermost status whether to try again.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod mapping;

/// Result alias used throughout the SDK
pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// Connection refused, reset, DNS failure
    #[error("Network failure: {0}")]
    Network(String),

    /// Missing or rejected API key
    #[error("Authentication rejected: {0}")]
    Authentication(String),

    #[error("Not authorized: {0}")]
    Authorization(String),

    /// 429 from the provider
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Provider-side failure; retryable only with a 5xx status in context
    #[error("Collaborator error: {0}")]
    Service(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Reply body that could not be decoded
    #[error("Unreadable response: {0}")]
    Parsing(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// An error annotated with where it happened
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

macro_rules! constructors {
    ($($name:ident => $variant:ident),* $(,)?) => {
        $(
            #[doc = concat!("Build a `", stringify!($variant), "` error")]
            pub fn $name(message: impl Into<String>) -> Self {
                ServiceError::$variant(message.into())
            }
        )*
    };
}

impl ServiceError {
    constructors! {
        network => Network,
        authentication => Authentication,
        authorization => Authorization,
        rate_limit => RateLimit,
        service => Service,
        validation => Validation,
        parsing => Parsing,
        configuration => Configuration,
        timeout => Timeout,
        internal => Internal,
    }

    /// Wrap this error with context
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Wrap this error with a single extra key/value
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.with_context(ErrorContext::new().with(key, value))
    }

    /// The underlying error, past all context wrappers
    pub fn root(&self) -> &ServiceError {
        let mut current = self;
        while let ServiceError::WithContext { inner, .. } = current {
            current = &**inner;
        }
        current
    }

    /// Contexts from the outermost wrapper inwards
    pub fn contexts(&self) -> impl Iterator<Item = &ErrorContext> {
        let mut current = Some(self);
        std::iter::from_fn(move || match current? {
            ServiceError::WithContext { inner, context } => {
                current = Some(&**inner);
                Some(context)
            }
            _ => {
                current = None;
                None
            }
        })
    }

    /// First HTTP status recorded in any context
    pub fn status_code(&self) -> Option<u16> {
        self.contexts().find_map(|c| c.status_code)
    }

    /// First provider error code recorded in any context
    pub fn error_code(&self) -> Option<&str> {
        self.contexts().find_map(|c| c.error_code.as_deref())
    }

    /// Service named by the outermost context
    pub fn service_name(&self) -> Option<&str> {
        self.contexts().next().map(|c| c.service.as_str())
    }

    /// Whether another attempt might succeed
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            ServiceError::Network(_) | ServiceError::Timeout(_) | ServiceError::RateLimit(_) => true,
            ServiceError::Service(_) => matches!(self.status_code(), Some(code) if code >= 500),
            _ => false,
        }
    }

    pub fn is_permanent(&self) -> bool {
        !self.is_retryable()
    }
}

/// Where and when an error happened
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub status_code: Option<u16>,
    /// Provider error code, e.g. `rate_limit_exceeded`
    pub error_code: Option<String>,
    pub request_id: Option<String>,
    pub endpoint: Option<String>,
    /// Free-form extras such as `attempts` or `category`
    pub data: BTreeMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::for_service("unknown")
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            timestamp: Utc::now(),
            status_code: None,
            error_code: None,
            request_id: None,
            endpoint: None,
            data: BTreeMap::new(),
        }
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Record an extra value in place
    pub fn add(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.data.insert(key.into(), value.to_string());
    }

    /// Record an extra value, builder style
    pub fn with(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.add(key, value);
        self
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let error = if err.is_timeout() {
            ServiceError::timeout(format!("request to collaborator timed out: {}", err))
        } else if err.is_connect() || err.is_request() {
            ServiceError::network(err.to_string())
        } else if err.is_decode() {
            ServiceError::parsing(format!("could not decode reply: {}", err))
        } else {
            ServiceError::internal(format!("http client: {}", err))
        };

        let mut context = ErrorContext::for_service("http_client");
        context.status_code = err.status().map(|status| status.as_u16());
        error.with_context(context)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::parsing(err.to_string()).with_context(ErrorContext::for_service("json"))
    }
}
