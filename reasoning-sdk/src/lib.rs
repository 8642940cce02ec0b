//! # Reasoning SDK
//!
//! Integration with the external reasoning collaborator that turns a failure
//! correlation payload into a structured suggestion.
//!
//! This crate provides:
//!
//! - The `ReasoningCollaborator` trait, the injected capability the suggestion
//!   flow depends on
//! - An OpenAI-compatible chat-completions client implementing it
//! - Retry with exponential backoff for transient collaborator failures
//! - Comprehensive error handling system
//! - Configuration management utilities
//! - `SuggestionService`, which drives extraction, payload building, the
//!   collaborator call and tolerant parsing for each failure
//!
//! ## Architecture
//!
//! - `ReasoningCollaborator`: payload in, raw reply text out
//! - `OpenAIClient`: the production collaborator
//! - `RetryExecutor`: bounded retries for retryable `ServiceError`s
//! - `SuggestionService`: per-failure orchestration, never fails outward

// Reasoning collaborator seam
pub mod collaborator;
pub use collaborator::ReasoningCollaborator;

// Re-export service-specific modules
pub mod services;
pub use services::openai;
pub use services::openai::{OpenAIClient, OpenAIClientBuilder};

// Suggestion orchestration
pub mod suggestion_service;
pub use suggestion_service::SuggestionService;

// Re-export error handling
pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

// Re-export resilience patterns
pub mod resilience;
pub use resilience::{RetryConfig, RetryExecutor};

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, ReasoningConfig, ServiceConfig};

// Utility module for common functionality
mod util;

#[cfg(test)]
mod tests;
