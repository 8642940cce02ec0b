//! Unit tests for the Reasoning SDK
//!
//! One file per area: configuration, error taxonomy, retry behavior, the
//! chat-completions client against a mock server, and the suggestion flow
//! against a mocked collaborator.

pub mod config_tests;
pub mod error_tests;
