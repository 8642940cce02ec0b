//! Crate-level tests for the correlation engine
//!
//! Scenario tests walk whole traces through the engine; property tests check
//! the grouping, scanning and extraction invariants over generated traces.
