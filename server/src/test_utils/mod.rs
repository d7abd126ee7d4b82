//! Test utilities
//!
//! Manual mock implementations and test fixtures for unit testing.
//!
//! Mocks are hand-written rather than generated: they record what the engine
//! asked for (pages, polls, payloads) so tests can assert on call sequences.

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
