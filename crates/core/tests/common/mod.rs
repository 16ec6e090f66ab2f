//! Shared test infrastructure.

/// `TestContext` builder and run helpers.
pub mod harness;

/// Mock and recording trackers.
pub mod mocks;

pub use harness::TestContext;
