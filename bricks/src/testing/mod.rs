//! Testing utilities for query pipelines.
//!
//! This module provides:
//! - Mock queries that record loads and complete on demand
//! - A recorder for delivered results
//! - Assertions for results and pages

mod assertions;
mod mocks;
mod recorder;

pub use assertions::{assert_failed, assert_page, assert_succeeded};
pub use mocks::{QuerySpy, StubQuery};
pub use recorder::ResultRecorder;
