//! Shared test utilities for reconciler integration tests.
//!
//! This module provides:
//! - Builders for discovery entries and cluster objects
//! - An in-memory cluster and a recording evaluation engine

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::*;
