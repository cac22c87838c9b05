//! Shared test utilities for docket integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated test execution with temp directories
//! - `TaskSheetBuilder` for writing task spreadsheets programmatically

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
