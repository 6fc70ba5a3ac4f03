//! Testing utilities for deployment specs.
//!
//! This module provides:
//! - Canonical spec fixtures
//! - A fluent fixture builder for hand-shaped (possibly invalid) specs
//! - Assertions on errors and spec structure

mod assertions;
mod fixtures;

pub use assertions::{assert_error_code, assert_round_trip, assert_single_source};
pub use fixtures::{function_spec, minimal_spec, sample_definition, sequential_session, SpecFixture};
