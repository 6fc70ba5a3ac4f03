//! Test assertions for specs and spec errors.

use crate::codec::{marshal, unmarshal};
use crate::errors::Result;
use crate::spec::DeploymentSpec;

/// Asserts that a result failed with the given error code.
pub fn assert_error_code<T: std::fmt::Debug>(result: &Result<T>, expected: &str) {
    match result {
        Ok(value) => panic!("Expected error {expected}, got Ok({value:?})"),
        Err(err) => assert_eq!(
            err.code(),
            expected,
            "Expected error code {expected}, got {} ({err})",
            err.code()
        ),
    }
}

/// Asserts that the spec has exactly one source connector.
pub fn assert_single_source(spec: &DeploymentSpec) {
    let sources: Vec<&str> = spec.sources().map(|c| c.uuid.as_str()).collect();
    assert_eq!(
        sources.len(),
        1,
        "Expected exactly one source, found {sources:?}"
    );
}

/// Asserts that the spec marshals and decodes back to itself.
pub fn assert_round_trip(spec: &DeploymentSpec) {
    let bytes = match marshal(spec) {
        Ok(bytes) => bytes,
        Err(err) => panic!("Expected spec to marshal, got {err}"),
    };
    let decoded = match unmarshal(&bytes) {
        Ok(decoded) => decoded,
        Err(err) => panic!("Expected artifact to decode, got {err}"),
    };
    assert_eq!(&decoded, spec, "Round-tripped spec differs");
}
