//! Spec schema version negotiation.

use crate::errors::{Result, SpecError};

/// The v3 document shape: named connectors with plugin type/name/config.
pub const SPEC_VERSION_V3: &str = "v3";

/// The version stamped on newly built specs.
pub const LATEST_SPEC_VERSION: &str = SPEC_VERSION_V3;

/// Every version this build can validate and serialize.
pub const SUPPORTED_SPEC_VERSIONS: &[&str] = &[SPEC_VERSION_V3];

/// Returns true if `declared` is a supported spec version.
#[must_use]
pub fn is_supported_spec_version(declared: &str) -> bool {
    SUPPORTED_SPEC_VERSIONS.contains(&declared)
}

/// Checks a declared spec version against the supported list.
///
/// # Errors
///
/// Returns [`SpecError::UnsupportedVersion`] naming both the declared and the
/// supported versions.
pub fn validate_spec_version(declared: &str) -> Result<()> {
    if is_supported_spec_version(declared) {
        return Ok(());
    }

    Err(SpecError::UnsupportedVersion {
        declared: declared.to_string(),
        supported: SUPPORTED_SPEC_VERSIONS
            .iter()
            .map(|v| (*v).to_string())
            .collect(),
    })
}
