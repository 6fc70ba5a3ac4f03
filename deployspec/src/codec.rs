//! Canonical encoding of the deployment spec artifact.
//!
//! [`marshal`] fails closed: it only encodes specs that pass the DAG validator
//! and the version check. [`unmarshal`] decodes without validating; bytes from
//! an untrusted origin must go through [`crate::dag::validate_dag`] again.

use crate::dag::validate_dag;
use crate::errors::{Result, SpecError};
use crate::spec::{validate_spec_version, DeploymentSpec};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Validates and encodes a spec.
///
/// # Errors
///
/// Returns the first structural or version error, or a serialization error.
pub fn marshal(spec: &DeploymentSpec) -> Result<Vec<u8>> {
    validate_dag(spec)?;
    validate_spec_version(spec.spec_version())?;
    encode(spec)
}

/// Decodes a spec without validating it.
///
/// # Errors
///
/// Returns [`SpecError::Serialization`] if the bytes are not a spec document.
pub fn unmarshal(bytes: &[u8]) -> Result<DeploymentSpec> {
    serde_json::from_slice(bytes).map_err(|e| SpecError::Serialization(e.to_string()))
}

/// Encodes without validation. Callers must have validated already.
pub(crate) fn encode(spec: &DeploymentSpec) -> Result<Vec<u8>> {
    serde_json::to_vec(spec).map_err(|e| SpecError::Serialization(e.to_string()))
}

/// Hex-encoded SHA-256 of an artifact.
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// An encoded spec together with its digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedSpec {
    bytes: Vec<u8>,
    digest: String,
}

impl SerializedSpec {
    /// Validates and encodes a spec.
    ///
    /// # Errors
    ///
    /// See [`marshal`].
    pub fn from_spec(spec: &DeploymentSpec) -> Result<Self> {
        marshal(spec).map(Self::from_bytes)
    }

    /// Wraps already-encoded bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let digest = digest(&bytes);
        Self { bytes, digest }
    }

    /// Returns the encoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the wrapper, returning the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the hex SHA-256 digest of the bytes.
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Returns the document as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Serialization`] if the bytes are not UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| SpecError::Serialization(e.to_string()))
    }

    /// Returns the byte length of the document.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns true if `expected` matches this artifact's digest.
    #[must_use]
    pub fn verify(&self, expected: &str) -> bool {
        self.digest.eq_ignore_ascii_case(expected)
    }

    /// Decodes the document without validating it.
    ///
    /// # Errors
    ///
    /// See [`unmarshal`].
    pub fn to_spec(&self) -> Result<DeploymentSpec> {
        unmarshal(&self.bytes)
    }
}

/// Validates, encodes and writes a spec to `path`.
///
/// # Errors
///
/// Fails on validation, serialization or IO errors. Nothing is written if
/// validation fails.
pub fn write_spec_file(path: impl AsRef<Path>, spec: &DeploymentSpec) -> Result<SerializedSpec> {
    let serialized = SerializedSpec::from_spec(spec)?;
    fs::write(path.as_ref(), serialized.as_bytes())?;
    tracing::debug!(
        path = %path.as_ref().display(),
        digest = %serialized.digest(),
        "Wrote deployment spec"
    );
    Ok(serialized)
}

/// Reads and decodes a spec from `path` without validating it.
///
/// # Errors
///
/// Fails on IO or decoding errors.
pub fn read_spec_file(path: impl AsRef<Path>) -> Result<DeploymentSpec> {
    let bytes = fs::read(path.as_ref())?;
    unmarshal(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{function_spec, minimal_spec};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip() {
        let spec = function_spec();
        let bytes = marshal(&spec).unwrap();
        assert_eq!(unmarshal(&bytes).unwrap(), spec);
    }

    #[test]
    fn test_field_order_is_stable() {
        let bytes = marshal(&minimal_spec()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let connectors = text.find("\"connectors\"").unwrap();
        let streams = text.find("\"streams\"").unwrap();
        let definition = text.find("\"definition\"").unwrap();
        assert!(connectors < streams && streams < definition);

        let uuid = text.find("\"uuid\"").unwrap();
        let plugin_type = text.find("\"plugin_type\"").unwrap();
        assert!(uuid < plugin_type);
    }

    #[test]
    fn test_plugin_config_keys_are_sorted() {
        let mut spec = minimal_spec();
        spec.connectors[0] = spec.connectors[0]
            .clone()
            .with_config_entry("zeta", "2")
            .with_config_entry("alpha", "1");

        let first = String::from_utf8(marshal(&spec).unwrap()).unwrap();
        let second = String::from_utf8(marshal(&spec).unwrap()).unwrap();
        assert_eq!(first, second);
        assert!(first.find("\"alpha\"").unwrap() < first.find("\"zeta\"").unwrap());
    }

    #[test]
    fn test_marshal_fails_closed_on_version() {
        let mut spec = minimal_spec();
        spec.definition.metadata.spec_version = "v2".to_string();
        let err = marshal(&spec).unwrap_err();
        assert!(matches!(err, SpecError::UnsupportedVersion { ref declared, .. } if declared == "v2"));
    }

    #[test]
    fn test_marshal_fails_closed_on_structure() {
        let mut spec = minimal_spec();
        spec.streams.clear();
        assert!(matches!(marshal(&spec).unwrap_err(), SpecError::EmptyGraph));
    }

    #[test]
    fn test_unmarshal_does_not_validate() {
        let bytes = br#"{"connectors":[],"definition":{"git_sha":"","metadata":{"turbine":{"language":"golang","version":""},"spec_version":"v0"}}}"#;
        let spec = unmarshal(bytes).unwrap();
        assert!(spec.is_empty());
        assert_eq!(spec.spec_version(), "v0");
    }

    #[test]
    fn test_unmarshal_rejects_garbage() {
        let err = unmarshal(b"not json").unwrap_err();
        assert_eq!(err.code(), "SPEC-501-SERIALIZATION");
    }

    #[test]
    fn test_serialized_spec_digest() {
        let serialized = SerializedSpec::from_spec(&minimal_spec()).unwrap();
        assert_eq!(serialized.digest().len(), 64);
        assert_eq!(serialized.digest(), digest(serialized.as_bytes()));
        assert!(serialized.verify(&serialized.digest().to_uppercase()));
        assert!(!serialized.verify("00"));
        assert_eq!(serialized.to_spec().unwrap(), minimal_spec());
        assert!(serialized.as_str().unwrap().starts_with('{'));
    }
}
