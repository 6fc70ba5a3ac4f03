//! Error types for deployment spec building and validation.
//!
//! Every failure in this crate describes a malformed pipeline definition or a
//! misordered call sequence. None of them are transient, so nothing here is
//! retryable.

use crate::spec::PluginType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = SpecError> = std::result::Result<T, E>;

/// Broad classification of a [`SpecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The pipeline graph itself is malformed.
    Structural,
    /// The spec was built by, or for, an incompatible schema version.
    Version,
    /// Function images were assigned in an invalid state.
    Image,
    /// A session request was missing a required field.
    Request,
    /// The call sequence violated the builder lifecycle.
    Lifecycle,
    /// Encoding, decoding or persisting the artifact failed.
    Codec,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Version => write!(f, "version"),
            Self::Image => write!(f, "image"),
            Self::Request => write!(f, "request"),
            Self::Lifecycle => write!(f, "lifecycle"),
            Self::Codec => write!(f, "codec"),
        }
    }
}

/// Which end of a stream referenced a missing vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointSide {
    /// The `from_uuid` end.
    From,
    /// The `to_uuid` end.
    To,
}

impl fmt::Display for EndpointSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From => write!(f, "source"),
            Self::To => write!(f, "destination"),
        }
    }
}

/// The main error type for spec operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// A vertex with this id is already registered.
    #[error("vertex {id} already exists")]
    DuplicateVertex {
        /// The conflicting id.
        id: String,
    },

    /// A graph edge referenced a vertex that was never registered.
    #[error("vertex {id} does not exist")]
    UnknownVertex {
        /// The missing id.
        id: String,
    },

    /// A stream referenced an endpoint that is not a vertex yet.
    #[error("stream {side} {id} does not exist")]
    MissingEndpoint {
        /// Which end of the stream is dangling.
        side: EndpointSide,
        /// The missing id.
        id: String,
    },

    /// A stream between the same two vertices already exists.
    #[error("stream from {from} to {to} already exists")]
    DuplicateEdge {
        /// Upstream vertex id.
        from: String,
        /// Downstream vertex id.
        to: String,
    },

    /// Inserting a stream would close a cycle.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// More than one source connector, or more than one graph root.
    #[error("invalid DAG, too many sources: {}", ids.join(", "))]
    MultipleSources {
        /// The competing source or root ids.
        ids: Vec<String>,
    },

    /// No source connector, or no graph root.
    #[error("invalid DAG, no sources found")]
    NoSource,

    /// The single graph root is not the source connector.
    #[error("invalid DAG, root {root} is not the source connector {source_id}")]
    RootNotSource {
        /// The vertex without incoming streams.
        root: String,
        /// The declared source connector.
        source_id: String,
    },

    /// Vertices exist but nothing is wired between them.
    #[error(
        "invalid DAG, there has to be at least one source, at most the declared functions, \
         and zero or more destinations wired together by streams"
    )]
    EmptyGraph,

    /// A connector was added through the wrong entry point.
    #[error("connector {id} is not a {expected} connector (got {actual})")]
    WrongDirection {
        /// The connector id.
        id: String,
        /// The direction the entry point accepts.
        expected: PluginType,
        /// The direction the connector declared.
        actual: PluginType,
    },

    /// The declared spec version is not supported.
    #[error("spec version {declared:?} is invalid, supported versions: {}", supported.join(", "))]
    UnsupportedVersion {
        /// The version found in the spec.
        declared: String,
        /// The versions this build understands.
        supported: Vec<String>,
    },

    /// Functions exist but no image was supplied.
    #[error("empty image for functions")]
    EmptyImage,

    /// An image was supplied but no functions exist.
    #[error("cannot set image {image:?} without defined functions")]
    ImageWithoutFunctions {
        /// The rejected image reference.
        image: String,
    },

    /// A session request is missing a required field.
    #[error("invalid request: {field} must not be empty")]
    InvalidRequest {
        /// The offending field.
        field: &'static str,
    },

    /// The language name is not one the tooling supports.
    #[error("unsupported language {language:?}")]
    UnknownLanguage {
        /// The rejected language name.
        language: String,
    },

    /// The definition was set more than once.
    #[error("spec definition is already initialized")]
    AlreadyInitialized,

    /// The spec was already finalized for this session.
    #[error("spec is finalized and can no longer be modified")]
    Finalized,

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpecError {
    /// Returns the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateVertex { .. }
            | Self::UnknownVertex { .. }
            | Self::MissingEndpoint { .. }
            | Self::DuplicateEdge { .. }
            | Self::CycleDetected(_)
            | Self::MultipleSources { .. }
            | Self::NoSource
            | Self::RootNotSource { .. }
            | Self::EmptyGraph
            | Self::WrongDirection { .. } => ErrorCategory::Structural,
            Self::UnsupportedVersion { .. } => ErrorCategory::Version,
            Self::EmptyImage | Self::ImageWithoutFunctions { .. } => ErrorCategory::Image,
            Self::InvalidRequest { .. } | Self::UnknownLanguage { .. } => ErrorCategory::Request,
            Self::AlreadyInitialized | Self::Finalized => ErrorCategory::Lifecycle,
            Self::Serialization(_) | Self::Io(_) => ErrorCategory::Codec,
        }
    }

    /// Returns a stable error code (e.g., "SPEC-004-CYCLE").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateVertex { .. } => "SPEC-001-DUPLICATE_VERTEX",
            Self::UnknownVertex { .. } => "SPEC-002-UNKNOWN_VERTEX",
            Self::MissingEndpoint { .. } => "SPEC-003-MISSING_ENDPOINT",
            Self::CycleDetected(_) => CYCLE_CODE,
            Self::MultipleSources { .. } => "SPEC-005-MULTIPLE_SOURCES",
            Self::NoSource => "SPEC-006-NO_SOURCE",
            Self::RootNotSource { .. } => "SPEC-007-ROOT_NOT_SOURCE",
            Self::EmptyGraph => "SPEC-008-EMPTY_GRAPH",
            Self::WrongDirection { .. } => "SPEC-009-WRONG_DIRECTION",
            Self::DuplicateEdge { .. } => "SPEC-010-DUPLICATE_EDGE",
            Self::UnsupportedVersion { .. } => "SPEC-101-UNSUPPORTED_VERSION",
            Self::EmptyImage => "SPEC-201-EMPTY_IMAGE",
            Self::ImageWithoutFunctions { .. } => "SPEC-202-IMAGE_WITHOUT_FUNCTIONS",
            Self::InvalidRequest { .. } => "SPEC-301-INVALID_REQUEST",
            Self::UnknownLanguage { .. } => "SPEC-302-UNKNOWN_LANGUAGE",
            Self::AlreadyInitialized => "SPEC-401-ALREADY_INITIALIZED",
            Self::Finalized => "SPEC-402-FINALIZED",
            Self::Serialization(_) => "SPEC-501-SERIALIZATION",
            Self::Io(_) => "SPEC-502-IO",
        }
    }

    /// Returns true for errors describing a malformed pipeline graph.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.category() == ErrorCategory::Structural
    }

    /// Builds diagnostic info for this error.
    #[must_use]
    pub fn error_info(&self) -> ErrorInfo {
        if let Self::CycleDetected(err) = self {
            return err.error_info.clone();
        }

        let info = ErrorInfo::new(self.code(), self.to_string())
            .with_context_entry("category", self.category().to_string());

        match self {
            Self::MissingEndpoint { id, .. } => info
                .with_context_entry("id", id.clone())
                .with_fix_hint("Add the connector or function before wiring a stream to it."),
            Self::DuplicateEdge { from, to } => info
                .with_context_entry("from", from.clone())
                .with_context_entry("to", to.clone())
                .with_fix_hint("Each pair of vertices is wired by at most one stream; drop the repeated call."),
            Self::MultipleSources { ids } => info
                .with_context_entry("ids", ids.join(","))
                .with_fix_hint("A pipeline reads from exactly one source; wire every other vertex downstream of it."),
            Self::EmptyGraph => {
                info.with_fix_hint("Write the source's records to a destination or through a function.")
            }
            Self::UnsupportedVersion { declared, supported } => info
                .with_context_entry("declared", declared.clone())
                .with_context_entry("supported", supported.join(","))
                .with_fix_hint("Rebuild the spec with a tool version that emits a supported spec version."),
            Self::EmptyImage => info.with_fix_hint("Build and push the function image before requesting the spec."),
            _ => info,
        }
    }
}

/// Diagnostic metadata attached to an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErrorInfo {
    /// Error code (e.g., "SPEC-004-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
}

impl ErrorInfo {
    /// Creates a new error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: BTreeMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

const CYCLE_CODE: &str = "SPEC-004-CYCLE";

/// Error raised when a stream would close a cycle in the pipeline graph.
#[derive(Debug, Clone, Error)]
#[error("invalid DAG, stream would create a cycle: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The vertex ids forming the cycle, first and last equal.
    pub cycle_path: Vec<String>,
    /// Diagnostic info.
    pub error_info: ErrorInfo,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        let info = ErrorInfo::new(
            CYCLE_CODE,
            format!("Pipeline contains a stream cycle: {}", cycle_path.join(" -> ")),
        )
        .with_context_entry("category", ErrorCategory::Structural.to_string())
        .with_fix_hint("Remove one of the streams in the cycle to break it.");

        Self {
            cycle_path,
            error_info: info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_error_message() {
        let err = CycleDetectedError::new(vec!["a".into(), "b".into(), "a".into()]);
        assert!(err.to_string().contains("a -> b -> a"));
        assert_eq!(err.error_info.code, "SPEC-004-CYCLE");
    }

    #[test]
    fn test_cycle_converts_into_spec_error() {
        let err: SpecError = CycleDetectedError::new(vec!["x".into(), "x".into()]).into();
        assert_eq!(err.code(), "SPEC-004-CYCLE");
        assert!(err.is_structural());
        assert_eq!(err.error_info().code, "SPEC-004-CYCLE");
    }

    #[test]
    fn test_missing_endpoint_names_side_and_id() {
        let err = SpecError::MissingEndpoint {
            side: EndpointSide::To,
            id: "d-1".into(),
        };
        assert_eq!(err.to_string(), "stream destination d-1 does not exist");
        assert_eq!(err.error_info().context.get("id").map(String::as_str), Some("d-1"));
    }

    #[test]
    fn test_duplicate_edge_is_structural() {
        let err = SpecError::DuplicateEdge {
            from: "S1".into(),
            to: "D1".into(),
        };
        assert_eq!(err.to_string(), "stream from S1 to D1 already exists");
        assert_eq!(err.code(), "SPEC-010-DUPLICATE_EDGE");
        assert!(err.is_structural());
        assert_eq!(err.error_info().context.get("to").map(String::as_str), Some("D1"));
    }

    #[test]
    fn test_unsupported_version_names_both_versions() {
        let err = SpecError::UnsupportedVersion {
            declared: "v2".into(),
            supported: vec!["v3".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("\"v2\""));
        assert!(msg.contains("v3"));
        assert_eq!(err.category(), ErrorCategory::Version);
    }

    #[test]
    fn test_categories() {
        assert_eq!(SpecError::EmptyImage.category(), ErrorCategory::Image);
        assert_eq!(SpecError::Finalized.category(), ErrorCategory::Lifecycle);
        assert_eq!(
            SpecError::InvalidRequest { field: "name" }.category(),
            ErrorCategory::Request
        );
        assert_eq!(
            SpecError::Serialization("bad".into()).category(),
            ErrorCategory::Codec
        );
        assert!(SpecError::NoSource.is_structural());
    }

    #[test]
    fn test_error_info_serializes_without_empty_fields() {
        let info = ErrorInfo::new("SPEC-006-NO_SOURCE", "no sources");
        let json = serde_json::to_value(&info).unwrap();
        assert!(json.get("fix_hint").is_none());
        assert!(json.get("context").is_none());
    }
}
