//! Test fixtures for deployment specs.

use crate::config::SpecConfig;
use crate::ids::IdStrategy;
use crate::session::{InitRequest, SpecSession};
use crate::spec::{
    ConnectorSpec, DefinitionSpec, DeploymentSpec, FunctionSpec, Language, StreamSpec,
};

/// Git sha used by every fixture.
const FIXTURE_GIT_SHA: &str = "3f2a9c1d";

/// A definition stamped with the latest spec version.
#[must_use]
pub fn sample_definition() -> DefinitionSpec {
    DefinitionSpec::new(FIXTURE_GIT_SHA, Language::Golang, "0.1.0")
}

/// A valid source-to-destination spec: `S1 -> D1`.
#[must_use]
pub fn minimal_spec() -> DeploymentSpec {
    SpecFixture::new()
        .with_source("S1")
        .with_destination("D1")
        .with_stream("S1", "D1")
        .build()
}

/// A valid spec with one function: `S1 -> F1 -> D1`.
#[must_use]
pub fn function_spec() -> DeploymentSpec {
    SpecFixture::new()
        .with_source("S1")
        .with_function("F1", "anonymize")
        .with_destination("D1")
        .with_stream("S1", "F1")
        .with_stream("F1", "D1")
        .with_image("registry.local/app:latest")
        .build()
}

/// An initialized session with sequential ids.
///
/// # Panics
///
/// Panics if init fails, which only happens on a broken fixture.
#[must_use]
pub fn sequential_session() -> SpecSession {
    let session =
        SpecSession::with_config(SpecConfig::new().with_id_strategy(IdStrategy::Sequential));
    let init = InitRequest::new("fixture-app", FIXTURE_GIT_SHA, Language::Golang, "0.1.0");
    if let Err(err) = session.init(init) {
        panic!("fixture session failed to init: {err}");
    }
    session
}

/// Builds a [`DeploymentSpec`] document directly, skipping the builder.
///
/// Nothing is checked, so fixtures can describe invalid graphs for validator
/// tests. Stream ids are `T1`, `T2`, ... in insertion order.
#[derive(Debug, Clone)]
pub struct SpecFixture {
    spec: DeploymentSpec,
}

impl Default for SpecFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecFixture {
    /// Starts from an empty document with [`sample_definition`].
    #[must_use]
    pub fn new() -> Self {
        let mut spec = DeploymentSpec::new();
        spec.definition = sample_definition();
        Self { spec }
    }

    /// Adds a source connector named after its id.
    #[must_use]
    pub fn with_source(mut self, id: &str) -> Self {
        self.spec
            .connectors
            .push(ConnectorSpec::source(id, format!("{id}-resource"), "postgres"));
        self
    }

    /// Adds a destination connector named after its id.
    #[must_use]
    pub fn with_destination(mut self, id: &str) -> Self {
        self.spec
            .connectors
            .push(ConnectorSpec::destination(id, format!("{id}-resource"), "s3"));
        self
    }

    /// Adds a function.
    #[must_use]
    pub fn with_function(mut self, id: &str, name: &str) -> Self {
        self.spec.functions.push(FunctionSpec::new(id, name));
        self
    }

    /// Adds a stream.
    #[must_use]
    pub fn with_stream(mut self, from: &str, to: &str) -> Self {
        let id = format!("T{}", self.spec.streams.len() + 1);
        self.spec.streams.push(StreamSpec::new(id, from, to));
        self
    }

    /// Sets the image of every function added so far.
    #[must_use]
    pub fn with_image(mut self, image: &str) -> Self {
        for function in &mut self.spec.functions {
            function.image = image.to_string();
        }
        self
    }

    /// Overrides the declared spec version.
    #[must_use]
    pub fn with_spec_version(mut self, version: &str) -> Self {
        self.spec.definition.metadata.spec_version = version.to_string();
        self
    }

    /// Returns the document.
    #[must_use]
    pub fn build(self) -> DeploymentSpec {
        self.spec
    }
}
