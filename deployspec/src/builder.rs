//! Spec builder: the only mutation surface for a deployment spec.

use crate::codec::{encode, SerializedSpec};
use crate::dag::{link_stream, validate_dag, SpecGraph};
use crate::errors::{EndpointSide, Result, SpecError};
use crate::spec::{
    validate_spec_version, ConnectorSpec, DefinitionSpec, DeploymentSpec, FunctionSpec,
    PluginType, StreamSpec,
};
use parking_lot::Mutex;
use std::fmt;
use tracing::{debug, info, warn};

/// Lifecycle of a builder. There is no way back to `Building`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderState {
    /// Accepting mutations.
    Building,
    /// The DAG validator and version check passed.
    Validated,
    /// The artifact has been produced. Terminal.
    Serialized,
}

impl fmt::Display for BuilderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Building => write!(f, "building"),
            Self::Validated => write!(f, "validated"),
            Self::Serialized => write!(f, "serialized"),
        }
    }
}

#[derive(Debug)]
struct BuilderInner {
    spec: DeploymentSpec,
    graph: SpecGraph,
    state: BuilderState,
    definition_set: bool,
}

impl BuilderInner {
    fn ensure_building(&self) -> Result<()> {
        match self.state {
            BuilderState::Building => Ok(()),
            BuilderState::Validated | BuilderState::Serialized => Err(SpecError::Finalized),
        }
    }

    fn add_connector(&mut self, connector: ConnectorSpec, expected: PluginType) -> Result<()> {
        self.ensure_building()?;

        if connector.plugin_type != expected {
            return Err(SpecError::WrongDirection {
                id: connector.uuid,
                expected,
                actual: connector.plugin_type,
            });
        }

        if expected == PluginType::Source {
            if let Some(existing) = self.spec.source() {
                return Err(SpecError::MultipleSources {
                    ids: vec![existing.uuid.clone(), connector.uuid],
                });
            }
        }

        self.graph.add_vertex(connector.uuid.as_str())?;
        debug!(
            id = %connector.uuid,
            name = %connector.name,
            plugin = %connector.plugin_name,
            direction = %connector.plugin_type,
            "Added connector"
        );
        self.spec.connectors.push(connector);
        Ok(())
    }

    fn add_function(&mut self, function: FunctionSpec) -> Result<()> {
        self.ensure_building()?;
        self.graph.add_vertex(function.uuid.as_str())?;
        debug!(id = %function.uuid, name = %function.name, "Added function");
        self.spec.functions.push(function);
        Ok(())
    }

    fn add_stream(&mut self, stream: StreamSpec) -> Result<()> {
        self.ensure_building()?;
        link_stream(&mut self.graph, &stream)?;
        debug!(
            id = %stream.uuid,
            from = %stream.from_uuid,
            to = %stream.to_uuid,
            "Added stream"
        );
        self.spec.streams.push(stream);
        Ok(())
    }

    fn add_function_from(
        &mut self,
        function: FunctionSpec,
        stream_id: String,
        from_uuid: String,
    ) -> Result<()> {
        self.ensure_building()?;
        if !self.graph.contains(&from_uuid) {
            return Err(SpecError::MissingEndpoint {
                side: EndpointSide::From,
                id: from_uuid,
            });
        }
        let stream = StreamSpec::new(stream_id, from_uuid, function.uuid.as_str());
        self.add_function(function)?;
        self.add_stream(stream)
    }

    fn set_definition(&mut self, definition: DefinitionSpec) -> Result<()> {
        self.ensure_building()?;
        if self.definition_set {
            return Err(SpecError::AlreadyInitialized);
        }

        debug!(
            git_sha = %definition.git_sha,
            language = %definition.metadata.turbine.language,
            spec_version = %definition.metadata.spec_version,
            "Set spec definition"
        );
        self.spec.definition = definition;
        self.definition_set = true;
        Ok(())
    }

    fn set_function_images(&mut self, image: &str) -> Result<()> {
        self.ensure_building()?;
        match (image.is_empty(), self.spec.functions.is_empty()) {
            (true, false) => return Err(SpecError::EmptyImage),
            (false, true) => {
                return Err(SpecError::ImageWithoutFunctions {
                    image: image.to_string(),
                })
            }
            (true, true) => return Ok(()),
            (false, false) => {}
        }

        for function in &mut self.spec.functions {
            function.image = image.to_string();
        }
        debug!(image, count = self.spec.functions.len(), "Set function images");
        Ok(())
    }

    fn validate(&self) -> Result<SpecGraph> {
        let graph = validate_dag(&self.spec)?;
        validate_spec_version(self.spec.spec_version())?;
        Ok(graph)
    }

    fn finalize(&mut self) -> Result<SerializedSpec> {
        match self.state {
            BuilderState::Building => {
                self.validate()?;
                self.state = BuilderState::Validated;
            }
            // A previous encode failed; the document is already frozen.
            BuilderState::Validated => {}
            BuilderState::Serialized => return Err(SpecError::Finalized),
        }

        let serialized = SerializedSpec::from_bytes(encode(&self.spec)?);
        self.state = BuilderState::Serialized;
        info!(
            connectors = self.spec.connectors.len(),
            functions = self.spec.functions.len(),
            streams = self.spec.streams.len(),
            bytes = serialized.len(),
            digest = %serialized.digest(),
            "Finalized deployment spec"
        );
        Ok(serialized)
    }

    fn finalize_with_image(&mut self, image: &str) -> Result<SerializedSpec> {
        if self.state != BuilderState::Building {
            return self.finalize();
        }

        let previous: Vec<String> = self.spec.functions.iter().map(|f| f.image.clone()).collect();
        self.set_function_images(image)?;
        match self.finalize() {
            Ok(serialized) => Ok(serialized),
            Err(err) => {
                if self.state == BuilderState::Building {
                    for (function, image) in self.spec.functions.iter_mut().zip(previous) {
                        function.image = image;
                    }
                }
                Err(err)
            }
        }
    }
}

/// Incrementally assembles a [`DeploymentSpec`].
///
/// The flat document and the graph store live behind one mutex, and every
/// operation, read or write, holds it for its whole body. A failed mutation
/// leaves both unchanged.
pub struct SpecBuilder {
    inner: Mutex<BuilderInner>,
}

impl Default for SpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SpecBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SpecBuilder")
            .field("state", &inner.state)
            .field("connectors", &inner.spec.connectors.len())
            .field("functions", &inner.spec.functions.len())
            .field("streams", &inner.spec.streams.len())
            .finish()
    }
}

impl SpecBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BuilderInner {
                spec: DeploymentSpec::default(),
                graph: SpecGraph::new(),
                state: BuilderState::Building,
                definition_set: false,
            }),
        }
    }

    /// Sets the definition. Allowed once.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::AlreadyInitialized`] on a second call.
    pub fn set_definition(&self, definition: DefinitionSpec) -> Result<()> {
        self.inner
            .lock()
            .set_definition(definition)
            .map_err(|e| rejected("set_definition", e))
    }

    /// Adds the single source connector.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::WrongDirection`] for a destination connector,
    /// [`SpecError::MultipleSources`] if a source exists, and
    /// [`SpecError::DuplicateVertex`] if the id is taken.
    pub fn add_source(&self, connector: ConnectorSpec) -> Result<()> {
        self.inner
            .lock()
            .add_connector(connector, PluginType::Source)
            .map_err(|e| rejected("add_source", e))
    }

    /// Adds a destination connector.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::WrongDirection`] for a source connector and
    /// [`SpecError::DuplicateVertex`] if the id is taken.
    pub fn add_destination(&self, connector: ConnectorSpec) -> Result<()> {
        self.inner
            .lock()
            .add_connector(connector, PluginType::Destination)
            .map_err(|e| rejected("add_destination", e))
    }

    /// Adds a function.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::DuplicateVertex`] if the id is taken.
    pub fn add_function(&self, function: FunctionSpec) -> Result<()> {
        self.inner
            .lock()
            .add_function(function)
            .map_err(|e| rejected("add_function", e))
    }

    /// Adds a function together with a stream `from_uuid -> function`,
    /// atomically.
    ///
    /// The upstream vertex is checked before anything is inserted, so a
    /// dangling `from_uuid` leaves no orphan function behind.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingEndpoint`] if `from_uuid` is unknown and
    /// [`SpecError::DuplicateVertex`] if the function id is taken.
    pub fn add_function_from(
        &self,
        function: FunctionSpec,
        stream_id: impl Into<String>,
        from_uuid: impl Into<String>,
    ) -> Result<()> {
        self.inner
            .lock()
            .add_function_from(function, stream_id.into(), from_uuid.into())
            .map_err(|e| rejected("add_function_from", e))
    }

    /// Adds a stream between two existing vertices.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::MissingEndpoint`] if either end is not a vertex,
    /// [`SpecError::DuplicateEdge`] if the two vertices are already wired,
    /// and [`SpecError::CycleDetected`] if the stream would close a cycle.
    pub fn add_stream(&self, stream: StreamSpec) -> Result<()> {
        self.inner
            .lock()
            .add_stream(stream)
            .map_err(|e| rejected("add_stream", e))
    }

    /// Sets the image of every function.
    ///
    /// An empty image with no functions is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::EmptyImage`] if functions exist and `image` is
    /// empty, and [`SpecError::ImageWithoutFunctions`] if `image` is set but
    /// no functions exist.
    pub fn set_function_images(&self, image: &str) -> Result<()> {
        self.inner
            .lock()
            .set_function_images(image)
            .map_err(|e| rejected("set_function_images", e))
    }

    /// Runs the DAG validator and version check against the current document.
    ///
    /// Does not change the builder state.
    ///
    /// # Errors
    ///
    /// Returns the first structural or version error.
    pub fn validate(&self) -> Result<SpecGraph> {
        self.inner.lock().validate()
    }

    /// Validates and serializes the spec. Allowed once per builder.
    ///
    /// If validation fails the builder stays in `Building`. If encoding fails
    /// it stays in `Validated`, and the next call retries encoding only.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Finalized`] on a second call, or the first
    /// validation or serialization error.
    pub fn finalize(&self) -> Result<SerializedSpec> {
        self.inner
            .lock()
            .finalize()
            .map_err(|e| rejected("finalize", e))
    }

    /// Sets every function's image, then validates and serializes, all under
    /// one lock acquisition.
    ///
    /// If validation fails the previous images are restored and the builder
    /// stays in `Building`.
    ///
    /// # Errors
    ///
    /// Returns the image-assignment error of [`Self::set_function_images`] or
    /// any error of [`Self::finalize`].
    pub fn finalize_with_image(&self, image: &str) -> Result<SerializedSpec> {
        self.inner
            .lock()
            .finalize_with_image(image)
            .map_err(|e| rejected("finalize_with_image", e))
    }

    /// Returns a copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> DeploymentSpec {
        self.inner.lock().spec.clone()
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> BuilderState {
        self.inner.lock().state
    }

    /// Returns the source connector id, if one was added.
    #[must_use]
    pub fn source_id(&self) -> Option<String> {
        self.inner.lock().spec.source().map(|c| c.uuid.clone())
    }

    /// Returns true if `id` is a registered vertex.
    #[must_use]
    pub fn contains_vertex(&self, id: &str) -> bool {
        self.inner.lock().graph.contains(id)
    }

    /// Returns the number of registered vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.inner.lock().graph.vertex_count()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.inner.lock().graph.edge_count()
    }
}

fn rejected(operation: &'static str, err: SpecError) -> SpecError {
    warn!(operation, code = err.code(), error = %err, "Rejected spec mutation");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Language;
    use pretty_assertions::assert_eq;

    fn definition() -> DefinitionSpec {
        DefinitionSpec::new("deadbeef", Language::Golang, "0.1.0")
    }

    fn wired_builder() -> SpecBuilder {
        let builder = SpecBuilder::new();
        builder.set_definition(definition()).unwrap();
        builder
            .add_source(ConnectorSpec::source("s", "pg", "postgres"))
            .unwrap();
        builder
            .add_destination(ConnectorSpec::destination("d", "s3", "s3"))
            .unwrap();
        builder.add_stream(StreamSpec::new("t1", "s", "d")).unwrap();
        builder
    }

    #[test]
    fn test_builder_creation() {
        let builder = SpecBuilder::new();
        assert_eq!(builder.state(), BuilderState::Building);
        assert_eq!(builder.vertex_count(), 0);
        assert!(builder.snapshot().is_empty());
    }

    #[test]
    fn test_second_source_rejected() {
        let builder = SpecBuilder::new();
        builder
            .add_source(ConnectorSpec::source("s1", "pg", "postgres"))
            .unwrap();
        let err = builder
            .add_source(ConnectorSpec::source("s2", "pg2", "postgres"))
            .unwrap_err();

        match err {
            SpecError::MultipleSources { ids } => assert_eq!(ids, vec!["s1", "s2"]),
            other => panic!("unexpected error: {other}"),
        }
        let spec = builder.snapshot();
        assert_eq!(spec.sources().count(), 1);
        assert_eq!(spec.connectors[0].uuid, "s1");
        assert!(!builder.contains_vertex("s2"));
    }

    #[test]
    fn test_wrong_direction() {
        let builder = SpecBuilder::new();
        let err = builder
            .add_source(ConnectorSpec::destination("d", "s3", "s3"))
            .unwrap_err();
        assert_eq!(err.code(), "SPEC-009-WRONG_DIRECTION");

        let err = builder
            .add_destination(ConnectorSpec::source("s", "pg", "postgres"))
            .unwrap_err();
        assert_eq!(err.code(), "SPEC-009-WRONG_DIRECTION");
        assert!(builder.snapshot().is_empty());
    }

    #[test]
    fn test_duplicate_id_leaves_document_unchanged() {
        let builder = SpecBuilder::new();
        builder
            .add_source(ConnectorSpec::source("x", "pg", "postgres"))
            .unwrap();
        let err = builder.add_function(FunctionSpec::new("x", "f")).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateVertex { .. }));
        assert!(builder.snapshot().functions.is_empty());
    }

    #[test]
    fn test_dangling_stream_rejected() {
        let builder = SpecBuilder::new();
        let err = builder
            .add_stream(StreamSpec::new("t", "nonexistent-1", "nonexistent-2"))
            .unwrap_err();
        assert!(matches!(
            err,
            SpecError::MissingEndpoint { side: EndpointSide::From, ref id } if id == "nonexistent-1"
        ));
        assert!(builder.snapshot().is_empty());
        assert_eq!(builder.edge_count(), 0);
    }

    #[test]
    fn test_cycle_rejected_document_unchanged() {
        let builder = wired_builder();
        builder.add_function(FunctionSpec::new("f", "fn")).unwrap();
        builder.add_stream(StreamSpec::new("t2", "d", "f")).unwrap();

        let before = builder.snapshot();
        let err = builder.add_stream(StreamSpec::new("t3", "f", "d")).unwrap_err();
        assert_eq!(err.code(), "SPEC-004-CYCLE");
        assert_eq!(builder.snapshot(), before);
        assert_eq!(builder.edge_count(), 2);
    }

    #[test]
    fn test_add_function_from_is_atomic() {
        let builder = wired_builder();
        let err = builder
            .add_function_from(FunctionSpec::new("f", "fn"), "t", "ghost")
            .unwrap_err();
        assert!(matches!(err, SpecError::MissingEndpoint { side: EndpointSide::From, .. }));
        assert!(!builder.contains_vertex("f"));

        builder
            .add_function_from(FunctionSpec::new("f", "fn"), "t", "s")
            .unwrap();
        assert!(builder.contains_vertex("f"));
        assert_eq!(builder.edge_count(), 2);

        let stream = builder.snapshot().streams.pop().unwrap();
        assert_eq!(stream.from_uuid, "s");
        assert_eq!(stream.to_uuid, "f");
        assert_eq!(stream.name, "s_f");
    }

    #[test]
    fn test_add_function_from_taken_id_adds_nothing() {
        let builder = wired_builder();
        let err = builder
            .add_function_from(FunctionSpec::new("d", "fn"), "t", "s")
            .unwrap_err();
        assert!(matches!(err, SpecError::DuplicateVertex { .. }));
        assert!(builder.snapshot().functions.is_empty());
        assert_eq!(builder.edge_count(), 1);
    }

    #[test]
    fn test_repeated_stream_leaves_document_unchanged() {
        let builder = wired_builder();
        let before = builder.snapshot();

        let err = builder.add_stream(StreamSpec::new("t2", "s", "d")).unwrap_err();
        assert_eq!(err.code(), "SPEC-010-DUPLICATE_EDGE");
        assert_eq!(builder.snapshot(), before);
        assert_eq!(builder.snapshot().streams.len(), builder.edge_count());
    }

    #[test]
    fn test_set_function_images() {
        let builder = wired_builder();
        assert!(matches!(
            builder.set_function_images("img:1").unwrap_err(),
            SpecError::ImageWithoutFunctions { .. }
        ));
        builder.set_function_images("").unwrap();

        builder.add_function(FunctionSpec::new("f1", "a")).unwrap();
        builder.add_function(FunctionSpec::new("f2", "b")).unwrap();
        assert!(matches!(
            builder.set_function_images("").unwrap_err(),
            SpecError::EmptyImage
        ));

        builder.set_function_images("img:2").unwrap();
        assert!(builder
            .snapshot()
            .functions
            .iter()
            .all(|f| f.image == "img:2"));
    }

    #[test]
    fn test_definition_set_once() {
        let builder = SpecBuilder::new();
        builder.set_definition(definition()).unwrap();
        let err = builder.set_definition(definition()).unwrap_err();
        assert!(matches!(err, SpecError::AlreadyInitialized));
    }

    #[test]
    fn test_finalize_once() {
        let builder = wired_builder();
        let serialized = builder.finalize().unwrap();
        assert_eq!(builder.state(), BuilderState::Serialized);
        assert_eq!(serialized.to_spec().unwrap(), builder.snapshot());

        assert!(matches!(builder.finalize().unwrap_err(), SpecError::Finalized));
        let err = builder
            .add_destination(ConnectorSpec::destination("d2", "s3", "s3"))
            .unwrap_err();
        assert!(matches!(err, SpecError::Finalized));
    }

    #[test]
    fn test_failed_finalize_stays_building() {
        let builder = SpecBuilder::new();
        builder.set_definition(definition()).unwrap();
        builder
            .add_source(ConnectorSpec::source("s", "pg", "postgres"))
            .unwrap();
        builder
            .add_destination(ConnectorSpec::destination("d", "s3", "s3"))
            .unwrap();

        assert!(matches!(builder.finalize().unwrap_err(), SpecError::EmptyGraph));
        assert_eq!(builder.state(), BuilderState::Building);

        builder.add_stream(StreamSpec::new("t", "s", "d")).unwrap();
        builder.finalize().unwrap();
    }

    #[test]
    fn test_finalize_with_image_stamps_functions() {
        let builder = SpecBuilder::new();
        builder.set_definition(definition()).unwrap();
        builder
            .add_source(ConnectorSpec::source("s", "pg", "postgres"))
            .unwrap();
        builder
            .add_function_from(FunctionSpec::new("f", "fn"), "t1", "s")
            .unwrap();

        let spec = builder.finalize_with_image("img:1").unwrap().to_spec().unwrap();
        assert_eq!(spec.functions[0].image, "img:1");
        assert_eq!(builder.state(), BuilderState::Serialized);
    }

    #[test]
    fn test_failed_finalize_with_image_restores_images() {
        let builder = SpecBuilder::new();
        builder
            .set_definition(definition().with_spec_version("v9"))
            .unwrap();
        builder
            .add_source(ConnectorSpec::source("s", "pg", "postgres"))
            .unwrap();
        builder
            .add_function_from(FunctionSpec::new("f", "fn"), "t1", "s")
            .unwrap();
        let before = builder.snapshot();

        let err = builder.finalize_with_image("img:1").unwrap_err();
        assert_eq!(err.code(), "SPEC-101-UNSUPPORTED_VERSION");
        assert_eq!(builder.snapshot(), before);
        assert_eq!(builder.state(), BuilderState::Building);
    }

    #[test]
    fn test_finalize_resumes_from_validated() {
        let builder = wired_builder();
        builder.inner.lock().state = BuilderState::Validated;

        let err = builder
            .add_destination(ConnectorSpec::destination("d2", "s3", "s3"))
            .unwrap_err();
        assert!(matches!(err, SpecError::Finalized));

        builder.finalize().unwrap();
        assert_eq!(builder.state(), BuilderState::Serialized);
    }

    #[test]
    fn test_validate_does_not_finalize() {
        let builder = wired_builder();
        let graph = builder.validate().unwrap();
        assert_eq!(graph.roots(), vec!["s"]);
        assert_eq!(builder.state(), BuilderState::Building);
    }

    #[test]
    fn test_builder_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpecBuilder>();
    }
}
