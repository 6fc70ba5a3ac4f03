//! One spec-building session, driven call by call by a pipeline program.

use super::requests::{ConnectorRequest, InitRequest, ProcessRequest, StreamRef, WriteRequest};
use crate::builder::{BuilderState, SpecBuilder};
use crate::codec::SerializedSpec;
use crate::config::SpecConfig;
use crate::errors::Result;
use crate::ids::{IdGenerator, IdKind};
use crate::spec::{ConnectorSpec, DefinitionSpec, DeploymentSpec, FunctionSpec, StreamSpec};
use parking_lot::RwLock;
use tracing::{debug, info};

/// The call surface a pipeline program uses to describe its pipeline.
///
/// A session owns one [`SpecBuilder`] and is the only carrier of state for
/// one deployment. It is `Send + Sync`, so concurrent handlers may share it.
#[derive(Debug)]
pub struct SpecSession {
    builder: SpecBuilder,
    ids: Box<dyn IdGenerator>,
    config: SpecConfig,
    app_name: RwLock<Option<String>>,
}

impl Default for SpecSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SpecSession {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SpecConfig::default())
    }

    /// Creates a session from a configuration.
    #[must_use]
    pub fn with_config(config: SpecConfig) -> Self {
        let ids = config.id_strategy.generator();
        Self::with_id_generator(config, ids)
    }

    /// Creates a session with an explicit id generator.
    #[must_use]
    pub fn with_id_generator(config: SpecConfig, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            builder: SpecBuilder::new(),
            ids,
            config,
            app_name: RwLock::new(None),
        }
    }

    /// Stamps the definition. Allowed once.
    ///
    /// # Errors
    ///
    /// Fails on missing fields or a second call.
    pub fn init(&self, req: InitRequest) -> Result<()> {
        req.validate()?;

        let definition = DefinitionSpec::new(req.git_sha, req.language, req.turbine_version)
            .with_spec_version(self.config.spec_version.clone());
        self.builder.set_definition(definition)?;

        info!(app = %req.app_name, language = %req.language, "Started spec session");
        *self.app_name.write() = Some(req.app_name);
        Ok(())
    }

    /// Adds the source connector and returns its id.
    ///
    /// The id doubles as the stream reference of the records it reads.
    ///
    /// # Errors
    ///
    /// Fails on missing fields or if a source already exists.
    pub fn add_source(&self, req: ConnectorRequest) -> Result<String> {
        req.validate()?;
        let id = self.ids.next_id(IdKind::Source);
        let connector =
            ConnectorSpec::source(&id, req.name, req.plugin.name).with_config(req.plugin.config);
        self.builder.add_source(connector)?;
        Ok(id)
    }

    /// Returns the stream reference for records read from a source.
    ///
    /// Reading records does not change the spec.
    ///
    /// # Errors
    ///
    /// Fails if the stream name is empty.
    pub fn read_records(&self, source_stream: &str) -> Result<StreamRef> {
        let stream = StreamRef::new(source_stream);
        stream.validate()?;
        debug!(stream = %stream.stream_name, "Read records");
        Ok(stream)
    }

    /// Adds a function fed by the request's stream and returns the stream
    /// reference of its output.
    ///
    /// # Errors
    ///
    /// Fails on missing fields or if the input stream is not a known vertex.
    pub fn process_records(&self, req: ProcessRequest) -> Result<StreamRef> {
        req.validate()?;
        let name = if self.config.lowercase_function_names {
            req.name.to_lowercase()
        } else {
            req.name
        };

        let function = FunctionSpec::new(self.ids.next_id(IdKind::Function), name);
        let output = StreamRef::new(function.uuid.as_str());
        self.builder.add_function_from(
            function,
            self.ids.next_id(IdKind::Stream),
            req.stream.stream_name,
        )?;
        Ok(output)
    }

    /// Adds a destination connector and returns its id.
    ///
    /// # Errors
    ///
    /// Fails on missing fields.
    pub fn add_destination(&self, req: ConnectorRequest) -> Result<String> {
        req.validate()?;
        let id = self.ids.next_id(IdKind::Destination);
        let connector = ConnectorSpec::destination(&id, req.name, req.plugin.name)
            .with_config(req.plugin.config);
        self.builder.add_destination(connector)?;
        Ok(id)
    }

    /// Wires a stream into a destination.
    ///
    /// # Errors
    ///
    /// Fails on missing fields, unknown endpoints, repeated streams or cycles.
    pub fn write_records(&self, req: WriteRequest) -> Result<()> {
        req.validate()?;
        self.add_stream(&req.stream.stream_name, &req.destination_id)
            .map(|_| ())
    }

    /// Adds a stream between two vertices and returns its id.
    ///
    /// # Errors
    ///
    /// Fails on unknown endpoints, repeated streams or cycles.
    pub fn add_stream(&self, from: &str, to: &str) -> Result<String> {
        let id = self.ids.next_id(IdKind::Stream);
        self.builder.add_stream(StreamSpec::new(&id, from, to))?;
        Ok(id)
    }

    /// Assigns `image` to every function, then validates and serializes the
    /// spec. Ends the session.
    ///
    /// Concurrent mutations cannot land between the image assignment and the
    /// serialization. A failed call leaves the spec unchanged.
    ///
    /// # Errors
    ///
    /// Fails on image-assignment, structural, version or lifecycle errors.
    pub fn get_spec(&self, image: &str) -> Result<SerializedSpec> {
        self.builder.finalize_with_image(image)
    }

    /// Returns a copy of the spec built so far.
    #[must_use]
    pub fn spec(&self) -> DeploymentSpec {
        self.builder.snapshot()
    }

    /// Returns the builder lifecycle state.
    #[must_use]
    pub fn state(&self) -> BuilderState {
        self.builder.state()
    }

    /// Returns the application name given at init.
    #[must_use]
    pub fn app_name(&self) -> Option<String> {
        self.app_name.read().clone()
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SpecConfig {
        &self.config
    }
}
