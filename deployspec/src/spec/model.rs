//! The deployment spec document and its entities.

use super::version::LATEST_SPEC_VERSION;
use crate::errors::SpecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The direction of a connector plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginType {
    /// Reads records into the pipeline.
    Source,
    /// Writes records out of the pipeline.
    Destination,
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

/// Language the pipeline program is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Go.
    #[default]
    Golang,
    /// JavaScript.
    Javascript,
    /// Python.
    Python,
    /// Ruby.
    Ruby,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Golang => write!(f, "golang"),
            Self::Javascript => write!(f, "javascript"),
            Self::Python => write!(f, "python"),
            Self::Ruby => write!(f, "ruby"),
        }
    }
}

impl FromStr for Language {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "golang" | "go" => Ok(Self::Golang),
            "javascript" | "js" => Ok(Self::Javascript),
            "python" | "py" => Ok(Self::Python),
            "ruby" | "rb" => Ok(Self::Ruby),
            _ => Err(SpecError::UnknownLanguage {
                language: s.to_string(),
            }),
        }
    }
}

/// A source or destination connector. Connectors are graph vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Unique vertex id.
    pub uuid: String,
    /// Resource name chosen by the pipeline author.
    pub name: String,
    /// Whether this connector reads or writes.
    pub plugin_type: PluginType,
    /// Name of the plugin that provisions the connector.
    pub plugin_name: String,
    /// Plugin settings, omitted from the document when empty.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_config: BTreeMap<String, String>,
}

impl ConnectorSpec {
    /// Creates a connector with an empty plugin configuration.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        plugin_type: PluginType,
        plugin_name: impl Into<String>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            plugin_type,
            plugin_name: plugin_name.into(),
            plugin_config: BTreeMap::new(),
        }
    }

    /// Creates a source connector.
    #[must_use]
    pub fn source(
        uuid: impl Into<String>,
        name: impl Into<String>,
        plugin_name: impl Into<String>,
    ) -> Self {
        Self::new(uuid, name, PluginType::Source, plugin_name)
    }

    /// Creates a destination connector.
    #[must_use]
    pub fn destination(
        uuid: impl Into<String>,
        name: impl Into<String>,
        plugin_name: impl Into<String>,
    ) -> Self {
        Self::new(uuid, name, PluginType::Destination, plugin_name)
    }

    /// Replaces the plugin configuration.
    #[must_use]
    pub fn with_config(mut self, config: impl IntoIterator<Item = (String, String)>) -> Self {
        self.plugin_config = config.into_iter().collect();
        self
    }

    /// Adds one plugin configuration entry.
    #[must_use]
    pub fn with_config_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.plugin_config.insert(key.into(), value.into());
        self
    }

    /// Returns true for source connectors.
    #[must_use]
    pub fn is_source(&self) -> bool {
        self.plugin_type == PluginType::Source
    }
}

/// A transformation stage. Functions are graph vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Unique vertex id.
    pub uuid: String,
    /// Function name.
    pub name: String,
    /// Container image, empty until the image has been built.
    #[serde(default)]
    pub image: String,
}

impl FunctionSpec {
    /// Creates a function without an image.
    #[must_use]
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            image: String::new(),
        }
    }

    /// Sets the image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }
}

/// A directed edge between two vertices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSpec {
    /// Unique stream id.
    pub uuid: String,
    /// Stream name.
    pub name: String,
    /// Upstream vertex id.
    pub from_uuid: String,
    /// Downstream vertex id.
    pub to_uuid: String,
}

impl StreamSpec {
    /// Creates a stream named `{from}_{to}`.
    #[must_use]
    pub fn new(
        uuid: impl Into<String>,
        from_uuid: impl Into<String>,
        to_uuid: impl Into<String>,
    ) -> Self {
        let from_uuid = from_uuid.into();
        let to_uuid = to_uuid.into();
        Self {
            uuid: uuid.into(),
            name: format!("{from_uuid}_{to_uuid}"),
            from_uuid,
            to_uuid,
        }
    }

    /// Overrides the stream name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Tooling that produced the spec.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurbineSpec {
    /// Language of the pipeline program.
    pub language: Language,
    /// Version of the pipeline library.
    pub version: String,
}

/// Spec metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetadataSpec {
    /// Tooling information.
    pub turbine: TurbineSpec,
    /// Schema version of this document.
    pub spec_version: String,
}

/// Provenance of the spec. Set once when the session starts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefinitionSpec {
    /// Commit the pipeline program was built from.
    pub git_sha: String,
    /// Tooling and schema metadata.
    pub metadata: MetadataSpec,
}

impl DefinitionSpec {
    /// Creates a definition stamped with the latest spec version.
    #[must_use]
    pub fn new(git_sha: impl Into<String>, language: Language, version: impl Into<String>) -> Self {
        Self {
            git_sha: git_sha.into(),
            metadata: MetadataSpec {
                turbine: TurbineSpec {
                    language,
                    version: version.into(),
                },
                spec_version: LATEST_SPEC_VERSION.to_string(),
            },
        }
    }

    /// Overrides the spec version.
    #[must_use]
    pub fn with_spec_version(mut self, spec_version: impl Into<String>) -> Self {
        self.metadata.spec_version = spec_version.into();
        self
    }
}

/// The deployment spec: the artifact handed to the deployment engine.
///
/// Field order here is the field order of the serialized document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Source and destination connectors.
    #[serde(default)]
    pub connectors: Vec<ConnectorSpec>,
    /// Transformation stages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<FunctionSpec>,
    /// Streams between vertices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub streams: Vec<StreamSpec>,
    /// Provenance and schema version.
    #[serde(default)]
    pub definition: DefinitionSpec,
}

impl DeploymentSpec {
    /// Creates an empty spec.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the declared spec version.
    #[must_use]
    pub fn spec_version(&self) -> &str {
        &self.definition.metadata.spec_version
    }

    /// Returns the first source connector, if any.
    #[must_use]
    pub fn source(&self) -> Option<&ConnectorSpec> {
        self.sources().next()
    }

    /// Iterates over source connectors.
    pub fn sources(&self) -> impl Iterator<Item = &ConnectorSpec> {
        self.connectors.iter().filter(|c| c.is_source())
    }

    /// Iterates over destination connectors.
    pub fn destinations(&self) -> impl Iterator<Item = &ConnectorSpec> {
        self.connectors.iter().filter(|c| !c.is_source())
    }

    /// Looks up a connector by id.
    #[must_use]
    pub fn connector(&self, uuid: &str) -> Option<&ConnectorSpec> {
        self.connectors.iter().find(|c| c.uuid == uuid)
    }

    /// Looks up a function by id.
    #[must_use]
    pub fn function(&self, uuid: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.uuid == uuid)
    }

    /// Vertex ids in document order: connectors first, then functions.
    pub fn vertex_ids(&self) -> impl Iterator<Item = &str> {
        self.connectors
            .iter()
            .map(|c| c.uuid.as_str())
            .chain(self.functions.iter().map(|f| f.uuid.as_str()))
    }

    /// Returns true if nothing has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty() && self.functions.is_empty() && self.streams.is_empty()
    }
}
