//! Request and response types for the session call surface.

use crate::errors::{Result, SpecError};
use crate::spec::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SpecError::InvalidRequest { field });
    }
    Ok(())
}

/// Starts a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    /// Application name.
    pub app_name: String,
    /// Commit the pipeline program was built from.
    pub git_sha: String,
    /// Language of the pipeline program.
    pub language: Language,
    /// Version of the pipeline library.
    pub turbine_version: String,
}

impl InitRequest {
    /// Creates an init request.
    #[must_use]
    pub fn new(
        app_name: impl Into<String>,
        git_sha: impl Into<String>,
        language: Language,
        turbine_version: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            git_sha: git_sha.into(),
            language,
            turbine_version: turbine_version.into(),
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidRequest`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        require(&self.app_name, "app_name")?;
        require(&self.git_sha, "git_sha")?;
        require(&self.turbine_version, "turbine_version")
    }
}

/// Plugin selection for a connector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Plugin {
    /// Plugin name.
    pub name: String,
    /// Plugin settings.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

impl Plugin {
    /// Creates a plugin with no settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: BTreeMap::new(),
        }
    }

    /// Adds a setting.
    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// Adds a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRequest {
    /// Resource name.
    pub name: String,
    /// Plugin selection.
    pub plugin: Plugin,
}

impl ConnectorRequest {
    /// Creates a connector request.
    #[must_use]
    pub fn new(name: impl Into<String>, plugin: Plugin) -> Self {
        Self {
            name: name.into(),
            plugin,
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidRequest`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        require(&self.plugin.name, "plugin.name")
    }
}

/// Reference to the stream a program is currently holding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRef {
    /// Id of the vertex that produces the stream.
    pub stream_name: String,
}

impl StreamRef {
    /// Creates a stream reference.
    #[must_use]
    pub fn new(stream_name: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidRequest`] if the stream name is empty.
    pub fn validate(&self) -> Result<()> {
        require(&self.stream_name, "stream_name")
    }
}

/// Adds a function fed by the given stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Function name.
    pub name: String,
    /// The stream feeding the function.
    pub stream: StreamRef,
}

impl ProcessRequest {
    /// Creates a process request.
    #[must_use]
    pub fn new(name: impl Into<String>, stream: StreamRef) -> Self {
        Self {
            name: name.into(),
            stream,
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidRequest`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        require(&self.name, "name")?;
        self.stream.validate()
    }
}

/// Writes a stream into a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// The stream being written.
    pub stream: StreamRef,
    /// Id returned by `add_destination`.
    pub destination_id: String,
}

impl WriteRequest {
    /// Creates a write request.
    #[must_use]
    pub fn new(stream: StreamRef, destination_id: impl Into<String>) -> Self {
        Self {
            stream,
            destination_id: destination_id.into(),
        }
    }

    /// Checks required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidRequest`] naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        self.stream.validate()?;
        require(&self.destination_id, "destination_id")
    }
}
