//! The deployment spec document and schema versioning.

mod model;
mod version;

pub use model::{
    ConnectorSpec, DefinitionSpec, DeploymentSpec, FunctionSpec, Language, MetadataSpec,
    PluginType, StreamSpec, TurbineSpec,
};
pub use version::{
    is_supported_spec_version, validate_spec_version, LATEST_SPEC_VERSION, SPEC_VERSION_V3,
    SUPPORTED_SPEC_VERSIONS,
};
