//! # Deployspec
//!
//! Builds and validates the deployment spec of a streaming data pipeline.
//!
//! A pipeline program describes its pipeline through a [`session::SpecSession`]:
//! one source connector, any number of functions, one or more destination
//! connectors, and the streams between them. The session assembles a
//! [`spec::DeploymentSpec`], checks that it forms a single-source DAG, and
//! serializes it into the artifact the deployment platform consumes.
//!
//! - **Incremental building**: every mutation is checked as it happens and a
//!   rejected mutation leaves the spec unchanged
//! - **DAG validation**: single source, no cycles, no dangling streams
//! - **Fail-closed codec**: only valid specs with a supported version encode
//!
//! ## Quick Start
//!
//! ```rust
//! use deployspec::prelude::*;
//!
//! # fn main() -> deployspec::errors::Result<()> {
//! let session = SpecSession::new();
//! session.init(InitRequest::new("orders", "3f2a9c1d", Language::Golang, "0.1.0"))?;
//!
//! let source = session.add_source(ConnectorRequest::new("pg", Plugin::new("postgres")))?;
//! let records = session.read_records(&source)?;
//! let processed = session.process_records(ProcessRequest::new("anonymize", records))?;
//! let dest = session.add_destination(ConnectorRequest::new("s3", Plugin::new("s3")))?;
//! session.write_records(WriteRequest::new(processed, dest))?;
//!
//! let artifact = session.get_spec("registry.local/orders:latest")?;
//! assert_eq!(artifact.digest().len(), 64);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod builder;
pub mod codec;
pub mod config;
pub mod dag;
pub mod errors;
pub mod ids;
pub mod logging;
pub mod session;
pub mod spec;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::{BuilderState, SpecBuilder};
    pub use crate::codec::{marshal, unmarshal, SerializedSpec};
    pub use crate::config::SpecConfig;
    pub use crate::dag::{validate_dag, SpecGraph};
    pub use crate::errors::{CycleDetectedError, ErrorInfo, SpecError};
    pub use crate::ids::{IdGenerator, IdKind, IdStrategy};
    pub use crate::logging::{init_tracing, LoggingConfig};
    pub use crate::session::{
        ConnectorRequest, InitRequest, Plugin, ProcessRequest, SpecSession, StreamRef,
        WriteRequest,
    };
    pub use crate::spec::{
        ConnectorSpec, DefinitionSpec, DeploymentSpec, FunctionSpec, Language, PluginType,
        StreamSpec, LATEST_SPEC_VERSION,
    };
}
