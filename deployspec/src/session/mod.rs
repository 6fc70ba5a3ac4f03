//! The session call surface.
//!
//! A pipeline program describes itself through an ordered sequence of calls:
//! init, add source, read records, process records, add destination, write
//! records. The session turns each call into builder mutations and produces
//! the finished artifact on `get_spec`.

mod requests;
mod service;

pub use requests::{
    ConnectorRequest, InitRequest, Plugin, ProcessRequest, StreamRef, WriteRequest,
};
pub use service::SpecSession;
