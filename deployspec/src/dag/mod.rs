//! Pipeline graph store and structural validation.
//!
//! This module provides:
//! - An adjacency-list graph that rejects cycles on insertion
//! - A validator that rebuilds the graph from a flat spec document

mod graph;
mod validator;

pub use graph::SpecGraph;
pub use validator::{build_graph, validate_dag};

pub(crate) use validator::link_stream;
