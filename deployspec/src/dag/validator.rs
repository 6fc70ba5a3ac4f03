//! Whole-document structural validation.
//!
//! The validator never trusts incremental state: it rebuilds a fresh graph from
//! the flat document, so a spec read from disk is checked exactly like one that
//! was built live.

use super::SpecGraph;
use crate::errors::{EndpointSide, Result, SpecError};
use crate::spec::{DeploymentSpec, StreamSpec};

/// Links a stream into `graph`, reporting dangling endpoints by side.
pub(crate) fn link_stream(graph: &mut SpecGraph, stream: &StreamSpec) -> Result<()> {
    if !graph.contains(&stream.from_uuid) {
        return Err(SpecError::MissingEndpoint {
            side: EndpointSide::From,
            id: stream.from_uuid.clone(),
        });
    }
    if !graph.contains(&stream.to_uuid) {
        return Err(SpecError::MissingEndpoint {
            side: EndpointSide::To,
            id: stream.to_uuid.clone(),
        });
    }
    graph.add_edge(&stream.from_uuid, &stream.to_uuid)
}

/// Rebuilds the graph induced by the document's connectors, functions and
/// streams.
///
/// # Errors
///
/// Fails on duplicate ids, dangling or repeated streams, and cycles.
pub fn build_graph(spec: &DeploymentSpec) -> Result<SpecGraph> {
    let mut graph = SpecGraph::new();
    for id in spec.vertex_ids() {
        graph.add_vertex(id)?;
    }
    for stream in &spec.streams {
        link_stream(&mut graph, stream)?;
    }
    Ok(graph)
}

/// Validates the document's global structure and returns the rebuilt graph.
///
/// Checks, in order: the graph can be built; the document declares exactly one
/// source connector; at least one stream exists; the graph has exactly one
/// root and that root is the source connector.
///
/// # Errors
///
/// Returns the first structural error found.
pub fn validate_dag(spec: &DeploymentSpec) -> Result<SpecGraph> {
    let graph = build_graph(spec)?;

    let sources: Vec<&str> = spec.sources().map(|c| c.uuid.as_str()).collect();
    let source_id = match sources.as_slice() {
        [] => return Err(SpecError::NoSource),
        [only] => *only,
        many => {
            return Err(SpecError::MultipleSources {
                ids: many.iter().map(|s| (*s).to_string()).collect(),
            })
        }
    };

    if graph.edge_count() == 0 {
        return Err(SpecError::EmptyGraph);
    }

    let roots = graph.roots();
    match roots.as_slice() {
        [] => return Err(SpecError::NoSource),
        [root] if *root != source_id => {
            return Err(SpecError::RootNotSource {
                root: (*root).to_string(),
                source_id: source_id.to_string(),
            })
        }
        [_] => {}
        many => {
            return Err(SpecError::MultipleSources {
                ids: many.iter().map(|s| (*s).to_string()).collect(),
            })
        }
    }

    Ok(graph)
}
