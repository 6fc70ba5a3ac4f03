//! Adjacency-list graph of pipeline vertices and streams.

use crate::errors::{CycleDetectedError, Result, SpecError};
use std::collections::{HashMap, HashSet};

/// A directed acyclic graph of connector and function ids.
///
/// Edges that would close a cycle are rejected on insertion, so the graph is
/// acyclic at every point in time. A failed insertion leaves it unchanged.
#[derive(Debug, Clone, Default)]
pub struct SpecGraph {
    /// Vertex ids in insertion order.
    vertices: Vec<String>,
    /// Outgoing edges per vertex, in insertion order.
    children: HashMap<String, Vec<String>>,
    /// Incoming edge count per vertex.
    in_degree: HashMap<String, usize>,
    /// Total number of edges.
    edge_count: usize,
}

impl SpecGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::DuplicateVertex`] if the id is already present.
    pub fn add_vertex(&mut self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        if self.contains(&id) {
            return Err(SpecError::DuplicateVertex { id });
        }

        self.children.insert(id.clone(), Vec::new());
        self.in_degree.insert(id.clone(), 0);
        self.vertices.push(id);
        Ok(())
    }

    /// Adds a directed edge `from -> to`.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::UnknownVertex`] if either endpoint is absent,
    /// [`SpecError::DuplicateEdge`] if the edge exists, and
    /// [`SpecError::CycleDetected`] if `from` is reachable from `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        for id in [from, to] {
            if !self.contains(id) {
                return Err(SpecError::UnknownVertex { id: id.to_string() });
            }
        }

        if self.has_edge(from, to) {
            return Err(SpecError::DuplicateEdge {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if let Some(path) = self.find_path(to, from) {
            let mut cycle = Vec::with_capacity(path.len() + 1);
            cycle.push(from.to_string());
            cycle.extend(path);
            return Err(CycleDetectedError::new(cycle).into());
        }

        if let Some(out) = self.children.get_mut(from) {
            out.push(to.to_string());
        }
        if let Some(count) = self.in_degree.get_mut(to) {
            *count += 1;
        }
        self.edge_count += 1;
        Ok(())
    }

    /// Returns true if the vertex is registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.children.contains_key(id)
    }

    /// Returns true if the edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.children
            .get(from)
            .is_some_and(|out| out.iter().any(|c| c == to))
    }

    /// Vertices without incoming edges, in insertion order.
    #[must_use]
    pub fn roots(&self) -> Vec<&str> {
        self.vertices
            .iter()
            .filter(|id| self.in_degree.get(id.as_str()).copied() == Some(0))
            .map(String::as_str)
            .collect()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns the vertex ids in insertion order.
    #[must_use]
    pub fn vertices(&self) -> &[String] {
        &self.vertices
    }

    /// Returns the direct successors of a vertex.
    #[must_use]
    pub fn children(&self, id: &str) -> &[String] {
        self.children.get(id).map_or(&[] as &[String], Vec::as_slice)
    }

    /// Returns true if `to` can be reached from `from` (a vertex reaches itself).
    #[must_use]
    pub fn is_reachable(&self, from: &str, to: &str) -> bool {
        self.find_path(from, to).is_some()
    }

    /// Finds a path `from ..= to` with an iterative depth-first search.
    fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        if !self.contains(from) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];
        visited.insert(from);

        while let Some(node) = stack.pop() {
            for child in self.children(node) {
                let child = child.as_str();
                if !visited.insert(child) {
                    continue;
                }
                parent.insert(child, node);
                if child == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(prev) = parent.get(cursor) {
                        path.push((*prev).to_string());
                        cursor = *prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                stack.push(child);
            }
        }

        None
    }
}
