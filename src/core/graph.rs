//! Project reference graph.
//!
//! Nodes are canonical descriptor paths; an edge `a -> b` means project `a`
//! references project `b`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

/// The graph of projects visited during one resolution.
#[derive(Debug, Clone, Default)]
pub struct ProjectGraph {
    graph: DiGraph<PathBuf, ()>,
    index: HashMap<PathBuf, NodeIndex>,
    roots: Vec<PathBuf>,
}

impl ProjectGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project node if it is not present yet.
    pub fn add_project(&mut self, path: &Path) -> NodeIndex {
        if let Some(&idx) = self.index.get(path) {
            return idx;
        }
        let idx = self.graph.add_node(path.to_path_buf());
        self.index.insert(path.to_path_buf(), idx);
        idx
    }

    /// Record that `from` references `to`.
    pub fn add_reference(&mut self, from: &Path, to: &Path) {
        let from = self.add_project(from);
        let to = self.add_project(to);
        self.graph.update_edge(from, to, ());
    }

    /// Record a root project.
    pub fn add_root(&mut self, path: &Path) {
        self.add_project(path);
        if !self.roots.iter().any(|r| r == path) {
            self.roots.push(path.to_path_buf());
        }
    }

    /// Root projects in the order they were given.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Number of distinct projects.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check whether the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Projects directly referenced by `path`, sorted.
    pub fn references(&self, path: &Path) -> Vec<&Path> {
        let Some(&idx) = self.index.get(path) else {
            return Vec::new();
        };
        let mut refs: Vec<&Path> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].as_path())
            .collect();
        refs.sort();
        refs
    }
}
