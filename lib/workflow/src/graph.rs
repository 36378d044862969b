//! Traversal view of a compiled graph using petgraph.
//!
//! Node weights are node ids; edges whose target is not a declared node are
//! left out.

use crate::compiler::CompiledGraph;
use crate::error::CompileError;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// A directed graph over the node ids of a compiled graph.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    graph: DiGraph<String, ()>,
    /// Node id to petgraph index for O(1) lookup.
    node_index_map: HashMap<String, NodeIndex>,
}

impl WorkflowGraph {
    /// Builds the view. Nodes keep their declaration order.
    #[must_use]
    pub fn from_compiled(compiled: &CompiledGraph) -> Self {
        let mut graph = DiGraph::with_capacity(compiled.nodes.len(), compiled.edges.len());
        let mut node_index_map = HashMap::with_capacity(compiled.nodes.len());

        for node in &compiled.nodes {
            let index = graph.add_node(node.id().to_string());
            node_index_map.insert(node.id().to_string(), index);
        }

        for edge in &compiled.edges {
            let (Some(&source), Some(&target)) = (
                node_index_map.get(&edge.source_id),
                node_index_map.get(&edge.target_id),
            ) else {
                continue;
            };
            graph.add_edge(source, target, ());
        }

        Self { graph, node_index_map }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Nodes with no incoming edges.
    pub fn entry_nodes(&self) -> Vec<&str> {
        self.nodes_without(Direction::Incoming)
    }

    /// Nodes with no outgoing edges.
    pub fn terminal_nodes(&self) -> Vec<&str> {
        self.nodes_without(Direction::Outgoing)
    }

    /// Downstream neighbours of a node. Empty for unknown ids.
    pub fn successors(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    /// Upstream neighbours of a node. Empty for unknown ids.
    pub fn predecessors(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Incoming)
    }

    /// Node ids such that every edge points forward.
    ///
    /// # Errors
    ///
    /// Returns `CycleDetected` if the graph has a cycle, which a compiled
    /// graph never does.
    pub fn topological_order(&self) -> Result<Vec<&str>, CompileError> {
        let order = toposort(&self.graph, None).map_err(|_| CompileError::CycleDetected)?;
        Ok(order.into_iter().map(|index| self.graph[index].as_str()).collect())
    }

    fn nodes_without(&self, direction: Direction) -> Vec<&str> {
        self.graph
            .node_indices()
            .filter(|&index| self.graph.neighbors_directed(index, direction).next().is_none())
            .map(|index| self.graph[index].as_str())
            .collect()
    }

    fn neighbors(&self, node_id: &str, direction: Direction) -> Vec<&str> {
        let Some(&index) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&str> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|neighbor| self.graph[neighbor].as_str())
            .collect();
        // petgraph yields most recently added edges first
        neighbors.reverse();
        neighbors
    }
}
