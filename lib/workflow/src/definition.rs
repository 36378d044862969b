//! Wire-level graph definitions.
//!
//! This is the shape graphs arrive in from clients and are persisted in. It
//! carries no guarantees until it has been through
//! [`compile_graph`](crate::compile_graph).

use crate::edge::Edge;
use crate::node::Node;
use serde::{Deserialize, Serialize};

/// A graph-level output channel exposing one node's output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChannelBinding {
    pub name: String,
    pub node_id: String,
    /// Output channel of the node. Defaults to the node's default channel.
    #[serde(default = "default_node_output_channel")]
    pub node_output_channel: String,
}

fn default_node_output_channel() -> String {
    switchyard_capability::capability::DEFAULT_OUTPUT_CHANNEL.to_string()
}

/// A workflow or blueprint graph as authored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireGraph {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_channels: Vec<OutputChannelBinding>,
}

impl WireGraph {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    #[must_use]
    pub fn with_edge(mut self, source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.edges.push(Edge::new(source_id, target_id));
        self
    }

    #[must_use]
    pub fn with_output_channel(
        mut self,
        name: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Self {
        self.output_channels.push(OutputChannelBinding {
            name: name.into(),
            node_id: node_id.into(),
            node_output_channel: default_node_output_channel(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn output_channel_defaults_to_default_channel() {
        let graph: WireGraph = serde_json::from_value(json!({
            "name": "release",
            "nodes": [],
            "edges": [],
            "output_channels": [{"name": "done", "node_id": "deploy"}]
        }))
        .expect("deserialize");
        assert_eq!(graph.output_channels[0].node_output_channel, "default");
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let graph: WireGraph = serde_json::from_value(json!({})).expect("deserialize");
        assert!(graph.name.is_empty());
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }
}
