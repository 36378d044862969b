//! Graph nodes as authored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Reference to the component a node runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRef {
    /// Flat (`noop`) or qualified (`github.deploy`) component name.
    pub name: String,
}

/// What a node refers to. Serialized with the `type` tag of the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeRef {
    Component { component: ComponentRef },
}

impl NodeRef {
    #[must_use]
    pub fn component(name: impl Into<String>) -> Self {
        Self::Component {
            component: ComponentRef { name: name.into() },
        }
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Component { .. } => NodeType::Component,
        }
    }

    /// The capability name this reference resolves through.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Component { component } => &component.name,
        }
    }
}

/// The type tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Component,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component => f.write_str("component"),
        }
    }
}

/// A node in a workflow or blueprint graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Author-chosen id, unique within the graph.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub reference: NodeRef,
    /// Values matching the referenced capability's configuration schema.
    #[serde(default)]
    pub configuration: Map<String, JsonValue>,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, reference: NodeRef) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            reference,
            configuration: Map::new(),
        }
    }

    #[must_use]
    pub fn with_configuration(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.configuration.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.reference.node_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_wire_format() {
        let node = Node::new("deploy", "Deploy", NodeRef::component("ci.deploy"))
            .with_configuration("environment", json!("production"));

        let json = serde_json::to_value(&node).expect("serialize");
        assert_eq!(
            json,
            json!({
                "id": "deploy",
                "name": "Deploy",
                "type": "component",
                "component": {"name": "ci.deploy"},
                "configuration": {"environment": "production"}
            })
        );

        let parsed: Node = serde_json::from_value(json).expect("deserialize");
        assert_eq!(parsed, node);
        assert_eq!(parsed.node_type(), NodeType::Component);
    }

    #[test]
    fn missing_id_and_name_deserialize_empty() {
        let parsed: Node = serde_json::from_value(json!({
            "type": "component",
            "component": {"name": "noop"}
        }))
        .expect("deserialize");
        assert!(parsed.id.is_empty());
        assert!(parsed.name.is_empty());
        assert_eq!(parsed.reference.name(), "noop");
    }
}
