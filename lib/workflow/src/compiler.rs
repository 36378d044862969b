//! Graph compilation.
//!
//! Compilation runs fail-fast, in order:
//!
//! 1. the graph has a name
//! 2. node ids are present and unique
//! 3. node names are present
//! 4. every node reference resolves in the registry
//! 5. edges have both endpoints and start at a declared node
//! 6. output channels expose declared nodes
//! 7. the graph is acyclic
//!
//! Only when the whole graph is structurally valid is each node's
//! configuration checked against the schema of its resolved component.

use crate::cycle::has_cycle;
use crate::definition::{OutputChannelBinding, WireGraph};
use crate::edge::Edge;
use crate::error::CompileError;
use crate::graph::WorkflowGraph;
use crate::node::{Node, NodeRef};
use crate::schema::validate_configuration;
use rootcause::Report;
use rootcause::prelude::ResultExt;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use switchyard_capability::{Capability, Component, Registry};
use tracing::{debug, instrument};

/// A node together with the component it resolved to.
#[derive(Clone)]
pub struct CompiledNode {
    pub node: Node,
    /// The resolved component, fault-isolated by the registry.
    pub component: Arc<dyn Component>,
}

impl CompiledNode {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.node.id
    }
}

impl fmt::Debug for CompiledNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledNode")
            .field("node", &self.node)
            .field("component", &self.component.name())
            .finish()
    }
}

/// A validated graph, ready to persist.
#[derive(Debug, Clone)]
pub struct CompiledGraph {
    pub name: String,
    pub description: String,
    pub nodes: Vec<CompiledNode>,
    pub edges: Vec<Edge>,
    pub output_channels: Vec<OutputChannelBinding>,
}

impl CompiledGraph {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&CompiledNode> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Petgraph view for traversal.
    #[must_use]
    pub fn graph(&self) -> WorkflowGraph {
        WorkflowGraph::from_compiled(self)
    }

    /// Converts back to the wire format.
    #[must_use]
    pub fn to_wire(&self) -> WireGraph {
        WireGraph {
            name: self.name.clone(),
            description: self.description.clone(),
            nodes: self.nodes.iter().map(|compiled| compiled.node.clone()).collect(),
            edges: self.edges.clone(),
            output_channels: self.output_channels.clone(),
        }
    }
}

/// Validates a wire graph and resolves its nodes against the registry.
///
/// # Errors
///
/// Returns the first structural problem found, in the order listed in the
/// module docs, or the first node whose configuration is missing a required
/// field.
#[instrument(
    skip_all,
    fields(graph = %graph.name, nodes = graph.nodes.len(), edges = graph.edges.len())
)]
pub fn compile_graph(
    registry: &Registry,
    graph: &WireGraph,
) -> Result<CompiledGraph, Report<CompileError>> {
    if graph.name.is_empty() {
        return Err(CompileError::MissingGraphName.into());
    }

    let mut ids = HashSet::with_capacity(graph.nodes.len());
    for (index, node) in graph.nodes.iter().enumerate() {
        if node.id.is_empty() {
            return Err(CompileError::MissingNodeId { index }.into());
        }
        if !ids.insert(node.id.as_str()) {
            return Err(CompileError::DuplicateId { id: node.id.clone() }.into());
        }
    }

    for node in &graph.nodes {
        if node.name.is_empty() {
            return Err(CompileError::MissingNodeName { id: node.id.clone() }.into());
        }
    }

    let nodes = graph
        .nodes
        .iter()
        .map(|node| resolve(registry, node))
        .collect::<Result<Vec<_>, _>>()?;

    for (index, edge) in graph.edges.iter().enumerate() {
        if edge.source_id.is_empty() || edge.target_id.is_empty() {
            return Err(CompileError::MissingEdgeEndpoint { index }.into());
        }
        if !ids.contains(edge.source_id.as_str()) {
            return Err(CompileError::UnknownEdgeSource {
                source_id: edge.source_id.clone(),
            }
            .into());
        }
    }

    for channel in &graph.output_channels {
        if !ids.contains(channel.node_id.as_str()) {
            return Err(CompileError::UnknownOutputNode {
                channel: channel.name.clone(),
                node_id: channel.node_id.clone(),
            }
            .into());
        }
    }

    if has_cycle(ids.iter().copied(), &graph.edges) {
        return Err(CompileError::CycleDetected.into());
    }

    for compiled in &nodes {
        validate_configuration(
            &compiled.node.id,
            &compiled.component.configuration(),
            &compiled.node.configuration,
        )?;
    }

    debug!("graph compiled");

    Ok(CompiledGraph {
        name: graph.name.clone(),
        description: graph.description.clone(),
        nodes,
        edges: graph.edges.clone(),
        output_channels: graph.output_channels.clone(),
    })
}

fn resolve(registry: &Registry, node: &Node) -> Result<CompiledNode, Report<CompileError>> {
    let component = match &node.reference {
        NodeRef::Component { component } => registry.get_component(&component.name),
    };
    let component = component
        .inspect_err(|err| {
            debug!(node_id = %node.id, error = %err.current_context(), "unresolved node reference");
        })
        .context_with(|| CompileError::UnresolvedReference {
            node_id: node.id.clone(),
            reference: node.reference.name().to_string(),
        })?;

    debug!(node_id = %node.id, reference = node.reference.name(), "resolved node");
    Ok(CompiledNode {
        node: node.clone(),
        component,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use switchyard_capability::{
        Capability, CapabilityResult, ConfigurationField, ExecutionContext, FieldType, Integration,
        Kind, NoOpEncryptor, RegistrationTable, RegistryError, SyncContext,
    };

    struct Noop;

    impl Capability for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn label(&self) -> &str {
            "No-op"
        }
    }

    #[async_trait]
    impl Component for Noop {
        async fn execute(&self, ctx: ExecutionContext) -> CapabilityResult<()> {
            ctx.state.emit("default", vec![ctx.input]);
            Ok(())
        }
    }

    struct Deploy;

    impl Capability for Deploy {
        fn name(&self) -> &str {
            "deploy"
        }

        fn label(&self) -> &str {
            "Deploy"
        }

        fn configuration(&self) -> Vec<ConfigurationField> {
            vec![
                ConfigurationField::new("environment", "Environment", FieldType::String)
                    .required(),
            ]
        }
    }

    #[async_trait]
    impl Component for Deploy {
        async fn execute(&self, _ctx: ExecutionContext) -> CapabilityResult<()> {
            Ok(())
        }
    }

    struct Ci;

    impl Capability for Ci {
        fn name(&self) -> &str {
            "ci"
        }

        fn label(&self) -> &str {
            "CI"
        }
    }

    #[async_trait]
    impl Integration for Ci {
        fn components(&self) -> Vec<Arc<dyn Component>> {
            vec![Arc::new(Deploy)]
        }

        async fn sync(&self, _ctx: SyncContext) -> CapabilityResult<()> {
            Ok(())
        }
    }

    fn registry() -> Registry {
        let table = RegistrationTable::new();
        table.register_component("noop", Arc::new(Noop));
        table.register_integration("ci", Arc::new(Ci));
        Registry::from_table(&table, Arc::new(NoOpEncryptor))
    }

    fn noop(id: &str) -> Node {
        Node::new(id, id.to_uppercase(), NodeRef::component("noop"))
    }

    fn deploy(id: &str) -> Node {
        Node::new(id, "Deploy", NodeRef::component("ci.deploy"))
            .with_configuration("environment", json!("production"))
    }

    fn compile_err(graph: &WireGraph) -> CompileError {
        compile_graph(&registry(), graph).unwrap_err().current_context().clone()
    }

    #[test]
    fn compiles_valid_graph() {
        let graph = WireGraph::new("release")
            .with_node(noop("a"))
            .with_node(deploy("b"))
            .with_edge("a", "b")
            .with_output_channel("done", "b");

        let compiled = compile_graph(&registry(), &graph).unwrap();
        assert_eq!(compiled.nodes.len(), 2);
        assert_eq!(compiled.node("b").unwrap().component.name(), "deploy");
        assert_eq!(compiled.to_wire(), graph);
    }

    #[test]
    fn wire_round_trip_through_json() {
        let graph = WireGraph::new("release").with_node(deploy("b"));
        let json = serde_json::to_string(&graph).unwrap();
        let parsed: WireGraph = serde_json::from_str(&json).unwrap();
        let compiled = compile_graph(&registry(), &parsed).unwrap();
        assert_eq!(serde_json::to_string(&compiled.to_wire()).unwrap(), json);
    }

    #[test]
    fn requires_graph_name() {
        assert_eq!(
            compile_err(&WireGraph::new("").with_node(noop("a"))),
            CompileError::MissingGraphName
        );
    }

    #[test]
    fn rejects_missing_and_duplicate_ids() {
        let graph = WireGraph::new("g").with_node(noop("a")).with_node(noop(""));
        assert_eq!(compile_err(&graph), CompileError::MissingNodeId { index: 1 });

        let graph = WireGraph::new("g")
            .with_node(noop("a"))
            .with_node(noop("b"))
            .with_node(noop("a"));
        assert_eq!(compile_err(&graph), CompileError::DuplicateId { id: "a".to_string() });
    }

    #[test]
    fn rejects_missing_node_name() {
        let graph = WireGraph::new("g").with_node(Node::new("a", "", NodeRef::component("noop")));
        assert_eq!(compile_err(&graph), CompileError::MissingNodeName { id: "a".to_string() });
    }

    #[test]
    fn rejects_unresolved_references() {
        for reference in ["missing", "ci.rollback", "jira.create", "a.b.c"] {
            let graph =
                WireGraph::new("g").with_node(Node::new("a", "A", NodeRef::component(reference)));
            assert_eq!(
                compile_err(&graph),
                CompileError::UnresolvedReference {
                    node_id: "a".to_string(),
                    reference: reference.to_string()
                }
            );
        }
    }

    fn registry_cause(reference: &str) -> RegistryError {
        let graph =
            WireGraph::new("g").with_node(Node::new("a", "A", NodeRef::component(reference)));
        let err = compile_graph(&registry(), &graph).unwrap_err();
        err.iter_reports()
            .find_map(|report| report.downcast_current_context::<RegistryError>())
            .cloned()
            .expect("registry error kept in the chain")
    }

    #[test]
    fn unresolved_reference_keeps_registry_cause() {
        assert_eq!(
            registry_cause("a.b.c"),
            RegistryError::NameFormat {
                name: "a.b.c".to_string()
            }
        );
        assert_eq!(
            registry_cause("missing"),
            RegistryError::NotFound {
                kind: Kind::Component,
                name: "missing".to_string()
            }
        );
        assert_eq!(
            registry_cause("jira.create"),
            RegistryError::ScopeNotFound {
                scope: "jira".to_string()
            }
        );
    }

    #[test]
    fn edge_checks() {
        let graph = WireGraph::new("g").with_node(noop("a")).with_edge("a", "");
        assert_eq!(compile_err(&graph), CompileError::MissingEdgeEndpoint { index: 0 });

        let graph = WireGraph::new("g").with_node(noop("a")).with_edge("ghost", "a");
        assert_eq!(
            compile_err(&graph),
            CompileError::UnknownEdgeSource {
                source_id: "ghost".to_string()
            }
        );
    }

    #[test]
    fn dangling_edge_target_is_accepted() {
        let graph = WireGraph::new("g").with_node(noop("a")).with_edge("a", "elsewhere");
        let compiled = compile_graph(&registry(), &graph).unwrap();
        assert_eq!(compiled.edges.len(), 1);
    }

    #[test]
    fn rejects_unknown_output_node() {
        let graph = WireGraph::new("g").with_node(noop("a")).with_output_channel("done", "z");
        assert!(matches!(
            compile_err(&graph),
            CompileError::UnknownOutputNode { node_id, .. } if node_id == "z"
        ));
    }

    #[test]
    fn rejects_cycles() {
        let graph = WireGraph::new("g")
            .with_node(noop("a"))
            .with_node(noop("b"))
            .with_node(noop("c"))
            .with_edge("a", "b")
            .with_edge("b", "c")
            .with_edge("c", "a");
        assert_eq!(compile_err(&graph), CompileError::CycleDetected);
    }

    #[test]
    fn structure_is_checked_before_configuration() {
        let graph = WireGraph::new("g")
            .with_node(Node::new("b", "Deploy", NodeRef::component("ci.deploy")))
            .with_node(noop("a"))
            .with_edge("a", "b")
            .with_edge("b", "a");
        assert_eq!(compile_err(&graph), CompileError::CycleDetected);
    }

    #[test]
    fn rejects_missing_required_configuration() {
        let graph = WireGraph::new("g")
            .with_node(noop("a"))
            .with_node(
                Node::new("b", "Deploy", NodeRef::component("ci.deploy"))
                    .with_configuration("environment", json!("")),
            );
        let err = compile_err(&graph);
        assert!(err.is_configuration_error());
        assert_eq!(
            err,
            CompileError::MissingRequiredField {
                node_id: "b".to_string(),
                field: "environment".to_string()
            }
        );
    }
}
