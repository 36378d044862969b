//! Command implementations, separated from argument parsing.

use crate::error::CliError;
use rootcause::Report;
use serde::Serialize;
use std::path::Path;
use switchyard_capability::{Capability, CapabilityKind, Kind, Registry};
use switchyard_egress::{EgressContext, EgressOptions};
use switchyard_workflow::{WireGraph, compile_graph};
use tracing::info;

/// One row of `switchyard capabilities`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilitySummary {
    pub kind: Kind,
    pub name: String,
    pub label: String,
    pub description: String,
}

impl From<&CapabilityKind> for CapabilitySummary {
    fn from(capability: &CapabilityKind) -> Self {
        let description = match capability {
            CapabilityKind::Component(c) => c.description(),
            CapabilityKind::Trigger(t) => t.description(),
            CapabilityKind::Integration(i) => i.description(),
            CapabilityKind::Application(a) => a.description(),
            CapabilityKind::Widget(w) => w.description(),
        };
        Self {
            kind: capability.kind(),
            name: capability.name().to_string(),
            label: capability.label().to_string(),
            description: description.to_string(),
        }
    }
}

/// Every registered capability, optionally of one kind, sorted by kind then
/// name.
#[must_use]
pub fn list_capabilities(registry: &Registry, kind: Option<Kind>) -> Vec<CapabilitySummary> {
    let all = registry
        .list_components()
        .map(CapabilityKind::Component)
        .chain(registry.list_triggers().map(CapabilityKind::Trigger))
        .chain(registry.list_integrations().map(CapabilityKind::Integration))
        .chain(registry.list_applications().map(CapabilityKind::Application))
        .chain(registry.list_widgets().map(CapabilityKind::Widget));

    all.filter(|capability| kind.is_none_or(|kind| capability.kind() == kind))
        .map(|capability| CapabilitySummary::from(&capability))
        .collect()
}

/// Result of compiling a graph file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileSummary {
    pub name: String,
    pub nodes: usize,
    pub edges: usize,
    pub entry_nodes: Vec<String>,
    /// Node ids in an order where every edge points forward.
    pub order: Vec<String>,
}

/// Reads, parses and compiles a wire graph file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the graph
/// does not compile.
pub fn compile_file(registry: &Registry, path: &Path) -> Result<CompileSummary, Report<CliError>> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|e| CliError::ReadFile {
        path: display.clone(),
        reason: e.to_string(),
    })?;
    let wire: WireGraph = serde_json::from_str(&contents).map_err(|e| CliError::ParseGraph {
        path: display,
        reason: e.to_string(),
    })?;

    let compiled = compile_graph(registry, &wire).map_err(|e| CliError::Compile {
        reason: e.current_context().to_string(),
    })?;
    let graph = compiled.graph();
    let order = graph.topological_order().map_err(|e| CliError::Compile {
        reason: e.to_string(),
    })?;

    info!(graph = %compiled.name, nodes = compiled.nodes.len(), "graph compiled");

    Ok(CompileSummary {
        name: compiled.name.clone(),
        nodes: compiled.nodes.len(),
        edges: compiled.edges.len(),
        entry_nodes: graph.entry_nodes().into_iter().map(str::to_string).collect(),
        order: order.into_iter().map(str::to_string).collect(),
    })
}

/// Result of `switchyard fetch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub status: u16,
    pub body: String,
}

/// Fetches a URL through the egress context.
///
/// # Errors
///
/// Returns an error if the request is blocked or fails.
pub async fn fetch(options: EgressOptions, url: &str) -> Result<FetchSummary, Report<CliError>> {
    let egress = |e: Report<switchyard_egress::EgressError>| CliError::Egress {
        reason: e.current_context().to_string(),
    };
    let context = EgressContext::new(options).map_err(egress)?;
    let response = context.get(url).await.map_err(egress)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(egress)?;
    Ok(FetchSummary { status, body })
}
