//! Error types for the workflow crate.
//!
//! - `CompileError`: a wire graph failed structural or configuration
//!   validation. Each variant names the offending node or edge.
//! - `SchemaError`: a configuration schema definition is malformed.

use std::fmt;

/// Errors from compiling a wire graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The graph has no name.
    MissingGraphName,
    /// Node at this position has an empty id.
    MissingNodeId { index: usize },
    /// The id is used by more than one node.
    DuplicateId { id: String },
    /// Node has an empty name.
    MissingNodeName { id: String },
    /// The node's capability reference did not resolve.
    UnresolvedReference { node_id: String, reference: String },
    /// Edge at this position has an empty source or target.
    MissingEdgeEndpoint { index: usize },
    /// An edge starts at a node that is not declared.
    UnknownEdgeSource { source_id: String },
    /// A graph output channel exposes a node that is not declared.
    UnknownOutputNode { channel: String, node_id: String },
    /// The graph contains a cycle.
    CycleDetected,
    /// A required configuration field is missing, null or empty.
    MissingRequiredField { node_id: String, field: String },
}

impl CompileError {
    /// True for failures of per-node configuration validation, as opposed to
    /// graph structure.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::MissingRequiredField { .. })
    }

    /// Compile errors are always caused by the submitted graph.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        400
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingGraphName => write!(f, "graph name is required"),
            Self::MissingNodeId { index } => write!(f, "node {index}: id is required"),
            Self::DuplicateId { id } => write!(f, "duplicate node id: {id}"),
            Self::MissingNodeName { id } => write!(f, "node {id}: name is required"),
            Self::UnresolvedReference { node_id, reference } => {
                write!(f, "node {node_id}: {reference} is not registered")
            }
            Self::MissingEdgeEndpoint { index } => {
                write!(f, "edge {index}: source_id and target_id are required")
            }
            Self::UnknownEdgeSource { source_id } => {
                write!(f, "edge source node not found: {source_id}")
            }
            Self::UnknownOutputNode { channel, node_id } => {
                write!(f, "output channel {channel}: node not found: {node_id}")
            }
            Self::CycleDetected => write!(f, "graph contains a cycle"),
            Self::MissingRequiredField { node_id, field } => {
                write!(f, "node {node_id}: field {field} is required")
            }
        }
    }
}

impl std::error::Error for CompileError {}

/// Errors from validating a configuration schema definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Field at this position has no name.
    MissingName { index: usize },
    MissingLabel { field: String },
    /// An optional field must say what it defaults to.
    MissingDefault { field: String },
    /// Number fields need a min or a max.
    MissingNumberBound { field: String },
    /// Select and multi-select fields need at least one option.
    MissingOptions { field: String },
    /// Integration fields must name the integration type they accept.
    MissingIntegrationType { field: String },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName { index } => write!(f, "field {index}: name is required"),
            Self::MissingLabel { field } => write!(f, "field {field}: label is required"),
            Self::MissingDefault { field } => {
                write!(f, "field {field}: optional fields need a default value")
            }
            Self::MissingNumberBound { field } => {
                write!(f, "field {field}: number fields need a min or max")
            }
            Self::MissingOptions { field } => write!(f, "field {field}: options are required"),
            Self::MissingIntegrationType { field } => {
                write!(f, "field {field}: integration type is required")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_display() {
        assert_eq!(CompileError::CycleDetected.to_string(), "graph contains a cycle");
    }

    #[test]
    fn duplicate_id_names_the_node() {
        let err = CompileError::DuplicateId { id: "n1".to_string() };
        assert!(err.to_string().contains("n1"));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn missing_field_is_configuration_error() {
        let err = CompileError::MissingRequiredField {
            node_id: "n1".to_string(),
            field: "url".to_string(),
        };
        assert!(err.is_configuration_error());
        assert_eq!(err.to_string(), "node n1: field url is required");
    }
}
