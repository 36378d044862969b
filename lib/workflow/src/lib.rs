//! Graph compiler for the switchyard platform.
//!
//! This crate provides:
//!
//! - **Wire model**: nodes, edges and output channels as authored and persisted
//! - **Compiler**: structural validation, capability resolution against a
//!   [`Registry`](switchyard_capability::Registry), cycle detection and
//!   per-node configuration validation
//! - **Schema validation**: checks on configuration schema definitions
//! - **Graph view**: a petgraph view of a compiled graph for traversal

pub mod compiler;
pub mod cycle;
pub mod definition;
pub mod edge;
pub mod error;
pub mod graph;
pub mod node;
pub mod schema;

pub use compiler::{CompiledGraph, CompiledNode, compile_graph};
pub use definition::{OutputChannelBinding, WireGraph};
pub use edge::Edge;
pub use error::{CompileError, SchemaError};
pub use graph::WorkflowGraph;
pub use node::{ComponentRef, Node, NodeRef, NodeType};
pub use schema::{validate_configuration, validate_schema};
