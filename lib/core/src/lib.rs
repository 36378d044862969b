//! Core domain types and utilities for the switchyard platform.
//!
//! This crate provides the foundational types shared by the capability
//! runtime and the graph compiler: the rootcause-backed `Result` alias and
//! strongly-typed execution and installation identifiers.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ExecutionId, InstallationId, ParseIdError};
