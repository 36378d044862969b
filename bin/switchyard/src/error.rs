//! Error types for the CLI.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// A graph file could not be read.
    ReadFile { path: String, reason: String },
    /// A graph file is not a valid wire graph.
    ParseGraph { path: String, reason: String },
    /// The graph failed compilation.
    Compile { reason: String },
    /// An outbound request failed or was blocked.
    Egress { reason: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "invalid configuration: {reason}"),
            Self::ReadFile { path, reason } => write!(f, "failed to read {path}: {reason}"),
            Self::ParseGraph { path, reason } => write!(f, "failed to parse {path}: {reason}"),
            Self::Compile { reason } => write!(f, "compilation failed: {reason}"),
            Self::Egress { reason } => write!(f, "request failed: {reason}"),
        }
    }
}

impl std::error::Error for CliError {}
