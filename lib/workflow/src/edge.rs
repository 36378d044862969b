//! Directed edges between graph nodes.

use serde::{Deserialize, Serialize};

/// An edge from one node to another, by node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub target_id: String,
}

impl Edge {
    #[must_use]
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
        }
    }
}
