//! Cycle detection over wire graphs.

use crate::edge::Edge;
use std::collections::{HashMap, VecDeque};

/// Returns true if the edges form a cycle among the given nodes.
///
/// Kahn's algorithm: repeatedly remove nodes with no remaining incoming
/// edges. Any node never removed sits on, or downstream of, a cycle. Edges
/// with an endpoint outside `node_ids` are ignored.
#[must_use]
pub fn has_cycle<'a>(node_ids: impl IntoIterator<Item = &'a str>, edges: &'a [Edge]) -> bool {
    let mut in_degree: HashMap<&str, usize> = node_ids.into_iter().map(|id| (id, 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in edges {
        let (source, target) = (edge.source_id.as_str(), edge.target_id.as_str());
        if !in_degree.contains_key(source) {
            continue;
        }
        let Some(degree) = in_degree.get_mut(target) else {
            continue;
        };
        *degree += 1;
        adjacency.entry(source).or_default().push(target);
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut visited = 0;
    while let Some(id) = queue.pop_front() {
        visited += 1;
        for &next in adjacency.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    visited < in_degree.len()
}
