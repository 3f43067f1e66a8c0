//! Dataflow scope analysis.
//!
//! One forward sweep over the execution order. A node sees every declared
//! parameter plus the outputs of every node ordered before it, whether or not
//! an edge connects them: the pipeline threads one shared state through all
//! steps, so visibility is positional.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::outputs::output_names;
use super::topo::ExecutionOrder;
use crate::parse::graph::WorkflowGraph;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeMap {
    scopes: BTreeMap<String, BTreeSet<String>>,
}

impl ScopeMap {
    /// Names visible when `node_id` starts running.
    pub fn visible(&self, node_id: &str) -> Option<&BTreeSet<String>> {
        self.scopes.get(node_id)
    }

    pub fn is_visible(&self, node_id: &str, name: &str) -> bool {
        self.scopes
            .get(node_id)
            .is_some_and(|names| names.contains(name))
    }

    /// Sorted list of names visible at `node_id`; empty for unknown nodes.
    pub fn sorted_names(&self, node_id: &str) -> Vec<String> {
        self.scopes
            .get(node_id)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Compute the scope of every node in `order`.
pub fn scopes(graph: &WorkflowGraph, order: &ExecutionOrder) -> ScopeMap {
    let mut visible: BTreeSet<String> = graph
        .parameters()
        .iter()
        .map(|p| p.name.clone())
        .collect();

    let mut scopes = BTreeMap::new();
    for node_id in order.iter() {
        scopes.insert(node_id.to_string(), visible.clone());
        if let Ok(node) = graph.node(node_id) {
            visible.extend(output_names(node));
        }
    }

    tracing::debug!(nodes = scopes.len(), final_names = visible.len(), "scopes computed");

    ScopeMap { scopes }
}
