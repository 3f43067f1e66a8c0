//! Graph-level structural validation rules (S001–S004).

use std::collections::BTreeMap;

use crate::error::CompilerError;
use crate::lower::topo::{self, ExecutionOrder};
use crate::parse::graph::WorkflowGraph;

/// Duplicate ids and dangling edges. Returns all errors found.
pub fn validate_structural(graph: &WorkflowGraph) -> Vec<CompilerError> {
    let mut errors = Vec::new();

    s001_unique_node_ids(graph, &mut errors);
    s004_unique_parameter_names(graph, &mut errors);
    s002_edges_reference_existing_nodes(graph, &mut errors);

    errors
}

/// Run the sequencer; a cycle becomes an `S003` error.
pub fn s003_order(graph: &WorkflowGraph) -> Result<ExecutionOrder, CompilerError> {
    topo::order(graph).map_err(CompilerError::from)
}

fn s001_unique_node_ids(graph: &WorkflowGraph, errors: &mut Vec<CompilerError>) {
    let mut positions: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (pos, node) in graph.nodes().iter().enumerate() {
        positions.entry(node.id.as_str()).or_default().push(pos);
    }

    let duplicated: Vec<String> = positions
        .iter()
        .filter(|(_, at)| at.len() > 1)
        .map(|(id, at)| {
            let at: Vec<String> = at.iter().map(|p| p.to_string()).collect();
            format!("'{}' at positions [{}]", id, at.join(", "))
        })
        .collect();

    if !duplicated.is_empty() {
        errors.push(CompilerError::structural(
            "S001",
            format!("Duplicate node IDs found: {}", duplicated.join("; ")),
            None,
        ));
    }
}

fn s004_unique_parameter_names(graph: &WorkflowGraph, errors: &mut Vec<CompilerError>) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for param in graph.parameters() {
        *counts.entry(param.name.as_str()).or_default() += 1;
    }

    let duplicated: Vec<&str> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name)
        .collect();

    if !duplicated.is_empty() {
        errors.push(CompilerError::structural(
            "S004",
            format!("Duplicate parameter names found: [{}]", duplicated.join(", ")),
            None,
        ));
    }
}

fn s002_edges_reference_existing_nodes(graph: &WorkflowGraph, errors: &mut Vec<CompilerError>) {
    for edge in graph.edges() {
        if !graph.contains(&edge.source) {
            errors.push(CompilerError::structural(
                "S002",
                format!(
                    "Edge '{}' -> '{}' references non-existent source node '{}'",
                    edge.source, edge.target, edge.source
                ),
                None,
            ));
        }
        if !graph.contains(&edge.target) {
            errors.push(CompilerError::structural(
                "S002",
                format!(
                    "Edge '{}' -> '{}' references non-existent target node '{}'",
                    edge.source, edge.target, edge.target
                ),
                None,
            ));
        }
    }
}
