//! Graph-level validation phase (pre-plan).
//!
//! Validates the workflow graph before lowering. Every check contributes to
//! one `ValidationReport`; validation itself never fails.

pub mod node_rules;
pub mod scope;
pub mod structural;

use std::collections::HashSet;

use serde::Serialize;

use crate::error::CompilerError;
use crate::lower::scope::scopes;
use crate::parse::graph::{Node, WorkflowGraph};

/// Aggregate outcome of one validation run. Empty iff the graph is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<CompilerError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[CompilerError] {
        &self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompilerError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<CompilerError> {
        self.errors
    }

    /// `Ok(())` when valid, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), Vec<CompilerError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }

    /// Append records, dropping any already present.
    fn extend(
        &mut self,
        errors: impl IntoIterator<Item = CompilerError>,
        seen: &mut HashSet<CompilerError>,
    ) {
        for error in errors {
            if seen.insert(error.clone()) {
                self.errors.push(error);
            }
        }
    }
}

impl IntoIterator for ValidationReport {
    type Item = CompilerError;
    type IntoIter = std::vec::IntoIter<CompilerError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Validate the entire workflow graph: structure, ordering, placeholder
/// scope and per-kind config.
pub fn validate(graph: &WorkflowGraph) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen = HashSet::new();

    let structural = structural::validate_structural(graph);
    let structurally_sound = structural.is_empty();
    report.extend(structural, &mut seen);

    match structural::s003_order(graph) {
        Ok(order) => {
            // Dataflow analysis needs a sound graph.
            if structurally_sound {
                let scope_map = scopes(graph, &order);
                report.extend(scope::validate_references(graph, &order, &scope_map), &mut seen);
            }
            for node in graph.nodes() {
                report.extend(validate_node(node), &mut seen);
            }
        }
        Err(cycle) => report.extend([cycle], &mut seen),
    }

    if report.is_valid() {
        tracing::info!(nodes = graph.distinct_node_count(), "workflow graph is valid");
    } else {
        tracing::warn!(errors = report.len(), "workflow graph failed validation");
    }

    report
}

/// Validate a single node's configuration.
pub fn validate_node(node: &Node) -> Vec<CompilerError> {
    node_rules::validate_node_config(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{EdgeSpec, NodeConfig, NodeSpec};

    fn call(id: &str, name: Option<&str>) -> NodeSpec {
        NodeSpec {
            id: id.into(),
            node_type: "function_call".into(),
            config: NodeConfig {
                function_name: name.map(String::from),
                ..NodeConfig::default()
            },
            outputs: vec![],
        }
    }

    fn edge(s: &str, t: &str) -> EdgeSpec {
        EdgeSpec {
            source_node: s.into(),
            target_node: t.into(),
        }
    }

    #[test]
    fn cycle_short_circuits_config_checks() {
        let graph = WorkflowGraph::build(
            &[call("a", None), call("b", None)],
            &[edge("a", "b"), edge("b", "a")],
            &[],
        )
        .unwrap();
        let report = validate(&graph);
        let codes: Vec<&str> = report.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["S003"]);
    }

    #[test]
    fn duplicate_config_errors_emitted_once() {
        let graph =
            WorkflowGraph::build(&[call("a", None), call("a", None)], &[], &[]).unwrap();
        let report = validate(&graph);
        let codes: Vec<&str> = report.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["S001", "C001"]);
    }

    #[test]
    fn valid_graph_yields_empty_report() {
        let graph = WorkflowGraph::build(&[call("a", Some("Fn"))], &[], &[]).unwrap();
        let report = validate(&graph);
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }
}
