//! Deterministic topological sort of the workflow graph.
//!
//! Kahn's algorithm where the ready set is always drained smallest-id first,
//! so the order depends only on graph structure and never on document order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::parse::graph::WorkflowGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOrder {
    pub ids: Vec<String>,
    /// Node where execution starts, `None` only for an empty graph.
    pub entry: Option<String>,
    /// Node where execution ends, `None` only for an empty graph.
    pub exit: Option<String>,
    /// Nodes without incoming edges, in execution order.
    pub entry_candidates: Vec<String>,
    /// Nodes without outgoing edges, in execution order.
    pub exit_candidates: Vec<String>,
}

impl ExecutionOrder {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Position of `id` in the order.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|n| n == id)
    }
}

/// Order every distinct node of `graph`, or fail with `GraphError::Cycle`.
pub fn order(graph: &WorkflowGraph) -> Result<ExecutionOrder, GraphError> {
    let mut in_degree: HashMap<&str, usize> = graph
        .node_ids()
        .map(|id| (id, graph.incoming_count(id)))
        .collect();

    let mut ready: BinaryHeap<Reverse<&str>> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| Reverse(*id))
        .collect();

    let mut ids = Vec::with_capacity(in_degree.len());
    while let Some(Reverse(id)) = ready.pop() {
        ids.push(id.to_string());
        for succ in graph.successors(id) {
            if let Some(deg) = in_degree.get_mut(succ) {
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse(succ));
                }
            }
        }
    }

    let total = graph.distinct_node_count();
    if ids.len() < total {
        return Err(GraphError::Cycle {
            ordered: ids.len(),
            total,
        });
    }

    let entry_candidates: Vec<String> = ids
        .iter()
        .filter(|id| graph.incoming_count(id) == 0)
        .cloned()
        .collect();
    let exit_candidates: Vec<String> = ids
        .iter()
        .filter(|id| graph.outgoing_count(id) == 0)
        .cloned()
        .collect();

    let entry = entry_candidates.first().or(ids.first()).cloned();
    let exit = exit_candidates.last().or(ids.last()).cloned();

    tracing::debug!(nodes = ids.len(), ?entry, ?exit, "execution order computed");

    Ok(ExecutionOrder {
        ids,
        entry,
        exit,
        entry_candidates,
        exit_candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::{EdgeSpec, NodeConfig, NodeSpec};

    fn graph(ids: &[&str], edges: &[(&str, &str)]) -> WorkflowGraph {
        let nodes: Vec<NodeSpec> = ids
            .iter()
            .map(|id| NodeSpec {
                id: id.to_string(),
                node_type: "function_call".into(),
                config: NodeConfig::default(),
                outputs: vec![],
            })
            .collect();
        let edges: Vec<EdgeSpec> = edges
            .iter()
            .map(|(s, t)| EdgeSpec {
                source_node: s.to_string(),
                target_node: t.to_string(),
            })
            .collect();
        WorkflowGraph::build(&nodes, &edges, &[]).unwrap()
    }

    #[test]
    fn linear_chain() {
        let g = graph(&["c", "a", "b"], &[("a", "b"), ("b", "c")]);
        let order = order(&g).unwrap();
        assert_eq!(order.ids, vec!["a", "b", "c"]);
        assert_eq!(order.entry.as_deref(), Some("a"));
        assert_eq!(order.exit.as_deref(), Some("c"));
    }

    #[test]
    fn ties_break_lexicographically() {
        let g = graph(&["zeta", "alpha", "mid"], &[]);
        assert_eq!(order(&g).unwrap().ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn released_nodes_compete_with_ready_ones() {
        // "b" is released by "a" and must precede the already-ready "c".
        let g = graph(&["a", "c", "b"], &[("a", "b")]);
        assert_eq!(order(&g).unwrap().ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn diamond() {
        let g = graph(
            &["start", "left", "right", "join"],
            &[("start", "right"), ("start", "left"), ("left", "join"), ("right", "join")],
        );
        let order = order(&g).unwrap();
        assert_eq!(order.ids, vec!["start", "left", "right", "join"]);
        assert_eq!(order.entry_candidates, vec!["start"]);
        assert_eq!(order.exit_candidates, vec!["join"]);
    }

    #[test]
    fn cycle_detected() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "b")]);
        assert_eq!(
            order(&g).unwrap_err(),
            GraphError::Cycle {
                ordered: 1,
                total: 3
            }
        );
    }

    #[test]
    fn self_loop_is_cycle() {
        let g = graph(&["a"], &[("a", "a")]);
        assert!(matches!(order(&g), Err(GraphError::Cycle { .. })));
    }

    #[test]
    fn parallel_edges_respected() {
        let g = graph(&["a", "b"], &[("a", "b"), ("a", "b")]);
        assert_eq!(order(&g).unwrap().ids, vec!["a", "b"]);
    }

    #[test]
    fn empty_graph() {
        let g = graph(&[], &[]);
        let order = order(&g).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.entry, None);
        assert_eq!(order.exit, None);
    }

    #[test]
    fn disconnected_nodes_are_both_entry_and_exit_candidates() {
        let g = graph(&["b", "a"], &[]);
        let order = order(&g).unwrap();
        assert_eq!(order.entry_candidates, vec!["a", "b"]);
        assert_eq!(order.entry.as_deref(), Some("a"));
        assert_eq!(order.exit.as_deref(), Some("b"));
    }
}
