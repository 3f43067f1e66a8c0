//! petgraph-backed graph model for a skill workflow.
//!
//! The model keeps the document's raw node and edge lists (duplicates and
//! dangling edges included, so the validator can report them) next to a
//! `DiGraph` over the distinct node ids that holds only resolvable edges.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use super::types::{EdgeSpec, NodeConfig, NodeSpec, ParameterSpec, SkillDocument};
use crate::error::GraphError;

/// The closed set of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    FunctionCall,
    LlmCall,
    Visualizer,
    UserApproval,
}

impl NodeKind {
    pub const ALL: [NodeKind; 4] = [
        NodeKind::FunctionCall,
        NodeKind::LlmCall,
        NodeKind::Visualizer,
        NodeKind::UserApproval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::FunctionCall => "function_call",
            NodeKind::LlmCall => "llm_call",
            NodeKind::Visualizer => "visualizer",
            NodeKind::UserApproval => "user_approval",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| GraphError::Schema {
                message: format!(
                    "Node type must be one of [{}], got '{}'",
                    NodeKind::ALL.map(|k| k.as_str()).join(", "),
                    s
                ),
                node_id: None,
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub config: NodeConfig,
    /// Declared output names, in document order. Empty means inferred.
    pub declared_outputs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

#[derive(Debug)]
pub struct WorkflowGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    parameters: Vec<ParameterSpec>,
    graph: DiGraph<String, ()>,
    node_indices: HashMap<String, NodeIndex>,
    /// id → position of its first occurrence in `nodes`.
    first_position: HashMap<String, usize>,
}

impl WorkflowGraph {
    pub fn build(
        nodes: &[NodeSpec],
        edges: &[EdgeSpec],
        parameters: &[ParameterSpec],
    ) -> Result<Self, GraphError> {
        let mut model_nodes = Vec::with_capacity(nodes.len());
        for spec in nodes {
            let kind = spec.node_type.parse::<NodeKind>().map_err(|e| match e {
                GraphError::Schema { message, .. } => GraphError::Schema {
                    message: format!("Node '{}': {}", spec.id, message),
                    node_id: Some(spec.id.clone()),
                },
                other => other,
            })?;
            model_nodes.push(Node {
                id: spec.id.clone(),
                kind,
                config: spec.config.clone(),
                declared_outputs: spec.outputs.iter().map(|o| o.name.clone()).collect(),
            });
        }

        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut first_position = HashMap::new();

        for (pos, node) in model_nodes.iter().enumerate() {
            if node_indices.contains_key(&node.id) {
                continue;
            }
            let idx = graph.add_node(node.id.clone());
            node_indices.insert(node.id.clone(), idx);
            first_position.insert(node.id.clone(), pos);
        }

        let model_edges: Vec<Edge> = edges
            .iter()
            .map(|e| Edge {
                source: e.source_node.clone(),
                target: e.target_node.clone(),
            })
            .collect();

        // Dangling edges stay in the raw list but never enter the graph.
        for edge in &model_edges {
            if let (Some(&s), Some(&t)) = (
                node_indices.get(&edge.source),
                node_indices.get(&edge.target),
            ) {
                graph.add_edge(s, t, ());
            }
        }

        Ok(WorkflowGraph {
            nodes: model_nodes,
            edges: model_edges,
            parameters: parameters.to_vec(),
            graph,
            node_indices,
            first_position,
        })
    }

    pub fn from_document(doc: &SkillDocument) -> Result<Self, GraphError> {
        Self::build(doc.nodes(), doc.edges(), doc.parameters())
    }

    /// Look up a node by id. Duplicated ids resolve to the first occurrence.
    pub fn node(&self, id: &str) -> Result<&Node, GraphError> {
        self.first_position
            .get(id)
            .map(|&pos| &self.nodes[pos])
            .ok_or_else(|| GraphError::NotFound { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Every node as it appeared in the document, duplicates included.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Every edge as it appeared in the document, dangling ones included.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Distinct node ids in first-occurrence order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    pub fn distinct_node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Successor ids, one entry per edge (parallel edges repeat).
    pub fn successors(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    pub fn predecessors(&self, node_id: &str) -> Vec<&str> {
        self.neighbors(node_id, Direction::Incoming)
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        self.degree(node_id, Direction::Incoming)
    }

    pub fn outgoing_count(&self, node_id: &str) -> usize {
        self.degree(node_id, Direction::Outgoing)
    }

    fn neighbors(&self, node_id: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    fn degree(&self, node_id: &str, dir: Direction) -> usize {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return 0;
        };
        self.graph.edges_directed(idx, dir).count()
    }
}
