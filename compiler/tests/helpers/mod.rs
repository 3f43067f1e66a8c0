#![allow(dead_code)]

use compiler::error::CompilerError;
use compiler::parse::{
    self, EdgeSpec, NodeConfig, NodeSpec, ParameterSpec, SkillDocument, WorkflowGraph,
};

// =============================================================================
// Fixtures
// =============================================================================

pub const SAMPLE: &str = include_str!("../fixtures/workorder_similarity_search.yaml");
pub const DUPLICATE_IDS: &str = include_str!("../fixtures/duplicate_ids.yaml");
pub const GHOST_EDGE: &str = include_str!("../fixtures/ghost_edge.yaml");
pub const CYCLE: &str = include_str!("../fixtures/cycle.yaml");
pub const UNDEFINED_VAR: &str = include_str!("../fixtures/undefined_var.yaml");
pub const MISSING_CONFIG: &str = include_str!("../fixtures/missing_config.yaml");
pub const USER_APPROVAL: &str = include_str!("../fixtures/user_approval.yaml");

pub const SAMPLE_ORDER: [&str; 5] = [
    "generate_embedding",
    "vector_search",
    "enrich_results",
    "summarize_findings",
    "display_results",
];

/// Parse a fixture and build its graph, panicking on failure.
pub fn load(yaml: &str) -> (SkillDocument, WorkflowGraph) {
    parse::parse_and_build(yaml).expect("fixture should parse and build")
}

pub fn codes(errors: &[CompilerError]) -> Vec<&str> {
    errors.iter().map(|e| e.code.as_str()).collect()
}

// =============================================================================
// Graph builders
// =============================================================================

/// A `function_call` node with a function name and no params.
pub fn call(id: &str) -> NodeSpec {
    NodeSpec {
        id: id.into(),
        node_type: "function_call".into(),
        config: NodeConfig {
            function_name: Some(format!("Fn_{id}")),
            ..NodeConfig::default()
        },
        outputs: vec![],
    }
}

pub fn edge(source: &str, target: &str) -> EdgeSpec {
    EdgeSpec {
        source_node: source.into(),
        target_node: target.into(),
    }
}

pub fn param(name: &str) -> ParameterSpec {
    ParameterSpec {
        name: name.into(),
        param_type: "string".into(),
        required: true,
        default: None,
    }
}

/// Graph of `function_call` nodes named `n0..n{count}` with edges given by
/// index pairs.
pub fn indexed_graph(count: usize, edges: &[(usize, usize)]) -> WorkflowGraph {
    let nodes: Vec<NodeSpec> = (0..count).map(|i| call(&format!("n{i}"))).collect();
    let edges: Vec<EdgeSpec> = edges
        .iter()
        .map(|(s, t)| edge(&format!("n{s}"), &format!("n{t}")))
        .collect();
    WorkflowGraph::build(&nodes, &edges, &[]).expect("function_call nodes always build")
}
