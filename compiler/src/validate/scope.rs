//! Placeholder visibility checks (V001).

use crate::error::CompilerError;
use crate::lower::reference::config_references;
use crate::lower::scope::ScopeMap;
use crate::lower::topo::ExecutionOrder;
use crate::parse::graph::WorkflowGraph;

/// Every `{{name}}` in a node's config must be visible at that node.
/// Errors follow execution order, names sorted within a node.
pub fn validate_references(
    graph: &WorkflowGraph,
    order: &ExecutionOrder,
    scopes: &ScopeMap,
) -> Vec<CompilerError> {
    let mut errors = Vec::new();

    for node_id in order.iter() {
        let Ok(node) = graph.node(node_id) else {
            continue;
        };

        for name in config_references(&node.config) {
            if scopes.is_visible(node_id, &name) {
                continue;
            }
            errors.push(CompilerError::scope(
                "V001",
                format!(
                    "Node '{}' references undefined variable '{}'. Available: [{}]",
                    node_id,
                    name,
                    scopes.sorted_names(node_id).join(", ")
                ),
                Some(node_id.to_string()),
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::{scope, topo};
    use crate::parse::types::{EdgeSpec, NodeConfig, NodeSpec, ParameterSpec};
    use serde_json::json;

    #[test]
    fn reports_missing_names_with_available_set() {
        let nodes = [
            NodeSpec {
                id: "fetch".into(),
                node_type: "function_call".into(),
                config: NodeConfig {
                    function_name: Some("Fetch".into()),
                    function_params: serde_json::from_value(
                        json!({"q": "{{query}}", "n": "{{zeta}}", "m": "{{alpha}}"}),
                    )
                    .unwrap(),
                    ..NodeConfig::default()
                },
                outputs: vec![],
            },
            NodeSpec {
                id: "show".into(),
                node_type: "visualizer".into(),
                config: NodeConfig {
                    component_type: Some("table".into()),
                    template: Some(json!({"rows": "{{fetch}}"})),
                    ..NodeConfig::default()
                },
                outputs: vec![],
            },
        ];
        let edges = [EdgeSpec {
            source_node: "fetch".into(),
            target_node: "show".into(),
        }];
        let params = [ParameterSpec {
            name: "query".into(),
            param_type: "string".into(),
            required: true,
            default: None,
        }];
        let graph = WorkflowGraph::build(&nodes, &edges, &params).unwrap();
        let order = topo::order(&graph).unwrap();
        let scopes = scope::scopes(&graph, &order);

        let errors = validate_references(&graph, &order, &scopes);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[0].message,
            "Node 'fetch' references undefined variable 'alpha'. Available: [query]"
        );
        assert!(errors[1].message.contains("'zeta'"));
        assert!(errors.iter().all(|e| e.code == "V001"));
    }
}
