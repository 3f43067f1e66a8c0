//! Step builder: walk the execution order and lower each node into a typed
//! plan step.
//! Match arms in `lower_operation` must track `NodeKind` in
//! `compiler/src/parse/graph.rs`.

use std::collections::BTreeMap;

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::parse::graph::{Node, NodeKind, WorkflowGraph};

use super::outputs::infer_output_name;
use super::reference::{parse_template, resolve_param_expr};
use super::scope::ScopeMap;
use super::topo::ExecutionOrder;

/// Build one step per node of `order`. Collects every failure.
pub fn build_steps(
    order: &ExecutionOrder,
    graph: &WorkflowGraph,
    scopes: &ScopeMap,
) -> Result<Vec<Step>, Vec<CompilerError>> {
    let mut steps = Vec::with_capacity(order.len());
    let mut errors = Vec::new();

    for node_id in order.iter() {
        let node = match graph.node(node_id) {
            Ok(n) => n,
            Err(e) => {
                errors.push(e.into());
                continue;
            }
        };

        match lower_operation(node) {
            Ok(operation) => steps.push(Step {
                id: node.id.clone(),
                kind: node.kind,
                scope: scopes.sorted_names(node_id),
                operation,
                output: output_binding(node),
            }),
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(steps)
    } else {
        Err(errors)
    }
}

fn lower_operation(node: &Node) -> Result<Operation, CompilerError> {
    let config = &node.config;
    let node_id = Some(node.id.clone());

    match node.kind {
        NodeKind::FunctionCall => {
            let name = config.function_name.as_deref().ok_or_else(|| {
                CompilerError::lower("L003", "function_call node has no function_name", node_id)
            })?;
            let params: BTreeMap<String, ParamExpr> = config
                .function_params
                .iter()
                .map(|(key, value)| (key.clone(), resolve_param_expr(value)))
                .collect();
            Ok(Operation::FunctionCall(FunctionCallOp {
                target: CallTarget::from_function_name(name),
                params,
            }))
        }
        NodeKind::LlmCall => {
            let prompt = config.prompt_template.as_deref().ok_or_else(|| {
                CompilerError::lower("L003", "llm_call node has no prompt_template", node_id)
            })?;
            Ok(Operation::LlmCall(LlmCallOp {
                model: config.model.clone(),
                prompt: parse_template(prompt, ResolutionMode::StringSafe),
                temperature: config.temperature,
            }))
        }
        NodeKind::Visualizer => {
            let component_type = config.component_type.clone().ok_or_else(|| {
                CompilerError::lower("L003", "visualizer node has no component_type", node_id)
            })?;
            Ok(Operation::Visualize(VisualizeOp {
                component_type,
                template: config.template.clone(),
            }))
        }
        NodeKind::UserApproval => Err(CompilerError::lower(
            "L001",
            format!("Node '{}': user_approval nodes are not yet supported", node.id),
            node_id,
        )),
    }
}

fn output_binding(node: &Node) -> OutputBinding {
    match node.declared_outputs.as_slice() {
        [] => OutputBinding::Inferred {
            name: infer_output_name(&node.id),
        },
        [single] => OutputBinding::Single {
            name: single.clone(),
        },
        many => OutputBinding::Multiple {
            names: many.to_vec(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::types::NodeConfig;

    fn node(id: &str, kind: NodeKind, outputs: &[&str]) -> Node {
        Node {
            id: id.into(),
            kind,
            config: NodeConfig::default(),
            declared_outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn binding_shapes() {
        assert_eq!(
            output_binding(&node("enrich_results", NodeKind::FunctionCall, &[])),
            OutputBinding::Inferred {
                name: "enriched_results".into()
            }
        );
        assert_eq!(
            output_binding(&node("x", NodeKind::FunctionCall, &["rows"])),
            OutputBinding::Single {
                name: "rows".into()
            }
        );
        assert_eq!(
            output_binding(&node("x", NodeKind::FunctionCall, &["a", "b"])).names(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn user_approval_rejected() {
        let err = lower_operation(&node("approve", NodeKind::UserApproval, &[])).unwrap_err();
        assert_eq!(err.code, "L001");
        assert_eq!(err.node_id.as_deref(), Some("approve"));
    }

    #[test]
    fn endpoint_target() {
        let mut n = node("fetch", NodeKind::FunctionCall, &[]);
        n.config.function_name = Some("/api/workorders/search".into());
        match lower_operation(&n).unwrap() {
            Operation::FunctionCall(op) => {
                assert_eq!(op.target, CallTarget::Endpoint("/api/workorders/search".into()))
            }
            other => panic!("Expected FunctionCall, got {:?}", other),
        }
    }
}
