//! Per-node configuration validation.
//! Match arms here must track `NodeKind` in `compiler/src/parse/graph.rs`.

use crate::error::CompilerError;
use crate::parse::graph::{Node, NodeKind};

/// Validate a single node's config. Returns all errors found.
pub fn validate_node_config(node: &Node) -> Vec<CompilerError> {
    let mut errors = Vec::new();
    let node_id = Some(node.id.clone());
    let config = &node.config;

    match node.kind {
        NodeKind::FunctionCall => {
            if is_blank(config.function_name.as_deref()) {
                errors.push(CompilerError::config(
                    "C001",
                    format!("Node '{}' (function_call) requires a function_name", node.id),
                    node_id,
                ));
            }
        }
        NodeKind::LlmCall => {
            if is_blank(config.prompt_template.as_deref()) {
                errors.push(CompilerError::config(
                    "C002",
                    format!("Node '{}' (llm_call) requires a prompt_template", node.id),
                    node_id,
                ));
            }
        }
        NodeKind::Visualizer => {
            if is_blank(config.component_type.as_deref()) {
                errors.push(CompilerError::config(
                    "C003",
                    format!("Node '{}' (visualizer) requires a component_type", node.id),
                    node_id,
                ));
            }
        }
        // No required fields.
        NodeKind::UserApproval => {}
    }

    errors
}

fn is_blank(field: Option<&str>) -> bool {
    field.is_none_or(|s| s.trim().is_empty())
}
