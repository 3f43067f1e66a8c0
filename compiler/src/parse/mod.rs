//! Parse phase: YAML/JSON → Rust types + graph construction.

pub mod graph;
pub mod types;

use std::path::Path;

pub use graph::{Edge, Node, NodeKind, WorkflowGraph};
pub use types::*;

use crate::error::CompilerError;

/// Deserialize a skill YAML string into a `SkillDocument`.
pub fn parse_yaml(yaml: &str) -> Result<SkillDocument, Vec<CompilerError>> {
    serde_yaml::from_str::<SkillDocument>(yaml).map_err(|e| {
        vec![CompilerError::parse(
            "P001",
            format!("Failed to parse skill YAML: {}", e),
        )]
    })
}

/// Deserialize a skill JSON string into a `SkillDocument`.
pub fn parse_json(json: &str) -> Result<SkillDocument, Vec<CompilerError>> {
    serde_json::from_str::<SkillDocument>(json).map_err(|e| {
        vec![CompilerError::parse(
            "P001",
            format!("Failed to parse skill JSON: {}", e),
        )]
    })
}

/// Read and parse a skill file. `.json` files are read as JSON, anything
/// else as YAML.
pub fn parse_file(path: impl AsRef<Path>) -> Result<SkillDocument, Vec<CompilerError>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        vec![CompilerError::parse(
            "P003",
            format!("Failed to read '{}': {}", path.display(), e),
        )]
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_json(&content)
    } else {
        parse_yaml(&content)
    }
}

/// Parse YAML and build the graph in one step.
pub fn parse_and_build(yaml: &str) -> Result<(SkillDocument, WorkflowGraph), Vec<CompilerError>> {
    let doc = parse_yaml(yaml)?;
    let graph = WorkflowGraph::from_document(&doc).map_err(|e| vec![CompilerError::from(e)])?;
    Ok((doc, graph))
}
