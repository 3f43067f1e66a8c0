//! Serde types mirroring the skill document schema.
//!
//! These types are the deserialization target for skill YAML/JSON files.
//! Node kinds stay raw strings here; the closed kind set is enforced when the
//! graph is built so the failure can name the offending node.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// TOP-LEVEL DOCUMENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDocument {
    pub skill: Skill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub metadata: SkillMetadata,
    #[serde(default)]
    pub triggers: Triggers,
    pub inputs: Inputs,
    pub workflow: WorkflowSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Triggers {
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

// =============================================================================
// WORKFLOW
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub config: NodeConfig,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
}

/// Union of every kind-specific config field. Which fields are required
/// depends on the node kind (see `validate::node_rules`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // function_call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Placeholders resolve at any depth, mapping values included.
    #[serde(default)]
    pub function_params: Map<String, Value>,

    // llm_call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    // visualizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source_node: String,
    pub target_node: String,
}

impl SkillDocument {
    pub fn metadata(&self) -> &SkillMetadata {
        &self.skill.metadata
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.skill.inputs.parameters
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.skill.workflow.nodes
    }

    pub fn edges(&self) -> &[EdgeSpec] {
        &self.skill.workflow.edges
    }
}
