//! Pipeline plan types.
//!
//! The plan bridges the validated workflow graph (input) and the interpreter
//! or artifact emitter (output). A DAG of typed nodes is lowered into a flat,
//! ordered sequence of steps whose placeholders are already typed variable
//! references, so nothing downstream scans strings for `{{...}}` again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::graph::NodeKind;
use crate::parse::types::ParameterSpec;

// =============================================================================
// TOP-LEVEL PLAN
// =============================================================================

/// Complete lowered form of a validated skill workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePlan {
    pub metadata: PlanMetadata,
    /// Declared inputs, in document order.
    pub parameters: Vec<ParameterSpec>,
    /// Step ids in execution order.
    pub order: Vec<String>,
    pub entry: Option<String>,
    pub exit: Option<String>,
    /// Steps in execution order.
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub skill_id: String,
    pub name: String,
    pub description: String,
    /// PascalCase pipeline type name, e.g. `WorkorderSearchWorkflow`.
    pub pipeline_name: String,
}

impl PipelinePlan {
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Names of required parameters.
    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }
}

// =============================================================================
// STEPS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub kind: NodeKind,
    /// Names visible when this step starts, sorted.
    pub scope: Vec<String>,
    pub operation: Operation,
    pub output: OutputBinding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    FunctionCall(FunctionCallOp),
    LlmCall(LlmCallOp),
    Visualize(VisualizeOp),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCallOp {
    pub target: CallTarget,
    pub params: BTreeMap<String, ParamExpr>,
}

/// What a function-call step invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum CallTarget {
    /// A named function from the backend's function library.
    Function(String),
    /// A remote endpoint path (`/api/...`).
    Endpoint(String),
}

impl CallTarget {
    pub const ENDPOINT_PREFIX: &'static str = "/api/";

    pub fn from_function_name(name: &str) -> Self {
        if name.starts_with(Self::ENDPOINT_PREFIX) {
            CallTarget::Endpoint(name.to_string())
        } else {
            CallTarget::Function(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CallTarget::Function(n) | CallTarget::Endpoint(n) => n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmCallOp {
    pub model: Option<String>,
    pub prompt: TextTemplate,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizeOp {
    pub component_type: String,
    /// Document template. Resolved in string-safe mode as a whole.
    pub template: Option<Value>,
}

/// Where a step's result lands in the pipeline state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputBinding {
    /// One declared output; receives the whole result.
    Single { name: String },
    /// Several declared outputs; each picks its key from a mapping result.
    Multiple { names: Vec<String> },
    /// No declared outputs; name inferred from the step id.
    Inferred { name: String },
}

impl OutputBinding {
    pub fn names(&self) -> Vec<&str> {
        match self {
            OutputBinding::Single { name } | OutputBinding::Inferred { name } => vec![name.as_str()],
            OutputBinding::Multiple { names } => names.iter().map(String::as_str).collect(),
        }
    }
}

// =============================================================================
// VARIABLE REFERENCES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Replace with the stored value itself, shape preserved.
    Structured,
    /// Replace with escaped canonical text.
    StringSafe,
}

/// A typed `{{name}}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarRef {
    pub name: String,
    pub mode: ResolutionMode,
}

impl VarRef {
    pub fn structured(name: impl Into<String>) -> Self {
        VarRef {
            name: name.into(),
            mode: ResolutionMode::Structured,
        }
    }

    pub fn string_safe(name: impl Into<String>) -> Self {
        VarRef {
            name: name.into(),
            mode: ResolutionMode::StringSafe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplatePart {
    Lit { value: String },
    Var { var: VarRef },
}

/// Text with embedded placeholders, split into literal and variable parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextTemplate {
    pub parts: Vec<TemplatePart>,
}

impl TextTemplate {
    pub fn vars(&self) -> impl Iterator<Item = &VarRef> {
        self.parts.iter().filter_map(|p| match p {
            TemplatePart::Var { var } => Some(var),
            TemplatePart::Lit { .. } => None,
        })
    }
}

/// A function-call parameter after lowering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamExpr {
    /// Passed through unchanged.
    Literal { value: Value },
    /// Whole-value `{{name}}`; resolves to the stored value.
    Ref { var: VarRef },
    /// Sequence whose elements resolve independently.
    List { items: Vec<ParamExpr> },
    /// Text with embedded placeholders, interpolated as canonical text.
    Text { template: TextTemplate },
    /// Mapping whose values resolve independently; keys stay literal.
    Map { entries: BTreeMap<String, ParamExpr> },
}

impl ParamExpr {
    pub fn literal(value: impl Into<Value>) -> Self {
        ParamExpr::Literal {
            value: value.into(),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        ParamExpr::Ref {
            var: VarRef::structured(name),
        }
    }

    /// Every variable reference inside this expression.
    pub fn vars(&self) -> Vec<&VarRef> {
        match self {
            ParamExpr::Literal { .. } => vec![],
            ParamExpr::Ref { var } => vec![var],
            ParamExpr::List { items } => items.iter().flat_map(ParamExpr::vars).collect(),
            ParamExpr::Text { template } => template.vars().collect(),
            ParamExpr::Map { entries } => entries.values().flat_map(ParamExpr::vars).collect(),
        }
    }
}
