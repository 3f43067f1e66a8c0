//! Sequential interpreter for a `PipelinePlan`.
//!
//! Public API: `Executor::new(&plan, backend).run(inputs)`

pub mod backend;
pub mod resolve;
pub mod state;

use serde_json::{Map, Value, json};
use thiserror::Error;

pub use backend::{BackendError, LlmSettings, MockBackend, MockCall, StepBackend};
pub use resolve::{Resolver, StringSafeResolver, StructuredResolver, UnboundVariableError};
pub use state::PipelineState;

use crate::ir::types::*;
use resolve::TemplateError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Missing required input: {name}")]
    MissingInput { name: String },

    #[error("Step '{step}': {source}")]
    Unbound {
        step: String,
        #[source]
        source: UnboundVariableError,
    },

    #[error("Step '{step}': backend call failed: {source}")]
    Backend {
        step: String,
        #[source]
        source: BackendError,
    },

    #[error("Step '{step}': {source}")]
    Template {
        step: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RuntimeError {
    fn unbound(step: &Step, source: UnboundVariableError) -> Self {
        RuntimeError::Unbound {
            step: step.id.clone(),
            source,
        }
    }

    fn backend(step: &Step, source: BackendError) -> Self {
        RuntimeError::Backend {
            step: step.id.clone(),
            source,
        }
    }

    fn template(step: &Step, source: TemplateError) -> Self {
        match source {
            TemplateError::Unbound(e) => Self::unbound(step, e),
            TemplateError::Json(e) => RuntimeError::Template {
                step: step.id.clone(),
                source: e,
            },
        }
    }
}

/// Runs the steps of one plan, strictly in order, against a backend.
pub struct Executor<'p, B> {
    plan: &'p PipelinePlan,
    backend: B,
}

impl<'p, B: StepBackend> Executor<'p, B> {
    pub fn new(plan: &'p PipelinePlan, backend: B) -> Self {
        Executor { plan, backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Execute the plan. Each run owns a fresh state seeded from `inputs`.
    pub fn run(&mut self, inputs: Map<String, Value>) -> Result<PipelineState, RuntimeError> {
        let plan = self.plan;
        let mut state = self.initial_state(inputs)?;

        for step in &plan.steps {
            tracing::info!(step = %step.id, kind = %step.kind, "step started");
            let result = self.execute_step(step, &state)?;
            bind_outputs(step, result, &mut state);
            tracing::info!(step = %step.id, kind = %step.kind, "step finished");
        }

        Ok(state)
    }

    fn initial_state(&self, inputs: Map<String, Value>) -> Result<PipelineState, RuntimeError> {
        if let Some(name) = self.plan.required_inputs().find(|n| !inputs.contains_key(*n)) {
            return Err(RuntimeError::MissingInput {
                name: name.to_string(),
            });
        }

        let mut state: PipelineState = inputs.into_iter().collect();
        for param in &self.plan.parameters {
            if state.contains(&param.name) {
                continue;
            }
            if let Some(default) = &param.default {
                state.insert(param.name.clone(), default.clone());
            }
        }
        Ok(state)
    }

    fn execute_step(&mut self, step: &Step, state: &PipelineState) -> Result<Value, RuntimeError> {
        match &step.operation {
            Operation::FunctionCall(op) => {
                let params = resolve::resolve_params(&op.params, state)
                    .map_err(|e| RuntimeError::unbound(step, e))?;
                let result = match &op.target {
                    CallTarget::Function(name) => self.backend.call_function(name, &params),
                    CallTarget::Endpoint(path) => self.backend.call_api(path, &params),
                };
                result.map_err(|e| RuntimeError::backend(step, e))
            }
            Operation::LlmCall(op) => {
                let prompt = resolve::resolve_text(&op.prompt, state)
                    .map_err(|e| RuntimeError::unbound(step, e))?;
                let settings = LlmSettings {
                    model: op.model.clone(),
                    temperature: op.temperature,
                };
                self.backend
                    .call_llm(&prompt, &settings)
                    .map_err(|e| RuntimeError::backend(step, e))
            }
            Operation::Visualize(op) => {
                let template = op.template.clone().unwrap_or(Value::Null);
                let resolved = resolve::resolve_document(&template, state)
                    .map_err(|e| RuntimeError::template(step, e))?;
                let payload = json!({
                    "component_type": op.component_type,
                    "template": template,
                    "resolved_template": resolved,
                });
                self.backend
                    .visualize(&payload)
                    .map_err(|e| RuntimeError::backend(step, e))
            }
        }
    }
}

/// Store a step result under its output names.
fn bind_outputs(step: &Step, result: Value, state: &mut PipelineState) {
    match &step.output {
        OutputBinding::Single { name } | OutputBinding::Inferred { name } => {
            bind(step, name, result, state);
        }
        OutputBinding::Multiple { names } => {
            for name in names {
                let value = match result.get(name.as_str()) {
                    Some(field) if result.is_object() => field.clone(),
                    _ => result.clone(),
                };
                bind(step, name, value, state);
            }
        }
    }
}

fn bind(step: &Step, name: &str, value: Value, state: &mut PipelineState) {
    if state.insert(name, value).is_some() {
        tracing::warn!(step = %step.id, name, "output rebinds an existing state entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::graph::NodeKind;
    use crate::parse::types::ParameterSpec;
    use std::collections::BTreeMap;

    fn param(name: &str, required: bool, default: Option<Value>) -> ParameterSpec {
        ParameterSpec {
            name: name.into(),
            param_type: "integer".into(),
            required,
            default,
        }
    }

    fn plan(parameters: Vec<ParameterSpec>, steps: Vec<Step>) -> PipelinePlan {
        PipelinePlan {
            metadata: PlanMetadata {
                skill_id: "t".into(),
                name: "T".into(),
                description: String::new(),
                pipeline_name: "TWorkflow".into(),
            },
            parameters,
            order: steps.iter().map(|s| s.id.clone()).collect(),
            entry: steps.first().map(|s| s.id.clone()),
            exit: steps.last().map(|s| s.id.clone()),
            steps,
        }
    }

    fn call(id: &str, params: &[(&str, ParamExpr)], output: OutputBinding) -> Step {
        Step {
            id: id.into(),
            kind: NodeKind::FunctionCall,
            scope: vec![],
            operation: Operation::FunctionCall(FunctionCallOp {
                target: CallTarget::Function("Fn".into()),
                params: params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect::<BTreeMap<_, _>>(),
            }),
            output,
        }
    }

    #[test]
    fn missing_required_input() {
        let p = plan(vec![param("limit", true, None)], vec![]);
        let err = Executor::new(&p, MockBackend::new("s")).run(Map::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingInput { ref name } if name == "limit"));
    }

    #[test]
    fn defaults_fill_absent_optional_inputs() {
        let p = plan(vec![param("limit", false, Some(json!(10)))], vec![]);
        let state = Executor::new(&p, MockBackend::new("s")).run(Map::new()).unwrap();
        assert_eq!(state.get("limit"), Some(&json!(10)));
    }

    #[test]
    fn undeclared_inputs_are_kept() {
        let p = plan(vec![], vec![]);
        let mut inputs = Map::new();
        inputs.insert("extra".into(), json!("x"));
        let state = Executor::new(&p, MockBackend::new("s")).run(inputs).unwrap();
        assert_eq!(state.get("extra"), Some(&json!("x")));
    }

    #[test]
    fn multiple_outputs_pick_keys() {
        let p = plan(
            vec![],
            vec![call(
                "fetch",
                &[],
                OutputBinding::Multiple {
                    names: vec!["function".into(), "absent".into()],
                },
            )],
        );
        let state = Executor::new(&p, MockBackend::new("s")).run(Map::new()).unwrap();
        assert_eq!(state.get("function"), Some(&json!("Fn")));
        // Key missing from the result: the whole result is stored.
        assert_eq!(state.get("absent").and_then(|v| v.get("function")), Some(&json!("Fn")));
    }

    #[test]
    fn unbound_reference_names_step() {
        let p = plan(
            vec![],
            vec![call(
                "fetch",
                &[("q", ParamExpr::var("nope"))],
                OutputBinding::Inferred {
                    name: "fetch".into(),
                },
            )],
        );
        let err = Executor::new(&p, MockBackend::new("s")).run(Map::new()).unwrap_err();
        match err {
            RuntimeError::Unbound { step, source } => {
                assert_eq!(step, "fetch");
                assert_eq!(source.name, "nope");
            }
            other => panic!("Expected Unbound, got {:?}", other),
        }
    }
}
