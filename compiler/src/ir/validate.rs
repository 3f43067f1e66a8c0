//! Plan invariant validation.
//!
//! Validates that a `PipelinePlan` satisfies its structural and binding
//! invariants before it is emitted or executed.

use std::collections::HashSet;

use crate::ir::types::*;
use crate::lower::reference::extract_names;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
    /// The step ID where the error was found, if applicable.
    pub step_id: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step_id {
            Some(id) => write!(f, "[{}] {} (at step '{}')", self.code, self.message, id),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Validate a plan against all invariants. Returns all errors found.
pub fn validate_plan(plan: &PipelinePlan) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_non_empty(plan, &mut errors);
    validate_unique_step_ids(plan, &mut errors);
    validate_forward_bindings(plan, &mut errors);
    validate_entry_exit(plan, &mut errors);

    errors
}

// ---------------------------------------------------------------------------
// Invariant: the plan has at least one step
// ---------------------------------------------------------------------------

fn validate_non_empty(plan: &PipelinePlan, errors: &mut Vec<ValidationError>) {
    if plan.steps.is_empty() {
        errors.push(ValidationError {
            code: "E001",
            message: "Pipeline must contain at least one step".into(),
            step_id: None,
        });
    }
}

// ---------------------------------------------------------------------------
// Invariant: all step IDs are unique
// ---------------------------------------------------------------------------

fn validate_unique_step_ids(plan: &PipelinePlan, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for step in &plan.steps {
        if !seen.insert(step.id.as_str()) {
            errors.push(ValidationError {
                code: "E002",
                message: format!("Duplicate step ID '{}'", step.id),
                step_id: Some(step.id.clone()),
            });
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant: every reference is bound by a parameter or an earlier step
// ---------------------------------------------------------------------------

fn validate_forward_bindings(plan: &PipelinePlan, errors: &mut Vec<ValidationError>) {
    let mut scope: HashSet<&str> = plan.parameters.iter().map(|p| p.name.as_str()).collect();

    for step in &plan.steps {
        for name in referenced_names(step) {
            if !scope.contains(name.as_str()) {
                errors.push(ValidationError {
                    code: "E003",
                    message: format!(
                        "Step '{}' references variable '{}' which is not bound \
                         by a parameter or a prior step",
                        step.id, name
                    ),
                    step_id: Some(step.id.clone()),
                });
            }
        }

        // Outputs join the scope only after this step's refs are checked
        scope.extend(step.output.names());
    }
}

/// Every variable name a step reads, sorted and deduplicated.
pub fn referenced_names(step: &Step) -> Vec<String> {
    let mut names: Vec<String> = match &step.operation {
        Operation::FunctionCall(op) => op
            .params
            .values()
            .flat_map(ParamExpr::vars)
            .map(|v| v.name.clone())
            .collect(),
        Operation::LlmCall(op) => op.prompt.vars().map(|v| v.name.clone()).collect(),
        Operation::Visualize(op) => op
            .template
            .as_ref()
            .map(|t| extract_names(t).into_iter().collect())
            .unwrap_or_default(),
    };
    names.sort();
    names.dedup();
    names
}

// ---------------------------------------------------------------------------
// Invariant: entry and exit name real steps
// ---------------------------------------------------------------------------

fn validate_entry_exit(plan: &PipelinePlan, errors: &mut Vec<ValidationError>) {
    for (label, id) in [("Entry", &plan.entry), ("Exit", &plan.exit)] {
        if let Some(id) = id {
            if plan.step(id).is_none() {
                errors.push(ValidationError {
                    code: "E004",
                    message: format!("{} step '{}' does not exist in the plan", label, id),
                    step_id: Some(id.clone()),
                });
            }
        }
    }
}
