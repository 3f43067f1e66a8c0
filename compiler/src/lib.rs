pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod lower;
pub mod parse;
pub mod runtime;
pub mod validate;
pub mod wasm;

use error::CompilerError;
use ir::PipelinePlan;
use parse::{SkillDocument, WorkflowGraph};

/// Graph build → validate → lower → plan validate.
pub fn compile_document(doc: &SkillDocument) -> Result<PipelinePlan, Vec<CompilerError>> {
    let graph = WorkflowGraph::from_document(doc).map_err(|e| vec![CompilerError::from(e)])?;

    validate::validate(&graph).into_result()?;

    let plan = lower::lower(doc, &graph)?;

    let plan_errors = ir::validate_plan(&plan);
    if !plan_errors.is_empty() {
        return Err(plan_errors.into_iter().map(CompilerError::from).collect());
    }

    Ok(plan)
}
