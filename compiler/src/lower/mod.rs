//! Lowering phase: validated workflow graph → `PipelinePlan`.
//!
//! Transforms the parsed skill document into the plan consumed by the
//! interpreter and the artifact emitter.

pub mod builder;
pub mod outputs;
pub mod reference;
pub mod scope;
pub mod topo;

use crate::error::CompilerError;
use crate::ir::types::*;
use crate::parse::graph::WorkflowGraph;
use crate::parse::types::SkillDocument;

/// Lower a parsed document + graph into a `PipelinePlan`.
///
/// The graph must already have passed `validate::validate`.
pub fn lower(
    doc: &SkillDocument,
    graph: &WorkflowGraph,
) -> Result<PipelinePlan, Vec<CompilerError>> {
    // 1. Topological sort
    let order = topo::order(graph).map_err(|e| vec![CompilerError::from(e)])?;

    // 2. Scope per node
    let scopes = scope::scopes(graph, &order);

    // 3. Steps
    let steps = builder::build_steps(&order, graph, &scopes)?;

    // 4. Assemble plan
    let meta = doc.metadata();
    let plan = PipelinePlan {
        metadata: PlanMetadata {
            skill_id: meta.id.clone(),
            name: meta.name.clone(),
            description: meta.description.clone(),
            pipeline_name: pipeline_name(&meta.id),
        },
        parameters: doc.parameters().to_vec(),
        order: order.ids.clone(),
        entry: order.entry.clone(),
        exit: order.exit.clone(),
        steps,
    };

    tracing::debug!(
        skill = %plan.metadata.skill_id,
        steps = plan.steps.len(),
        "plan lowered"
    );

    Ok(plan)
}

/// `workorder_search` → `WorkorderSearchWorkflow`.
pub fn pipeline_name(skill_id: &str) -> String {
    let mut name: String = skill_id.split('_').map(capitalize).collect();
    name.push_str("Workflow");
    name
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
