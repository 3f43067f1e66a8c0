//! `README.md` for a generated bundle.

use serde_json::{Value, json};

use super::GENERATOR_VERSION;
use super::writer::DocWriter;
use crate::ir::types::PipelinePlan;
use crate::parse::types::{ParameterSpec, SkillDocument};

/// Example value shown for a parameter: its default, else a placeholder by
/// type tag.
pub fn example_value(param: &ParameterSpec) -> Value {
    if let Some(default) = &param.default {
        return default.clone();
    }
    match param.param_type.as_str() {
        "string" => json!(format!("example_{}", param.name)),
        "integer" => json!(10),
        "boolean" => json!(true),
        _ => Value::Null,
    }
}

pub fn gen_readme(doc: &SkillDocument, plan: &PipelinePlan) -> String {
    let meta = doc.metadata();
    let mut w = DocWriter::new();

    w.heading(1, &meta.name);
    w.line(&meta.description);
    w.blank();

    // Overview
    w.heading(2, "Overview");
    w.bullet(&format!("**Skill ID**: `{}`", meta.id));
    w.bullet(&format!("**Category**: {}", meta.category));
    w.bullet(&format!("**Tags**: {}", meta.tags.join(", ")));
    w.bullet(&format!("**Pipeline**: `{}`", plan.metadata.pipeline_name));
    w.blank();

    // Parameters
    w.heading(2, "Parameters");
    if doc.parameters().is_empty() {
        w.line("This skill takes no inputs.");
    } else {
        w.line("| Name | Type | Required | Example |");
        w.line("|------|------|----------|---------|");
        for param in doc.parameters() {
            w.line(&format!(
                "| `{}` | {} | {} | `{}` |",
                param.name,
                param.param_type,
                if param.required { "yes" } else { "no" },
                example_value(param)
            ));
        }
    }
    w.blank();

    // Generated files
    w.heading(2, "Generated Files");
    w.bullet("`plan.json` - Lowered pipeline plan");
    w.bullet("`manifest.json` - Project metadata and generation info");
    w.bullet("`README.md` - This file");
    w.blank();

    // Usage
    w.heading(2, "Usage");
    w.line("Save the inputs below as `inputs.json`:");
    w.blank();
    w.fenced("json", &format_input_example(doc.parameters()));
    w.blank();
    w.line("Then run the pipeline against the mock backend:");
    w.blank();
    w.fenced("sh", &format!("skillc run {}.yaml --inputs inputs.json", meta.id));
    w.blank();

    // Nodes
    w.heading(2, "Workflow Nodes");
    w.numbered(
        doc.nodes()
            .iter()
            .map(|n| format!("**{}** ({})", n.id, n.node_type)),
    );
    w.blank();

    // Order
    w.heading(2, "Execution Order");
    w.line("The nodes are executed in this topological order:");
    w.blank();
    w.numbered(&plan.order);
    w.blank();

    // Triggers
    w.heading(2, "Triggers");
    let keywords = &doc.skill.triggers.keywords;
    if keywords.is_empty() {
        w.line("No trigger keywords declared.");
    } else {
        w.line("This skill can be triggered by the following keywords:");
        w.blank();
        for keyword in keywords {
            w.bullet(keyword);
        }
    }
    w.blank();

    w.line("---");
    w.blank();
    w.line(&format!("*Generated by skillc v{}*", GENERATOR_VERSION));

    w.finish()
}

/// One `"name": value` line per parameter, in declaration order.
fn format_input_example(params: &[ParameterSpec]) -> String {
    let lines: Vec<String> = params
        .iter()
        .map(|p| format!("  \"{}\": {}", p.name, example_value(p)))
        .collect();
    if lines.is_empty() {
        "{}".to_string()
    } else {
        format!("{{\n{}\n}}", lines.join(",\n"))
    }
}
