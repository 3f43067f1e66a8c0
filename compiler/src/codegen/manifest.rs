//! `manifest.json` and the document fingerprint.

use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use super::{CodegenOptions, GENERATOR_VERSION};
use crate::ir::types::PipelinePlan;
use crate::parse::types::SkillDocument;

/// Bundle format version written into every manifest.
pub const MANIFEST_VERSION: &str = "1.0.0";

/// SHA-256 over the sorted-key compact JSON form of the document, truncated
/// to 16 hex characters.
pub fn fingerprint(doc: &SkillDocument) -> String {
    let value = serde_json::to_value(doc).unwrap_or(Value::Null);
    let canonical = sort_keys(value).to_string();
    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Rebuild every mapping with its keys in sorted order.
pub fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

pub fn gen_manifest(doc: &SkillDocument, plan: &PipelinePlan, opts: &CodegenOptions) -> Value {
    let meta = doc.metadata();
    sort_keys(json!({
        "skill_id": meta.id,
        "skill_name": meta.name,
        "version": MANIFEST_VERSION,
        "generated_at": opts.generated_at,
        "generator_version": GENERATOR_VERSION,
        "input_hash": fingerprint(doc),
        "metadata": {
            "description": meta.description,
            "category": meta.category,
            "tags": meta.tags,
        },
        "workflow": {
            "node_count": doc.nodes().len(),
            "edge_count": doc.edges().len(),
            "execution_order": plan.order,
        },
    }))
}

/// Pretty-printed `manifest.json` content.
pub fn gen_manifest_json(
    doc: &SkillDocument,
    plan: &PipelinePlan,
    opts: &CodegenOptions,
) -> String {
    let manifest = gen_manifest(doc, plan, opts);
    let mut out = serde_json::to_string_pretty(&manifest).unwrap_or_default();
    out.push('\n');
    out
}
