//! Output-name resolution for nodes.
//!
//! Nodes that declare outputs publish exactly those names. Nodes that do not
//! publish one name inferred from their id by swapping a leading verb for its
//! past participle (`enrich_results` → `enriched_results`).

use crate::parse::graph::Node;

/// Leading-verb substitutions applied to the first `_`-delimited token.
pub const VERB_TABLE: &[(&str, &str)] = &[
    ("enrich", "enriched"),
    ("summarize", "summarized"),
    ("process", "processed"),
    ("transform", "transformed"),
];

/// Infer the output variable name for a node that declares no outputs.
pub fn infer_output_name(node_id: &str) -> String {
    if let Some((verb, rest)) = node_id.split_once('_') {
        if let Some((_, participle)) = VERB_TABLE.iter().find(|(v, _)| *v == verb) {
            return format!("{participle}_{rest}");
        }
    }
    node_id.to_string()
}

/// Names a node publishes into the pipeline state once it has run.
pub fn output_names(node: &Node) -> Vec<String> {
    if node.declared_outputs.is_empty() {
        vec![infer_output_name(&node.id)]
    } else {
        node.declared_outputs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_verbs() {
        assert_eq!(infer_output_name("enrich_results"), "enriched_results");
        assert_eq!(infer_output_name("summarize_findings"), "summarized_findings");
        assert_eq!(infer_output_name("process_batch_items"), "processed_batch_items");
        assert_eq!(infer_output_name("transform_rows"), "transformed_rows");
    }

    #[test]
    fn unknown_verb_keeps_id() {
        assert_eq!(infer_output_name("vector_search"), "vector_search");
        assert_eq!(infer_output_name("display_results"), "display_results");
    }

    #[test]
    fn single_token_keeps_id() {
        assert_eq!(infer_output_name("enrich"), "enrich");
        assert_eq!(infer_output_name("fetch"), "fetch");
    }

    #[test]
    fn verb_must_match_whole_token() {
        assert_eq!(infer_output_name("enrichment_data"), "enrichment_data");
    }
}
