//! Parse `{{name}}` placeholders into typed variable references.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::ir::types::*;
use crate::parse::types::NodeConfig;

/// A single placeholder anywhere in a string.
pub static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid regex"));

/// A string consisting of exactly one placeholder.
static WHOLE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{(\w+)\}\}$").expect("valid regex"));

/// Variable names referenced by any string leaf of `value`, recursing through
/// mappings and sequences. Keys are not scanned.
pub fn extract_names(value: &Value) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_names(value, &mut names);
    names
}

fn collect_names(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => {
            names.extend(TOKEN.captures_iter(s).map(|c| c[1].to_string()));
        }
        Value::Array(items) => items.iter().for_each(|v| collect_names(v, names)),
        Value::Object(map) => map.values().for_each(|v| collect_names(v, names)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Variable names referenced anywhere inside a node config.
pub fn config_references(config: &NodeConfig) -> BTreeSet<String> {
    let value = serde_json::to_value(config).unwrap_or_default();
    extract_names(&value)
}

/// The variable name when `s` is exactly one placeholder.
pub fn whole_token(s: &str) -> Option<&str> {
    WHOLE_TOKEN
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Split text into literal and placeholder parts. Every placeholder gets
/// `mode`.
pub fn parse_template(input: &str, mode: ResolutionMode) -> TextTemplate {
    let mut parts = Vec::new();
    let mut last = 0;

    for caps in TOKEN.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            parts.push(TemplatePart::Lit {
                value: input[last..whole.start()].to_string(),
            });
        }
        parts.push(TemplatePart::Var {
            var: VarRef {
                name: name.as_str().to_string(),
                mode,
            },
        });
        last = whole.end();
    }

    if last < input.len() {
        parts.push(TemplatePart::Lit {
            value: input[last..].to_string(),
        });
    }

    TextTemplate { parts }
}

/// Lower one function-call parameter value.
///
/// Whole-value placeholders become structured references and sequences lower
/// element by element. Strings embedding placeholders become text templates
/// interpolated without escaping, since the callee receives plain data.
/// Mappings that reference variables lower value by value; any other value is
/// literal.
pub fn resolve_param_expr(value: &Value) -> ParamExpr {
    match value {
        Value::String(s) => resolve_param_string(s),
        Value::Array(items) => ParamExpr::List {
            items: items.iter().map(resolve_param_expr).collect(),
        },
        Value::Object(map) if !extract_names(value).is_empty() => ParamExpr::Map {
            entries: map
                .iter()
                .map(|(key, v)| (key.clone(), resolve_param_expr(v)))
                .collect(),
        },
        other => ParamExpr::Literal {
            value: other.clone(),
        },
    }
}

fn resolve_param_string(s: &str) -> ParamExpr {
    if let Some(name) = whole_token(s) {
        return ParamExpr::var(name);
    }

    if TOKEN.is_match(s) {
        return ParamExpr::Text {
            template: parse_template(s, ResolutionMode::Structured),
        };
    }

    ParamExpr::literal(s)
}
