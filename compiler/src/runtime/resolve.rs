//! Variable resolution protocol.
//!
//! Two modes over the shared pipeline state:
//!
//! - **Structured**: a whole-value `{{name}}` is replaced by the stored value
//!   itself, shape preserved. Used for function-call parameters; a parameter
//!   string embedding placeholders in other text gets their canonical text,
//!   unescaped.
//! - **String-safe**: the stored value is rendered to its canonical text and
//!   escaped so it can sit inside a quoted string. Used for prompts and
//!   document templates.

use serde_json::{Map, Value};
use thiserror::Error;

use super::state::PipelineState;
use crate::ir::types::{ParamExpr, ResolutionMode, TemplatePart, TextTemplate, VarRef};
use crate::lower::reference::TOKEN;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Variable '{name}' not found in state. Available: [{}]", .bound.join(", "))]
pub struct UnboundVariableError {
    pub name: String,
    /// Names bound at the time of the lookup, sorted.
    pub bound: Vec<String>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Unbound(#[from] UnboundVariableError),

    #[error("resolved template is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// RESOLVERS
// =============================================================================

pub trait Resolver {
    fn mode(&self) -> ResolutionMode;

    fn resolve(&self, name: &str, state: &PipelineState) -> Result<Value, UnboundVariableError>;
}

pub struct StructuredResolver;

impl Resolver for StructuredResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::Structured
    }

    fn resolve(&self, name: &str, state: &PipelineState) -> Result<Value, UnboundVariableError> {
        state.require(name).cloned()
    }
}

pub struct StringSafeResolver;

impl Resolver for StringSafeResolver {
    fn mode(&self) -> ResolutionMode {
        ResolutionMode::StringSafe
    }

    fn resolve(&self, name: &str, state: &PipelineState) -> Result<Value, UnboundVariableError> {
        let value = state.require(name)?;
        Ok(Value::String(escape(&canonical_text(value))))
    }
}

pub fn resolver_for(mode: ResolutionMode) -> &'static dyn Resolver {
    match mode {
        ResolutionMode::Structured => &StructuredResolver,
        ResolutionMode::StringSafe => &StringSafeResolver,
    }
}

pub fn resolve_var(var: &VarRef, state: &PipelineState) -> Result<Value, UnboundVariableError> {
    resolver_for(var.mode).resolve(&var.name, state)
}

// =============================================================================
// TEXT FORMS
// =============================================================================

/// Mappings and sequences → compact JSON; booleans and numbers → literal;
/// strings → themselves; null → `null`.
pub fn canonical_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Escape `\`, `"`, newline, carriage return and tab, in that order.
pub fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn into_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => canonical_text(&other),
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Render a text template (prompt or parameter interpolation).
pub fn resolve_text(
    template: &TextTemplate,
    state: &PipelineState,
) -> Result<String, UnboundVariableError> {
    let mut out = String::new();
    for part in &template.parts {
        match part {
            TemplatePart::Lit { value } => out.push_str(value),
            TemplatePart::Var { var } => out.push_str(&into_text(resolve_var(var, state)?)),
        }
    }
    Ok(out)
}

pub fn resolve_param(
    expr: &ParamExpr,
    state: &PipelineState,
) -> Result<Value, UnboundVariableError> {
    match expr {
        ParamExpr::Literal { value } => Ok(value.clone()),
        ParamExpr::Ref { var } => resolve_var(var, state),
        ParamExpr::List { items } => items
            .iter()
            .map(|item| resolve_param(item, state))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ParamExpr::Text { template } => resolve_text(template, state).map(Value::String),
        ParamExpr::Map { entries } => entries
            .iter()
            .map(|(key, expr)| Ok((key.clone(), resolve_param(expr, state)?)))
            .collect::<Result<Map<_, _>, UnboundVariableError>>()
            .map(Value::Object),
    }
}

/// Resolve every call parameter, keyed by parameter name.
pub fn resolve_params<'a>(
    params: impl IntoIterator<Item = (&'a String, &'a ParamExpr)>,
    state: &PipelineState,
) -> Result<Map<String, Value>, UnboundVariableError> {
    params
        .into_iter()
        .map(|(key, expr)| Ok((key.clone(), resolve_param(expr, state)?)))
        .collect()
}

/// Resolve a document template in string-safe mode.
///
/// Each string leaf holding placeholders is encoded as a JSON string literal,
/// its placeholders replaced by escaped canonical text, and the literal
/// parsed back. Mapping keys are left untouched.
pub fn resolve_document(template: &Value, state: &PipelineState) -> Result<Value, TemplateError> {
    match template {
        Value::String(s) => resolve_document_string(s, state).map(Value::String),
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_document(item, state))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| Ok((key.clone(), resolve_document(value, state)?)))
            .collect::<Result<Map<_, _>, TemplateError>>()
            .map(Value::Object),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(template.clone()),
    }
}

fn resolve_document_string(s: &str, state: &PipelineState) -> Result<String, TemplateError> {
    if !TOKEN.is_match(s) {
        return Ok(s.to_string());
    }
    let encoded = serde_json::to_string(s)?;
    let substituted = substitute(&encoded, &StringSafeResolver, state)?;
    Ok(serde_json::from_str(&substituted)?)
}

/// Replace every placeholder in `text` using `resolver`.
fn substitute(
    text: &str,
    resolver: &dyn Resolver,
    state: &PipelineState,
) -> Result<String, UnboundVariableError> {
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;

    for caps in TOKEN.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        out.push_str(&text[last..whole.start()]);
        out.push_str(&into_text(resolver.resolve(name.as_str(), state)?));
        last = whole.end();
    }
    out.push_str(&text[last..]);

    Ok(out)
}
