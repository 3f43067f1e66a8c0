//! WASM entry points for browser use.

use wasm_bindgen::prelude::*;

use crate::codegen::{self, CodegenOptions};
use crate::error::CompilerError;

/// Validate a skill YAML: parse + graph validation.
/// Returns a JSON array of CompilerError objects.
#[wasm_bindgen]
pub fn validate_skill(yaml: &str) -> JsValue {
    let result = validate_skill_inner(yaml);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_skill_inner(yaml: &str) -> Vec<ErrorDto> {
    let (_, graph) = match crate::parse::parse_and_build(yaml) {
        Ok(parsed) => parsed,
        Err(errors) => return errors.into_iter().map(ErrorDto::from).collect(),
    };

    crate::validate::validate(&graph)
        .into_iter()
        .map(ErrorDto::from)
        .collect()
}

/// Full pipeline: parse → validate → lower → plan validate → codegen.
/// Returns a JSON object with either `files` (success) or `errors` (failure).
#[wasm_bindgen]
pub fn compile_skill(yaml: &str) -> JsValue {
    let result = compile_skill_inner(yaml, &CodegenOptions::now());
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_skill_inner(yaml: &str, opts: &CodegenOptions) -> CompileResult {
    let doc = match crate::parse::parse_yaml(yaml) {
        Ok(d) => d,
        Err(errors) => {
            return CompileResult::Errors {
                errors: errors.into_iter().map(ErrorDto::from).collect(),
            };
        }
    };

    let plan = match crate::compile_document(&doc) {
        Ok(p) => p,
        Err(errors) => {
            return CompileResult::Errors {
                errors: errors.into_iter().map(ErrorDto::from).collect(),
            };
        }
    };

    let output = codegen::codegen(&doc, &plan, opts);

    CompileResult::Success {
        files: output
            .files
            .into_iter()
            .map(|f| FileDto {
                path: f.path,
                content: f.content,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ErrorDto {
    code: String,
    phase: String,
    kind: String,
    message: String,
    node_id: Option<String>,
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            kind: e.kind.to_string(),
            message: e.message,
            node_id: e.node_id,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct FileDto {
    path: String,
    content: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status")]
enum CompileResult {
    #[serde(rename = "success")]
    Success { files: Vec<FileDto> },
    #[serde(rename = "errors")]
    Errors { errors: Vec<ErrorDto> },
}
