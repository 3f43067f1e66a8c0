//! Unified compiler error type used across all phases.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ir::validate::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Parse,
    Validate,
    Lower,
    PlanValidate,
    Codegen,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Validate => write!(f, "Validate"),
            Phase::Lower => write!(f, "Lower"),
            Phase::PlanValidate => write!(f, "Plan Validate"),
            Phase::Codegen => write!(f, "Codegen"),
        }
    }
}

/// Category of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Document shape violates the schema. Fatal.
    Schema,
    /// Duplicate ids, dangling edges, cycles.
    Structural,
    /// Missing per-kind required field.
    Config,
    /// A placeholder names a variable not visible at that node.
    Scope,
    /// A valid graph that cannot be lowered to a plan.
    Lower,
    /// A lowered plan that breaks a plan invariant.
    Plan,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Structural => "StructuralError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Scope => "ScopeError",
            ErrorKind::Lower => "LowerError",
            ErrorKind::Plan => "PlanError",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompilerError {
    pub code: String,
    pub phase: Phase,
    pub kind: ErrorKind,
    pub message: String,
    pub node_id: Option<String>,
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.phase, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.phase, self.code, self.message),
        }
    }
}

impl std::error::Error for CompilerError {}

impl From<ValidationError> for CompilerError {
    fn from(e: ValidationError) -> Self {
        CompilerError {
            code: e.code.to_string(),
            phase: Phase::PlanValidate,
            kind: ErrorKind::Plan,
            message: e.message,
            node_id: e.step_id,
        }
    }
}

impl From<GraphError> for CompilerError {
    fn from(e: GraphError) -> Self {
        match &e {
            GraphError::Schema { node_id, .. } => CompilerError {
                code: "P002".into(),
                phase: Phase::Parse,
                kind: ErrorKind::Schema,
                message: e.to_string(),
                node_id: node_id.clone(),
            },
            GraphError::NotFound { id } => CompilerError {
                code: "L002".into(),
                phase: Phase::Lower,
                kind: ErrorKind::Lower,
                message: e.to_string(),
                node_id: Some(id.clone()),
            },
            GraphError::Cycle { .. } => CompilerError::structural("S003", e.to_string(), None),
        }
    }
}

impl CompilerError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Parse,
            kind: ErrorKind::Schema,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn structural(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::validate(code, ErrorKind::Structural, message, node_id)
    }

    pub fn config(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::validate(code, ErrorKind::Config, message, node_id)
    }

    pub fn scope(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        Self::validate(code, ErrorKind::Scope, message, node_id)
    }

    pub fn lower(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Lower,
            kind: ErrorKind::Lower,
            message: message.into(),
            node_id,
        }
    }

    fn validate(
        code: &str,
        kind: ErrorKind,
        message: impl Into<String>,
        node_id: Option<String>,
    ) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Validate,
            kind,
            message: message.into(),
            node_id,
        }
    }
}

/// Fatal errors raised by the graph model and the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{message}")]
    Schema {
        message: String,
        node_id: Option<String>,
    },

    #[error("Node '{id}' not found in workflow graph")]
    NotFound { id: String },

    #[error("Cycle detected in workflow graph: only {ordered} of {total} nodes could be ordered")]
    Cycle { ordered: usize, total: usize },
}
