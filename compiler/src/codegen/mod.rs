//! Codegen pass: PipelinePlan → artifact bundle.
//!
//! Public API: `codegen(doc, plan, opts) -> CodegenOutput`

mod manifest;
mod readme;
mod writer;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::ir::types::PipelinePlan;
use crate::parse::types::SkillDocument;

pub use manifest::{fingerprint, gen_manifest, sort_keys};
pub use readme::example_value;

pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A generated file with its path and content.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Inputs to codegen that do not come from the document.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// ISO-8601 timestamp recorded in the manifest.
    pub generated_at: String,
}

impl CodegenOptions {
    pub fn at(time: DateTime<Local>) -> Self {
        CodegenOptions {
            generated_at: time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }

    pub fn now() -> Self {
        Self::at(Local::now())
    }
}

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Output directory '{}' already exists (use --force to overwrite)", .0.display())]
    Exists(PathBuf),

    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The complete output of the codegen pass.
#[derive(Debug, Clone)]
pub struct CodegenOutput {
    pub files: Vec<GeneratedFile>,
}

impl CodegenOutput {
    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Write every file under `dir`. An existing `dir` is only overwritten
    /// when `force` is set.
    pub fn write_to(&self, dir: &Path, force: bool) -> Result<Vec<PathBuf>, CodegenError> {
        if dir.exists() && !force {
            return Err(CodegenError::Exists(dir.to_path_buf()));
        }
        std::fs::create_dir_all(dir).map_err(|source| CodegenError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut written = Vec::with_capacity(self.files.len());
        for file in &self.files {
            let path = dir.join(&file.path);
            std::fs::write(&path, &file.content).map_err(|source| CodegenError::Io {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), bytes = file.content.len(), "artifact written");
            written.push(path);
        }
        Ok(written)
    }
}

/// Generate the artifact bundle for a validated, lowered skill.
pub fn codegen(doc: &SkillDocument, plan: &PipelinePlan, opts: &CodegenOptions) -> CodegenOutput {
    let mut plan_json = serde_json::to_string_pretty(plan).unwrap_or_default();
    plan_json.push('\n');

    let files = vec![
        GeneratedFile {
            path: "plan.json".into(),
            content: plan_json,
        },
        GeneratedFile {
            path: "manifest.json".into(),
            content: manifest::gen_manifest_json(doc, plan, opts),
        },
        GeneratedFile {
            path: "README.md".into(),
            content: readme::gen_readme(doc, plan),
        },
    ];

    CodegenOutput { files }
}

/// `<skill_id>_<YYYYmmdd_HHMMSS>` when a timestamp is given, else the id.
pub fn bundle_dir_name(skill_id: &str, time: Option<DateTime<Local>>) -> String {
    match time {
        Some(t) => format!("{}_{}", skill_id, t.format("%Y%m%d_%H%M%S")),
        None => skill_id.to_string(),
    }
}
