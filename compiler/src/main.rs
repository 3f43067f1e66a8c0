//! skillc CLI - skill workflow compiler

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

use compiler::codegen::{self, CodegenOptions};
use compiler::config::{CompilerConfig, ConfigError};
use compiler::error::CompilerError;
use compiler::lower::topo;
use compiler::parse::{self, SkillDocument, WorkflowGraph};
use compiler::runtime::{Executor, MockBackend};

#[derive(Parser)]
#[command(name = "skillc")]
#[command(about = "skillc - compile skill workflows into validated pipelines")]
#[command(version)]
struct Cli {
    /// Path to a skillc.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a skill and emit its artifact bundle
    Translate {
        /// Path to the skill YAML/JSON file
        file: PathBuf,

        /// Output directory (defaults to <output_root>/<skill_id>[_<timestamp>])
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after validation
        #[arg(long)]
        validate_only: bool,

        /// Overwrite an existing output directory
        #[arg(long)]
        force: bool,
    },

    /// Validate a skill file
    Validate {
        /// Path to the skill YAML/JSON file
        file: PathBuf,
    },

    /// Show a summary of a skill file
    Info {
        /// Path to the skill YAML/JSON file
        file: PathBuf,
    },

    /// Execute a skill against the deterministic mock backend
    Run {
        /// Path to the skill YAML/JSON file
        file: PathBuf,

        /// Input value as KEY=VALUE (VALUE is parsed as JSON when possible)
        #[arg(long, value_name = "KEY=VALUE")]
        input: Vec<String>,

        /// JSON file holding an object of inputs
        #[arg(long, value_name = "FILE")]
        inputs: Option<PathBuf>,

        /// Mock backend seed (defaults to the skill id)
        #[arg(long)]
        seed: Option<String>,
    },
}

/// Collected compiler diagnostics, printed one per line.
#[derive(Debug, thiserror::Error)]
#[error("{} error(s) found", .0.len())]
struct Diagnostics(Vec<CompilerError>);

fn main() {
    let cli = Cli::parse();
    let (config, config_error) = load_config(cli.config.as_deref());

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    if let Some(e) = config_error {
        tracing::warn!(error = %e, "ignoring malformed config file");
    }

    let result = match cli.command {
        Commands::Translate {
            file,
            output,
            validate_only,
            force,
        } => translate(&file, output, validate_only, force, &config),
        Commands::Validate { file } => validate(&file),
        Commands::Info { file } => info(&file),
        Commands::Run {
            file,
            input,
            inputs,
            seed,
        } => run(&file, &input, inputs.as_deref(), seed, &config),
    };

    if let Err(e) = result {
        match e.downcast_ref::<Diagnostics>() {
            Some(Diagnostics(errors)) => {
                eprintln!("{} {} error(s) found", "✗".red().bold(), errors.len());
                for err in errors {
                    eprintln!("  {} {}", "-".red(), err);
                }
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), e),
        }
        std::process::exit(1);
    }
}

/// The config to run with, and the load error to report once logging is up.
fn load_config(path: Option<&Path>) -> (CompilerConfig, Option<ConfigError>) {
    match CompilerConfig::load(path) {
        Ok(config) => (config, None),
        Err(e) => (CompilerConfig::from_env(), Some(e)),
    }
}

fn load(file: &Path) -> anyhow::Result<SkillDocument> {
    parse::parse_file(file).map_err(|errors| Diagnostics(errors).into())
}

fn compile(doc: &SkillDocument) -> anyhow::Result<compiler::ir::PipelinePlan> {
    compiler::compile_document(doc).map_err(|errors| Diagnostics(errors).into())
}

fn translate(
    file: &Path,
    output: Option<PathBuf>,
    validate_only: bool,
    force: bool,
    config: &CompilerConfig,
) -> anyhow::Result<()> {
    let doc = load(file)?;
    let plan = compile(&doc)?;
    println!("{} Skill '{}' is valid", "✓".green(), doc.metadata().id);

    if validate_only {
        return Ok(());
    }

    let now = Local::now();
    let dir = output.unwrap_or_else(|| {
        let stamp = config.timestamped_output.then_some(now);
        config
            .output_root
            .join(codegen::bundle_dir_name(&doc.metadata().id, stamp))
    });

    let bundle = codegen::codegen(&doc, &plan, &CodegenOptions::at(now));
    let written = bundle.write_to(&dir, force)?;

    println!("{} Generated {} files in {}", "✓".green(), written.len(), dir.display());
    for path in written {
        println!("  - {}", path.display());
    }
    Ok(())
}

fn validate(file: &Path) -> anyhow::Result<()> {
    let doc = load(file)?;
    let graph = WorkflowGraph::from_document(&doc).map_err(|e| Diagnostics(vec![e.into()]))?;
    compiler::validate::validate(&graph)
        .into_result()
        .map_err(Diagnostics)?;
    println!("{} Skill '{}' is valid", "✓".green(), doc.metadata().id);
    Ok(())
}

fn info(file: &Path) -> anyhow::Result<()> {
    let doc = load(file)?;
    let meta = doc.metadata();

    println!("{} {}", "Skill:".bold(), meta.name);
    println!("  id:          {}", meta.id);
    println!("  category:    {}", meta.category);
    println!("  tags:        {}", meta.tags.join(", "));
    println!("  description: {}", meta.description);

    println!("{}", "Parameters:".bold());
    for p in doc.parameters() {
        let required = if p.required { "required" } else { "optional" };
        println!("  - {} ({}, {})", p.name, p.param_type, required);
    }

    println!("{}", "Nodes:".bold());
    for n in doc.nodes() {
        println!("  - {} ({})", n.id, n.node_type);
    }
    println!("  {} edge(s)", doc.edges().len());

    let graph = WorkflowGraph::from_document(&doc).map_err(|e| Diagnostics(vec![e.into()]))?;
    match topo::order(&graph) {
        Ok(order) => println!("{} {}", "Execution order:".bold(), order.ids.join(" → ")),
        Err(e) => println!("{} {}", "Execution order:".bold(), e.to_string().yellow()),
    }

    let keywords = &doc.skill.triggers.keywords;
    if !keywords.is_empty() {
        println!("{} {}", "Triggers:".bold(), keywords.join(", "));
    }

    let report = compiler::validate::validate(&graph);
    if report.is_valid() {
        println!("{} valid", "Status:".bold());
    } else {
        println!("{} {} error(s)", "Status:".bold(), report.len().to_string().red());
    }
    Ok(())
}

fn run(
    file: &Path,
    input: &[String],
    inputs_file: Option<&Path>,
    seed: Option<String>,
    config: &CompilerConfig,
) -> anyhow::Result<()> {
    let doc = load(file)?;
    let plan = compile(&doc)?;

    let mut inputs = match inputs_file {
        Some(path) => read_inputs_file(path)?,
        None => Map::new(),
    };
    for pair in input {
        let (key, value) = parse_input(pair)?;
        inputs.insert(key, value);
    }

    let seed = seed
        .or_else(|| config.mock_seed.clone())
        .unwrap_or_else(|| doc.metadata().id.clone());

    let mut executor = Executor::new(&plan, MockBackend::new(seed));
    let state = executor.run(inputs)?;

    println!("{} Pipeline '{}' completed", "✓".green(), plan.metadata.pipeline_name);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn read_inputs_file(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inputs file '{}'", path.display()))?;
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Inputs file '{}' is not valid JSON", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => bail!("Inputs file '{}' must hold a JSON object", path.display()),
    }
}

/// `KEY=VALUE`; VALUE is JSON when it parses, else a plain string.
fn parse_input(pair: &str) -> anyhow::Result<(String, Value)> {
    let Some((key, raw)) = pair.split_once('=') else {
        bail!("Invalid --input '{}': expected KEY=VALUE", pair);
    };
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.trim().to_string(), value))
}
