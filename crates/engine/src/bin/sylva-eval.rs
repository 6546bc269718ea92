//! Evaluate one record against a named model from the command line.
//!
//! With `--watch` (or `SYLVA_WATCH=true`) the models directory is watched
//! and one JSON record per stdin line is evaluated until stdin closes, so
//! edits to documents apply to the next line.

use std::fs;
use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use sylva_core::config::load_dotenv;
use sylva_core::{EngineConfig, Record};
use sylva_engine::loader::{LoadStatus, ModelLoader};
use sylva_engine::schema::yaml;
use sylva_engine::validation::{validate_document, ValidationResult};
use sylva_engine::{EvaluationResult, ModelDocument, ModelRegistry};

/// Evaluate declarative predictive models.
#[derive(Parser, Debug)]
#[command(name = "sylva-eval", about = "Evaluate a record against a model document")]
struct Args {
    /// Directory scanned for model documents
    #[arg(long, env = "SYLVA_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    /// Load a single document instead of scanning the models directory
    #[arg(long)]
    document: Option<PathBuf>,

    /// Name of the model to evaluate
    #[arg(long, required_unless_present = "validate_only")]
    model: Option<String>,

    /// JSON object with the record fields, read from a file or '-' for stdin
    #[arg(long)]
    record: Option<String>,

    /// Set a record field (repeatable), overrides values from --record
    #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Validate the document(s) and exit without evaluating
    #[arg(long)]
    validate_only: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Watch the models directory and evaluate one JSON record per stdin line
    #[arg(long, conflicts_with_all = ["document", "record", "validate_only"])]
    watch: bool,
}

fn parse_assignment(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

fn main() -> Result<()> {
    load_dotenv();
    let mut config = EngineConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Some(dir) = &args.models_dir {
        config.models_dir = dir.clone();
    }
    config.log_summary();

    if args.validate_only {
        return validate(&args, &config);
    }
    // SYLVA_WATCH applies only when no single record or document was named.
    if args.watch || (config.watch && args.document.is_none() && args.record.is_none()) {
        return watch_and_evaluate(&args, &config);
    }

    let registry = match &args.document {
        Some(path) => load_document(path, &config)?,
        None => scan_models_dir(&config, args.model.as_deref())?,
    };

    let model = args.model.as_deref().unwrap_or_default();
    let record = build_record(&args)?;
    let result = registry
        .evaluate(model, &record)
        .with_context(|| format!("failed to evaluate model '{model}'"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

// ── Loading ─────────────────────────────────────────────────────────

fn load_document(path: &Path, config: &EngineConfig) -> Result<Arc<ModelRegistry>> {
    let loader = ModelLoader::from_config(config);
    let doc = loader
        .load_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    loader
        .register(doc)
        .with_context(|| format!("failed to register {}", path.display()))
}

fn scan_models_dir(config: &EngineConfig, model: Option<&str>) -> Result<Arc<ModelRegistry>> {
    let loader = ModelLoader::from_config(config);
    load_models_dir(&loader, config)?;
    find_model(&loader, config, model.unwrap_or_default())
}

fn load_models_dir(loader: &ModelLoader, config: &EngineConfig) -> Result<()> {
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan {}", config.models_dir.display()))?;
    for result in &results {
        if let LoadStatus::Failed { error } = &result.status {
            warn!(path = %result.path.display(), error = %error, "document not loaded");
        }
    }
    info!(documents = loader.len(), "models directory loaded");
    Ok(())
}

fn find_model(
    loader: &ModelLoader,
    config: &EngineConfig,
    name: &str,
) -> Result<Arc<ModelRegistry>> {
    loader.find_model(name).with_context(|| {
        format!(
            "no loaded document defines model '{}' in {}",
            name,
            config.models_dir.display()
        )
    })
}

fn build_record(args: &Args) -> Result<Record> {
    let mut record = match args.record.as_deref() {
        Some(source) => {
            let raw = if source == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read record from stdin")?;
                buf
            } else {
                fs::read_to_string(source)
                    .with_context(|| format!("failed to read record file {source}"))?
            };
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("record is not valid JSON")?;
            Record::from_json(&value).context("invalid record")?
        }
        None => Record::new(),
    };
    for (field, value) in &args.set {
        record.insert(field.clone(), value.clone());
    }
    Ok(record)
}

// ── Watch mode ──────────────────────────────────────────────────────

fn watch_and_evaluate(args: &Args, config: &EngineConfig) -> Result<()> {
    let mut loader = ModelLoader::from_config(config);
    load_models_dir(&loader, config)?;
    loader
        .watch()
        .with_context(|| format!("failed to watch {}", config.models_dir.display()))?;

    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read record from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        // The registry is resolved per line so reloaded documents apply.
        match evaluate_line(&loader, config, args, &line) {
            Ok(result) if args.json => println!("{}", serde_json::to_string(&result)?),
            Ok(result) => print_result(&result),
            Err(e) => {
                warn!(error = %format!("{e:#}"), "record not evaluated");
                if args.json {
                    println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
                } else {
                    println!("error:      {e:#}");
                }
            }
        }
    }
    info!("stdin closed, stopping watch mode");
    Ok(())
}

fn evaluate_line(
    loader: &ModelLoader,
    config: &EngineConfig,
    args: &Args,
    line: &str,
) -> Result<EvaluationResult> {
    let model = args.model.as_deref().unwrap_or_default();
    let value: serde_json::Value = serde_json::from_str(line).context("record is not valid JSON")?;
    let mut record = Record::from_json(&value).context("invalid record")?;
    for (field, value) in &args.set {
        record.insert(field.clone(), value.clone());
    }
    let registry = find_model(loader, config, model)?;
    registry
        .evaluate(model, &record)
        .with_context(|| format!("failed to evaluate model '{model}'"))
}

// ── Validation ──────────────────────────────────────────────────────

fn validate(args: &Args, config: &EngineConfig) -> Result<()> {
    match &args.document {
        Some(path) => {
            let doc = parse_unchecked(path)?;
            let result = validate_document(&doc, config.max_depth);
            print_validation(&path.display().to_string(), &result);
            if !result.valid {
                bail!("{} is invalid", path.display());
            }
        }
        None => {
            let loader = ModelLoader::from_config(config);
            let results = loader.load_all()?;
            let mut failed = 0;
            for result in &results {
                match &result.status {
                    LoadStatus::Loaded { document_id, models } => {
                        println!("ok      {} ({document_id}, {models} models)", result.path.display())
                    }
                    LoadStatus::Skipped { reason } => {
                        println!("skipped {} ({reason})", result.path.display())
                    }
                    LoadStatus::Failed { error } => {
                        failed += 1;
                        println!("failed  {}: {error}", result.path.display())
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} document(s) failed validation");
            }
        }
    }
    Ok(())
}

/// Parse without validating so every finding can be listed.
fn parse_unchecked(path: &Path) -> Result<ModelDocument> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let doc = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&contents).context("failed to parse JSON document")?
    } else {
        yaml::from_str(&contents).context("failed to parse YAML document")?
    };
    Ok(doc)
}

// ── Output ──────────────────────────────────────────────────────────

fn print_validation(source: &str, result: &ValidationResult) {
    for error in &result.errors {
        println!("error   {source} {error}");
    }
    for warning in &result.warnings {
        println!("warning {source} {warning}");
    }
    if result.valid {
        println!("{source}: valid ({} warnings)", result.warnings.len());
    }
}

fn print_result(result: &EvaluationResult) {
    println!("model:      {}", result.model);
    println!("score:      {}", result.score);
    if let Some(confidence) = result.confidence {
        println!("confidence: {confidence:.4}");
    }
    if let Some(id) = &result.entity_id {
        println!("entity:     {id}");
    }
    for (class, p) in &result.distribution {
        println!("  {class:<12} {p:.4}");
    }
    for segment in &result.segments {
        println!(
            "  segment {} (weight {}): {} -> {}",
            segment.segment_id.as_deref().unwrap_or("-"),
            segment.weight,
            segment.result.model,
            segment.result.score
        );
    }
}
