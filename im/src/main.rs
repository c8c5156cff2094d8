use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use ingestmap::cli::{Cli, Command};
use ingestmap::config::Config;
use ingestmap::ingest::{
    IngestionError, MemoryStore, PipelineDefinition, PreviewRunner, RecordProcessor, extract_records,
};
use ingestmap::mapping::{FieldMapping, FieldPath, MappingMode};

fn setup_logging(verbose: bool) -> Result<()> {
    // stdout carries JSON results, so logs go to stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).context(format!("Failed to parse JSON in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn describe(mapping: &FieldMapping) -> String {
    let target = match &mapping.mode {
        MappingMode::Direct => mapping.target_field.clone(),
        MappingMode::Composite { sub_field } => format!("{}.{}", mapping.target_field, sub_field),
        MappingMode::Relation {
            target_object,
            match_field,
            auto_create,
        } => format!(
            "{} -> {}.{}{}",
            mapping.target_field,
            target_object,
            match_field,
            if *auto_create { " (auto-create)" } else { "" }
        ),
    };
    let transform = mapping
        .transform
        .as_ref()
        .map(|t| format!(" [{}]", t.kind()))
        .unwrap_or_default();
    format!("{:>4}  {} => {}{}", mapping.position, mapping.source_path, target, transform)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Command::Extract { payload, path } => {
            let payload = read_json(&payload)?;
            let path: FieldPath = path.parse()?;
            match path.resolve(&payload) {
                Some(value) => print_json(value)?,
                None => eyre::bail!("No value at path '{}'", path),
            }
        }
        Command::Validate { pipeline } => {
            let definition = PipelineDefinition::load(&pipeline)?;
            let mappings = definition.compile()?;
            eprintln!(
                "{} Pipeline '{}' is valid: {} mapping(s) into {}",
                "✓".green(),
                definition.name.cyan(),
                mappings.len(),
                definition.target_object.yellow()
            );
            for mapping in &mappings {
                println!("{}", describe(mapping));
            }
        }
        Command::Map { pipeline, payload } => {
            let definition = PipelineDefinition::load(&pipeline)?;
            let mappings = definition.compile()?;
            let payload = read_json(&payload)?;
            let assembler = config.assembler();

            let mut records = Vec::new();
            let mut errors = Vec::new();
            for (index, source) in definition.records_from(&payload).iter().enumerate() {
                match assembler.assemble(source, &mappings) {
                    Ok(record) => records.push(record),
                    Err(e) => errors.push(IngestionError::new(index, source, e.to_string(), config.snippet_max_len)),
                }
            }

            let status = if errors.is_empty() { "✓".green() } else { "✗".red() };
            eprintln!("{} {} record(s) assembled, {} failed", status, records.len(), errors.len());
            print_json(&serde_json::json!({
                "records": records,
                "errors": errors,
            }))?;
        }
        Command::Preview {
            pipeline,
            samples,
            limit,
        } => {
            let definition = PipelineDefinition::load(&pipeline)?;
            let samples = extract_records(&read_json(&samples)?, None);

            let mut options = config.preview_options();
            if let Some(limit) = limit {
                options.limit = limit;
            }
            let result = PreviewRunner::new(config.assembler(), options).run_pipeline(&definition, &samples)?;

            let status = if result.success { "✓".green() } else { "✗".red() };
            eprintln!(
                "{} {} of {} sample(s) valid",
                status, result.valid_records, result.total_records
            );
            print_json(&result)?;
        }
        Command::Process {
            pipeline,
            payload,
            dump,
        } => {
            let definition = PipelineDefinition::load(&pipeline)?;
            let payload = read_json(&payload)?;
            let records = definition.records_from(&payload);

            let store = Arc::new(MemoryStore::new());
            let processor = RecordProcessor::new(&definition, store.clone())?
                .with_assembler(config.assembler())
                .with_snippet_len(config.snippet_max_len);
            let result = processor.process(&records).await;

            eprintln!(
                "{} {}: {} created, {} updated, {} skipped, {} failed",
                "✓".green(),
                definition.name.cyan(),
                result.records_created,
                result.records_updated,
                result.records_skipped,
                result.records_failed
            );
            if dump {
                print_json(&serde_json::json!({
                    "result": result,
                    "store": store.dump().await,
                }))?;
            } else {
                print_json(&result)?;
            }
        }
    }

    Ok(())
}
