//! riskgate: deterministic risk gating for infrastructure changes and
//! security findings.
//!
//! Planning tools describe what a deployment will change; scanners report
//! what they found, each in its own severity vocabulary. riskgate folds both
//! into one record shape, collapses duplicates reported by several tools,
//! scores the set and applies an ordered threshold policy to decide whether
//! the deployment may proceed.
//!
//! # Pipeline
//!
//! ```text
//! records → normalize (+ classify) → deduplicate → score → gate → report
//! ```
//!
//! Every stage is a pure function of its inputs plus the configuration.
//! One bad record never aborts a run: it is excluded from scoring and listed
//! in the report. Only a structurally invalid input document is fatal.
//!
//! # Exit codes
//!
//! - `0`: pass
//! - `1`: block
//! - `2`: fatal error (malformed input, bad configuration, I/O)
//!
//! # Examples
//!
//! ```bash
//! # Evaluate a plan and two scanners' output in one go
//! riskgate evaluate --source terraform=plan.json --source tfsec=tfsec.json \
//!     --source checkov=checkov.json --format markdown
//!
//! # Convert native output once, evaluate later
//! riskgate ingest --tool tfsec --file tfsec.json > tfsec.records.json
//! riskgate evaluate --input tfsec.records.json
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: record model, configuration, input decoding, errors, rendering
//! - [`engine`]: the pipeline stages and [`engine::run_pipeline`]
//! - [`plugins`]: adapters for native tool output
//! - [`sources`]: adapter registry

pub mod core;
pub mod engine;
pub mod plugins;
pub mod sources;

mod cli;

use clap::Parser;
use cli::{Cli, Command, EvaluateCli, IngestCli, OutputFormat, PolicyCommand};
use crate::core::{
    assets, config, error,
    input::{self, InputDocument},
    output, time,
};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Exit status for fatal errors (pass and block are 0 and 1).
pub const EXIT_ERROR: i32 = 2;

/// Parse the command line, run it, and return the process exit code.
pub fn run() -> Result<i32, error::GateError> {
    let cli = Cli::parse();
    let current_dir = std::env::current_dir()?;

    match cli.command {
        Command::Evaluate(args) => run_evaluate(args, &current_dir),
        Command::Ingest(args) => run_ingest(args),
        Command::Policy(policy) => match policy.command {
            PolicyCommand::Show { config, defaults } => {
                if defaults {
                    let text = assets::get_embedded("defaults/riskgate.toml").ok_or_else(|| {
                        error::GateError::ConfigError("embedded defaults missing".into())
                    })?;
                    print!("{}", text);
                    return Ok(0);
                }
                let effective = config::load_config(config.as_deref(), &current_dir)?;
                println!("{}", serde_json::to_string_pretty(&effective)?);
                Ok(0)
            }
            PolicyCommand::Check { config } => run_policy_check(config.as_deref(), &current_dir),
        },
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&schema())?);
            Ok(0)
        }
    }
}

fn read_source(path: &str) -> Result<String, error::GateError> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(|e| {
        error::GateError::IoError(std::io::Error::new(e.kind(), format!("{}: {}", path, e)))
    })
}

fn parse_source_arg(raw: &str) -> Result<(&str, &str), error::GateError> {
    match raw.split_once('=') {
        Some((tool, file)) if !tool.trim().is_empty() && !file.trim().is_empty() => {
            Ok((tool.trim(), file.trim()))
        }
        _ => Err(error::GateError::MalformedInput(format!(
            "--source expects TOOL=FILE, got '{}'",
            raw
        ))),
    }
}

fn collect_inputs(args: &EvaluateCli) -> Result<InputDocument, error::GateError> {
    let mut document = InputDocument::default();
    let stdin_only = args.inputs.is_empty() && args.sources.is_empty();
    let inputs: Vec<&str> = if stdin_only {
        vec!["-"]
    } else {
        args.inputs.iter().map(String::as_str).collect()
    };

    for path in inputs {
        let parsed = input::parse_input(&read_source(path)?).map_err(|e| match e {
            error::GateError::MalformedInput(msg) => {
                error::GateError::MalformedInput(format!("{}: {}", path, msg))
            }
            other => other,
        })?;
        tracing::debug!(path, records = parsed.records.len(), "input loaded");
        document.extend(parsed);
    }

    for raw in &args.sources {
        let (tool, path) = parse_source_arg(raw)?;
        let records = sources::ingest(tool, &read_source(path)?)?;
        tracing::debug!(tool, path, records = records.len(), "native output loaded");
        document.extend(InputDocument::from_records(sources::records_to_values(
            &records,
        )?));
    }
    Ok(document)
}

fn run_evaluate(args: EvaluateCli, current_dir: &Path) -> Result<i32, error::GateError> {
    let mut engine_config = config::load_config(args.config.as_deref(), current_dir)?;
    if let Some(top) = args.top {
        engine_config.top_n = top;
        engine_config.validate()?;
    }
    let document = collect_inputs(&args)?;
    let report = engine::run_pipeline(&document, &engine_config);

    if args.no_color || args.output.is_some() {
        colored::control::set_override(false);
    }
    let rendered = match args.format {
        OutputFormat::Text => output::render_text(&report),
        OutputFormat::Json => report.to_json_pretty()?,
        OutputFormat::Markdown => output::render_markdown(&report),
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered.as_bytes())?;
            eprintln!(
                "riskgate: {} ({} aggregate) report written to {}",
                report.decision,
                report.aggregate_level,
                path.display()
            );
            if !report.metadata.warnings.is_empty() {
                eprintln!(
                    "riskgate: warnings: {}",
                    output::preview_messages(&report.metadata.warnings, 3, 120)
                );
            }
        }
        None => {
            print!("{}", rendered);
            if !rendered.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(report.exit_code())
}

fn run_ingest(args: IngestCli) -> Result<i32, error::GateError> {
    let path = args.file.as_deref().unwrap_or("-");
    let records = sources::ingest(&args.tool, &read_source(path)?)?;
    let adapter = sources::find_source(&args.tool)?;
    let values = sources::records_to_values(&records)?;
    let envelope = time::ingest_envelope(adapter.name, values);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(0)
}

fn run_policy_check(explicit: Option<&Path>, current_dir: &Path) -> Result<i32, error::GateError> {
    use colored::Colorize;

    let resolved = config::resolve_config_path(explicit, current_dir);
    let effective = config::load_config(explicit, current_dir)?;
    let origin = resolved
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "embedded defaults".to_string());
    println!(
        "{} {} is valid: {} rule(s), {} severity map(s), {} stateful pattern(s), top_n {}",
        "✓".bright_green(),
        origin,
        effective.policy.rules.len(),
        effective.severity_maps.tools().len(),
        effective.stateful_resource_types.len(),
        effective.top_n
    );
    for (index, rule) in effective.policy.rules.iter().enumerate() {
        println!(
            "  {}. {} maxCount {} -> {}",
            index, rule.severity, rule.max_count, rule.action
        );
    }
    Ok(0)
}

/// Machine-readable description of inputs, outputs and adapters.
pub fn schema() -> serde_json::Value {
    serde_json::json!({
        "name": "riskgate",
        "version": env!("CARGO_PKG_VERSION"),
        "input": {
            "schemaVersion": input::INPUT_SCHEMA_VERSION,
            "shapes": ["array of records", "{schemaVersion, records, severityMaps?, policy?}"],
            "change": ["address", "resourceType?", "actions", "attributesBefore?", "attributesAfter?",
                       "dependsOn?", "sensitiveFieldsTouched?", "costDelta?", "sourceTool?"],
            "finding": ["sourceTool", "ruleId", "nativeSeverity", "resourceOrFile", "line?",
                        "message?", "category?"],
            "categories": ["secret", "pii", "compliance", "non-inclusive-language", "other"],
            "severities": ["CRITICAL", "HIGH", "MEDIUM", "LOW", "INFO"]
        },
        "report": {
            "schemaVersion": engine::report::REPORT_SCHEMA_VERSION,
            "fields": ["schemaVersion", "decision", "aggregateLevel", "summary", "firedRules",
                       "topFindings", "conflicts", "unparsedInputs", "metadata", "payload"]
        },
        "errors": ["InvalidRecordError", "UnknownActionSetError", "ConflictingClassificationError",
                   "UnmappedSeverityError", "MalformedInputError"],
        "exitCodes": {"pass": 0, "block": 1, "error": EXIT_ERROR},
        "sources": sources::schemas()
    })
}
