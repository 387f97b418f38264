//! Process command - extract fields from a single HTML file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use vssx_core::{ExtractionReport, ExtractionResult, KnownValues};

use super::{load_orchestrator, read_html, requested_fields};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input HTML file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fields to extract (default: all configured fields)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Known value for cross-validation, as key=value
    #[arg(short, long = "known", value_name = "KEY=VALUE")]
    known: Vec<String>,

    /// JSON file with known values
    #[arg(long)]
    known_file: Option<PathBuf>,

    /// Show extraction confidence scores
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per field
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let orchestrator = load_orchestrator(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let known = load_known_values(&args.known, args.known_file.as_deref())?;
    let fields = requested_fields(&args.fields, &orchestrator);

    info!("Processing file: {}", args.input.display());
    let html = read_html(&args.input)?;
    let report = orchestrator
        .extract_html(&html, &fields, (!known.is_empty()).then_some(&known))
        .map_err(|e| anyhow::anyhow!("{}: {}", args.input.display(), e))?;

    let output = format_report(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        print_confidence(&report);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Merge known values from a JSON file and `key=value` arguments.
///
/// Command-line values win over file values.
pub fn load_known_values(pairs: &[String], file: Option<&Path>) -> anyhow::Result<KnownValues> {
    let mut known = KnownValues::new();

    if let Some(path) = file {
        let content = fs::read_to_string(path)?;
        let values: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid known values file {}: {}", path.display(), e))?;
        for (key, value) in values {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            known.insert(key, value);
        }
    }

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("Known value must be KEY=VALUE, got: {}", pair);
        };
        known.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(known)
}

pub fn format_report(report: &ExtractionReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_csv(report),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn value_text(result: &ExtractionResult) -> String {
    result
        .normalized_value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_default()
}

fn format_csv(report: &ExtractionReport) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "field",
        "value",
        "raw",
        "confidence",
        "quality",
        "strategy",
        "fallback_used",
        "errors",
        "warnings",
        "notes",
    ])?;

    for result in &report.results {
        wtr.write_record([
            result.field_name.as_str(),
            &value_text(result),
            result.raw_candidate.as_deref().unwrap_or(""),
            &format!("{:.2}", result.confidence_score),
            result.quality_level.as_str(),
            result.strategy_used.map(|s| s.as_str()).unwrap_or(""),
            if result.fallback_used { "true" } else { "false" },
            &result.validation_errors.join("; "),
            &result.validation_warnings.join("; "),
            &result.normalization_notes.join("; "),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(report: &ExtractionReport) -> String {
    let mut output = String::new();

    for result in &report.results {
        let value = result
            .normalized_value
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<16} {} [{} {:.2}]\n",
            format!("{}:", result.field_name),
            value,
            result.quality_level,
            result.confidence_score
        ));
        for error in &result.validation_errors {
            output.push_str(&format!("{:<16} error: {}\n", "", error));
        }
        for warning in &result.validation_warnings {
            output.push_str(&format!("{:<16} warning: {}\n", "", warning));
        }
    }

    let summary = &report.summary;
    output.push('\n');
    output.push_str(&format!(
        "Fields: {}/{} succeeded\n",
        summary.fields_succeeded, summary.fields_attempted
    ));
    output.push_str(&format!(
        "Quality: {:.2} ({}, grade {})\n",
        summary.overall_quality_score, summary.status, summary.grade
    ));
    if let Some(consistency) = summary.overall_consistency {
        output.push_str(&format!("Consistency: {:.2}\n", consistency));
    }

    output
}

fn print_confidence(report: &ExtractionReport) {
    println!();
    for result in &report.results {
        let marker = if result.quality_level.is_usable() {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "{} {}: {:.1}% ({}{})",
            marker,
            result.field_name,
            result.confidence_score * 100.0,
            result.quality_level,
            result
                .strategy_used
                .map(|s| format!(", {}", s))
                .unwrap_or_default()
        );
    }
    println!(
        "{} Overall quality: {:.1}% (grade {})",
        style("ℹ").blue(),
        report.summary.overall_quality_score * 100.0,
        report.summary.grade
    );
}
