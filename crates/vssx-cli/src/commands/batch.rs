//! Batch processing command for multiple HTML files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use vssx_core::ExtractionReport;

use super::process::{format_report, OutputFormat};
use super::{load_orchestrator, read_html, requested_fields};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input HTML files
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fields to extract (default: all configured fields)
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    /// Path relative to the glob root; names the output file.
    name: PathBuf,
    report: Option<ExtractionReport>,
    error: Option<String>,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let orchestrator = load_orchestrator(config_path)?;
    let fields = requested_fields(&args.fields, &orchestrator);
    let root = glob_root(&args.input);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "html" | "htm" | "xhtml")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    // Read everything first, then extract in parallel.
    pb.set_message("reading");
    let mut results: Vec<ProcessResult> = Vec::with_capacity(files.len());
    let mut documents: Vec<String> = Vec::new();
    let mut slots: Vec<usize> = Vec::new();
    for path in files {
        let name = relative_name(&root, &path);
        match read_html(&path) {
            Ok(html) => {
                slots.push(results.len());
                documents.push(html);
                results.push(ProcessResult {
                    path,
                    name,
                    report: None,
                    error: None,
                });
            }
            Err(e) => {
                record_failure(&mut results, path, name, e.to_string(), args.continue_on_error)?;
                pb.inc(1);
            }
        }
    }

    pb.set_message("extracting");
    let reports = orchestrator.extract_batch_with_progress(&documents, &fields, || pb.inc(1));
    for (slot, outcome) in slots.into_iter().zip(reports) {
        let result = &mut results[slot];
        match outcome {
            Ok(report) => result.report = Some(report),
            Err(e) => {
                if !args.continue_on_error {
                    pb.abandon();
                    error!("Failed to process {}: {}", result.path.display(), e);
                    anyhow::bail!("Processing failed: {}: {}", result.path.display(), e);
                }
                warn!("Failed to process {}: {}", result.path.display(), e);
                result.error = Some(e.to_string());
            }
        }
    }
    pb.finish_with_message("complete");

    let successful: Vec<_> = results.iter().filter(|r| r.report.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    let summary_path = args
        .output_dir
        .as_ref()
        .map(|d| d.join("summary.csv"))
        .unwrap_or_else(|| PathBuf::from("summary.csv"));

    if let Some(output_dir) = &args.output_dir {
        let mut taken = HashSet::new();
        if args.summary {
            taken.insert(summary_path.clone());
        }
        for result in &successful {
            if let Some(report) = &result.report {
                let extension = args.format.extension();
                let output_path =
                    unique_output_path(output_dir, &result.name, extension, &mut taken);
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output_path, format_report(report, args.format)?)?;
                debug!("Wrote output to {}", output_path.display());
            }
        }
    }

    if args.summary {
        write_summary(&summary_path, &results, &fields)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn record_failure(
    results: &mut Vec<ProcessResult>,
    path: PathBuf,
    name: PathBuf,
    message: String,
    continue_on_error: bool,
) -> anyhow::Result<()> {
    if !continue_on_error {
        error!("Failed to read {}: {}", path.display(), message);
        anyhow::bail!("Processing failed: {}: {}", path.display(), message);
    }
    warn!("Failed to read {}: {}", path.display(), message);
    results.push(ProcessResult {
        path,
        name,
        report: None,
        error: Some(message),
    });
    Ok(())
}

/// Leading components of a glob pattern that hold no wildcard.
fn glob_root(pattern: &str) -> PathBuf {
    Path::new(pattern)
        .components()
        .take_while(|c| !c.as_os_str().to_string_lossy().contains(['*', '?', '[']))
        .collect()
}

/// Input path relative to the glob root, or its bare file name.
fn relative_name(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) if rel.file_name().is_some() => rel.to_path_buf(),
        _ => PathBuf::from(path.file_name().unwrap_or(path.as_os_str())),
    }
}

/// Output path for `name` under `dir`, suffixed until it is not in `taken`.
fn unique_output_path(
    dir: &Path,
    name: &Path,
    extension: &str,
    taken: &mut HashSet<PathBuf>,
) -> PathBuf {
    let base = dir.join(name).with_extension(extension);
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report")
        .to_string();

    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = base.with_file_name(format!("{}-{}.{}", stem, n, extension));
        n += 1;
    }
    candidate
}

fn write_summary(path: &Path, results: &[ProcessResult], fields: &[&str]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["filename", "status"];
    header.extend_from_slice(fields);
    header.extend_from_slice(&["quality_score", "grade", "succeeded", "error"]);
    wtr.write_record(&header)?;

    for result in results {
        let mut row = vec![result.name.display().to_string()];
        match &result.report {
            Some(report) => {
                row.push("success".to_string());
                for field in fields {
                    row.push(
                        report
                            .value(field)
                            .map(|v| v.to_string())
                            .unwrap_or_default(),
                    );
                }
                row.push(format!("{:.2}", report.summary.overall_quality_score));
                row.push(report.summary.grade.to_string());
                row.push(format!(
                    "{}/{}",
                    report.summary.fields_succeeded, report.summary.fields_attempted
                ));
                row.push(String::new());
            }
            None => {
                row.push("error".to_string());
                row.extend(fields.iter().map(|_| String::new()));
                row.extend([String::new(), String::new(), String::new()]);
                row.push(result.error.clone().unwrap_or_default());
            }
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
