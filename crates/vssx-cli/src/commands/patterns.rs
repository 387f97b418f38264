//! Patterns command - list registered fields and their patterns.

use clap::Args;
use console::style;
use serde::Serialize;

use vssx_core::registry::FieldSpec;

use super::load_orchestrator;

/// Arguments for the patterns command.
#[derive(Args)]
pub struct PatternsArgs {
    /// Show every pattern of one field
    #[arg(long)]
    field: Option<String>,

    /// Print as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct FieldListing<'a> {
    name: &'a str,
    field_type: &'a str,
    known_value_keys: &'a [String],
    structural: usize,
    regex: usize,
    context: usize,
    path: usize,
    fallback: usize,
}

impl<'a> FieldListing<'a> {
    fn new(spec: &'a FieldSpec) -> Self {
        Self {
            name: &spec.name,
            field_type: spec.field_type.as_str(),
            known_value_keys: &spec.known_value_keys,
            structural: spec.patterns.structural.len(),
            regex: spec.patterns.regex.len(),
            context: spec.patterns.context_keywords.len(),
            path: spec.patterns.paths.len(),
            fallback: spec.patterns.fallback.len(),
        }
    }
}

pub fn run(args: PatternsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let orchestrator = load_orchestrator(config_path)?;
    let registry = orchestrator.registry();

    if let Some(name) = &args.field {
        let Some(spec) = registry.get(name) else {
            anyhow::bail!(
                "Unknown field: {} (registered: {})",
                name,
                registry.field_names().join(", ")
            );
        };
        return show_field(spec, args.json);
    }

    let listings: Vec<FieldListing> = registry.fields().iter().map(FieldListing::new).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    println!(
        "{:<16} {:<18} {:>10} {:>6} {:>8} {:>5} {:>9}",
        "FIELD", "TYPE", "STRUCTURAL", "REGEX", "CONTEXT", "PATH", "FALLBACK"
    );
    for l in &listings {
        println!(
            "{:<16} {:<18} {:>10} {:>6} {:>8} {:>5} {:>9}",
            style(l.name).bold(),
            l.field_type,
            l.structural,
            l.regex,
            l.context,
            l.path,
            l.fallback
        );
    }

    Ok(())
}

fn show_field(spec: &FieldSpec, json: bool) -> anyhow::Result<()> {
    let regex: Vec<&str> = spec.patterns.regex.iter().map(|r| r.as_str()).collect();
    let fallback: Vec<&str> = spec.patterns.fallback.iter().map(|r| r.as_str()).collect();

    if json {
        let value = serde_json::json!({
            "name": spec.name,
            "field_type": spec.field_type.as_str(),
            "known_value_keys": spec.known_value_keys,
            "structural": spec.patterns.structural,
            "regex": regex,
            "context_keywords": spec.patterns.context_keywords,
            "paths": spec.patterns.paths,
            "fallback": fallback,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{} ({})", style(&spec.name).bold(), spec.field_type);
    println!("Known value keys: {}", spec.known_value_keys.join(", "));

    println!("\nStructural hints:");
    for hint in &spec.patterns.structural {
        println!("  - {:?}", hint);
    }
    println!("\nRegex patterns:");
    for pattern in &regex {
        println!("  - {}", pattern);
    }
    println!("\nContext keywords:");
    for keyword in &spec.patterns.context_keywords {
        println!("  - {}", keyword);
    }
    println!("\nPath hints:");
    for hint in &spec.patterns.paths {
        println!("  - {:?}", hint);
    }
    println!("\nFallback patterns:");
    for pattern in &fallback {
        println!("  - {}", pattern);
    }

    Ok(())
}
