//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod patterns;
pub mod process;

use std::path::{Path, PathBuf};

use tracing::debug;
use vssx_core::{ExtractionOrchestrator, VssxConfig};

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vssx")
        .join("config.json")
}

/// Load the configuration named on the command line, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<VssxConfig> {
    match config_path {
        Some(path) => {
            let path = Path::new(path);
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            debug!("Loading configuration from {}", path.display());
            Ok(VssxConfig::from_file(path)?)
        }
        None => Ok(VssxConfig::default()),
    }
}

/// Build an orchestrator from the configuration named on the command line.
pub fn load_orchestrator(config_path: Option<&str>) -> anyhow::Result<ExtractionOrchestrator> {
    let config = load_config(config_path)?;
    Ok(ExtractionOrchestrator::from_config(config)?)
}

/// Requested fields, or the configured defaults when none are given.
pub fn requested_fields<'a>(
    fields: &'a [String],
    orchestrator: &'a ExtractionOrchestrator,
) -> Vec<&'a str> {
    if fields.is_empty() {
        orchestrator.default_fields()
    } else {
        fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect()
    }
}

/// Read an input file as text. Invalid UTF-8 is replaced; NUL bytes are
/// left for the document checks.
pub fn read_html(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
