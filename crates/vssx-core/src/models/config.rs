//! Configuration structures for the extraction engine.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::result::StrategyKind;
use crate::error::VssxError;

/// Main configuration for the vssx engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VssxConfig {
    /// Document and strategy chain settings.
    pub extraction: ExtractionConfig,

    /// Confidence ceilings, floors and penalties.
    pub scoring: ScoringConfig,

    /// Validation limits.
    pub validation: ValidationConfig,

    /// Additions to the built-in normalization tables.
    pub tables: TableOverrides,

    /// Additional patterns for registered (or new) fields.
    pub patterns: Vec<PatternOverride>,
}

/// Document and strategy chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Characters searched after a context keyword.
    pub context_window: usize,

    /// Largest accepted document, in bytes.
    pub max_document_bytes: usize,

    /// Shorter candidates are ignored.
    pub min_candidate_chars: usize,

    /// Fields extracted when the caller does not name any.
    pub default_fields: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_window: 80,
            max_document_bytes: crate::document::DEFAULT_MAX_BYTES,
            min_candidate_chars: 3,
            default_fields: ["phone", "income", "bank", "household_code", "members"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Confidence bounds for one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyBounds {
    /// Confidence of a well-shaped candidate.
    pub ceiling: f64,
    /// Candidates below this are rejected.
    pub floor: f64,
}

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub structural: StrategyBounds,
    pub regex: StrategyBounds,
    pub context: StrategyBounds,
    pub path: StrategyBounds,
    pub fallback: StrategyBounds,

    /// Multiplier for candidates that do not look like the field type.
    pub shape_mismatch_factor: f64,

    /// Subtracted when the fallback strategy produced the candidate.
    pub fallback_penalty: f64,

    /// Subtracted per validation error.
    pub validation_error_penalty: f64,

    /// Multiplier when normalization recorded notes.
    pub normalization_note_factor: f64,

    /// Similarity at or above which a known value counts as consistent.
    pub consistency_threshold: f64,
}

impl ScoringConfig {
    pub fn bounds(&self, strategy: StrategyKind) -> StrategyBounds {
        match strategy {
            StrategyKind::Structural => self.structural,
            StrategyKind::Regex => self.regex,
            StrategyKind::Context => self.context,
            StrategyKind::Path => self.path,
            StrategyKind::Fallback => self.fallback,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            structural: StrategyBounds { ceiling: 1.0, floor: 0.6 },
            regex: StrategyBounds { ceiling: 0.9, floor: 0.55 },
            context: StrategyBounds { ceiling: 0.8, floor: 0.5 },
            path: StrategyBounds { ceiling: 0.75, floor: 0.45 },
            fallback: StrategyBounds { ceiling: 0.5, floor: 0.25 },
            shape_mismatch_factor: 0.5,
            fallback_penalty: 0.1,
            validation_error_penalty: 0.1,
            normalization_note_factor: 0.9,
            consistency_threshold: 0.9,
        }
    }
}

/// Validation limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Incomes below this raise a warning.
    pub income_min: i64,

    /// Incomes above this raise a warning.
    pub income_max: i64,

    /// Incomes above this are errors.
    pub income_hard_max: i64,

    pub code_min_length: usize,
    pub code_max_length: usize,

    /// Earliest plausible member birth year.
    pub min_birth_year: u16,

    /// Latest plausible member birth year.
    pub reference_year: u16,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        let year = chrono::Local::now().year();
        Self {
            income_min: 100_000,
            income_max: 100_000_000,
            income_hard_max: 10_000_000_000,
            code_min_length: 8,
            code_max_length: 15,
            min_birth_year: 1900,
            reference_year: u16::try_from(year).unwrap_or(u16::MAX),
        }
    }
}

/// Entries added to the built-in normalization tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOverrides {
    /// Bank code to full name.
    pub banks: BTreeMap<String, String>,

    /// Alias to bank code.
    pub bank_aliases: BTreeMap<String, String>,

    /// Kinship word to canonical relationship.
    pub relationships: BTreeMap<String, String>,

    /// Multiplier keyword to factor.
    pub multipliers: BTreeMap<String, i64>,

    /// Three-digit mobile prefix to carrier.
    pub mobile_prefixes: BTreeMap<String, String>,
}

/// Extra patterns for one field.
///
/// Naming a field that is not registered adds it, in which case
/// `field_type` is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOverride {
    pub field: String,
    pub field_type: Option<String>,
    pub known_value_keys: Vec<String>,
    pub regex_patterns: Vec<String>,
    pub context_keywords: Vec<String>,
    pub fallback_patterns: Vec<String>,
}

impl VssxConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check ranges the types alone do not enforce.
    pub fn validate(&self) -> crate::Result<()> {
        for kind in StrategyKind::ALL {
            let bounds = self.scoring.bounds(kind);
            let in_unit = |v: f64| (0.0..=1.0).contains(&v);
            if !in_unit(bounds.floor) || !in_unit(bounds.ceiling) || bounds.floor > bounds.ceiling {
                return Err(VssxError::Config(format!(
                    "scoring.{}: need 0 <= floor ({}) <= ceiling ({}) <= 1",
                    kind, bounds.floor, bounds.ceiling
                )));
            }
        }
        if self.extraction.context_window == 0 {
            return Err(VssxError::Config(
                "extraction.context_window must be positive".to_string(),
            ));
        }
        if self.validation.income_min > self.validation.income_max {
            return Err(VssxError::Config(format!(
                "validation.income_min ({}) exceeds income_max ({})",
                self.validation.income_min, self.validation.income_max
            )));
        }
        if self.validation.code_min_length > self.validation.code_max_length {
            return Err(VssxError::Config(format!(
                "validation.code_min_length ({}) exceeds code_max_length ({})",
                self.validation.code_min_length, self.validation.code_max_length
            )));
        }
        Ok(())
    }
}
