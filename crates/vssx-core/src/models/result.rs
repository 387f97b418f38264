//! Per-field extraction results and the document-level report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::field::{FieldType, FieldValue};
use crate::document::DocumentProfile;

/// Values the caller already knows, keyed by field name or alias.
pub type KnownValues = BTreeMap<String, String>;

/// Coarse quality bucket derived from the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityLevel {
    Failed,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl QualityLevel {
    /// Bucket a score in [0, 1].
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            QualityLevel::Excellent
        } else if score >= 0.7 {
            QualityLevel::Good
        } else if score >= 0.5 {
            QualityLevel::Moderate
        } else if score > 0.0 {
            QualityLevel::Poor
        } else {
            QualityLevel::Failed
        }
    }

    /// Moderate or better.
    pub fn is_usable(&self) -> bool {
        *self >= QualityLevel::Moderate
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityLevel::Failed => "FAILED",
            QualityLevel::Poor => "POOR",
            QualityLevel::Moderate => "MODERATE",
            QualityLevel::Good => "GOOD",
            QualityLevel::Excellent => "EXCELLENT",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy that produced a candidate, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Structural,
    Regex,
    Context,
    Path,
    Fallback,
}

impl StrategyKind {
    /// All strategies in the order the chain tries them.
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Structural,
        StrategyKind::Regex,
        StrategyKind::Context,
        StrategyKind::Path,
        StrategyKind::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Structural => "structural",
            StrategyKind::Regex => "regex",
            StrategyKind::Context => "context",
            StrategyKind::Path => "path",
            StrategyKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing an extracted value with a known value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrossValidation {
    /// No known value was supplied for the field.
    NotApplicable,
    Compared {
        similarity: f64,
        consistent: bool,
        known: String,
    },
}

impl CrossValidation {
    pub fn similarity(&self) -> Option<f64> {
        match self {
            CrossValidation::NotApplicable => None,
            CrossValidation::Compared { similarity, .. } => Some(*similarity),
        }
    }
}

/// Result of extracting one field from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub field_name: String,
    pub field_type: Option<FieldType>,
    pub raw_candidate: Option<String>,
    pub normalized_value: Option<FieldValue>,
    pub confidence_score: f64,
    pub quality_level: QualityLevel,
    pub strategy_used: Option<StrategyKind>,
    pub fallback_used: bool,
    pub validation_errors: Vec<String>,
    pub validation_warnings: Vec<String>,
    pub normalization_notes: Vec<String>,
    pub cross_validation: CrossValidation,
}

impl ExtractionResult {
    /// A FAILED result carrying one explanatory error.
    pub fn failed(
        field_name: impl Into<String>,
        field_type: Option<FieldType>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            field_type,
            raw_candidate: None,
            normalized_value: None,
            confidence_score: 0.0,
            quality_level: QualityLevel::Failed,
            strategy_used: None,
            fallback_used: false,
            validation_errors: vec![error.into()],
            validation_warnings: Vec::new(),
            normalization_notes: Vec::new(),
            cross_validation: CrossValidation::NotApplicable,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.normalized_value.is_some() && self.quality_level.is_usable()
    }
}

/// Overall status label derived from the mean confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl SummaryStatus {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            SummaryStatus::Excellent
        } else if score > 0.6 {
            SummaryStatus::Good
        } else if score > 0.3 {
            SummaryStatus::Moderate
        } else {
            SummaryStatus::Poor
        }
    }
}

impl fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SummaryStatus::Excellent => "excellent",
            SummaryStatus::Good => "good",
            SummaryStatus::Moderate => "moderate",
            SummaryStatus::Poor => "poor",
        };
        f.write_str(s)
    }
}

/// Letter grade derived from the mean confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Grade::A
        } else if score > 0.6 {
            Grade::B
        } else if score > 0.4 {
            Grade::C
        } else {
            Grade::D
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Aggregate statistics over a report's results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Fraction of fields with quality MODERATE or better.
    pub overall_success_rate: f64,
    /// Mean confidence over all requested fields.
    pub overall_quality_score: f64,
    pub fields_attempted: usize,
    pub fields_succeeded: usize,
    /// EXCELLENT or GOOD.
    pub high_quality_count: usize,
    pub moderate_quality_count: usize,
    pub failed_count: usize,
    pub status: SummaryStatus,
    pub grade: Grade,
    /// Mean similarity of the fields that had a known value.
    pub overall_consistency: Option<f64>,
}

impl ExtractionSummary {
    pub fn from_results(results: &[ExtractionResult]) -> Self {
        let attempted = results.len();
        let succeeded = results.iter().filter(|r| r.quality_level.is_usable()).count();
        let high = results
            .iter()
            .filter(|r| r.quality_level >= QualityLevel::Good)
            .count();
        let moderate = results
            .iter()
            .filter(|r| r.quality_level == QualityLevel::Moderate)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.quality_level == QualityLevel::Failed)
            .count();

        let (success_rate, quality_score) = if attempted == 0 {
            (0.0, 0.0)
        } else {
            let total: f64 = results.iter().map(|r| r.confidence_score).sum();
            (succeeded as f64 / attempted as f64, total / attempted as f64)
        };

        let similarities: Vec<f64> = results
            .iter()
            .filter_map(|r| r.cross_validation.similarity())
            .collect();
        let consistency = if similarities.is_empty() {
            None
        } else {
            Some(similarities.iter().sum::<f64>() / similarities.len() as f64)
        };

        Self {
            overall_success_rate: success_rate,
            overall_quality_score: quality_score,
            fields_attempted: attempted,
            fields_succeeded: succeeded,
            high_quality_count: high,
            moderate_quality_count: moderate,
            failed_count: failed,
            status: SummaryStatus::from_score(quality_score),
            grade: Grade::from_score(quality_score),
            overall_consistency: consistency,
        }
    }
}

/// All results for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// One entry per requested field, in request order.
    pub results: Vec<ExtractionResult>,
    pub summary: ExtractionSummary,
    pub profile: DocumentProfile,
}

impl ExtractionReport {
    pub fn new(results: Vec<ExtractionResult>, profile: DocumentProfile) -> Self {
        let summary = ExtractionSummary::from_results(&results);
        Self {
            results,
            summary,
            profile,
        }
    }

    /// Look up a field's result by name.
    pub fn get(&self, field_name: &str) -> Option<&ExtractionResult> {
        self.results.iter().find(|r| r.field_name == field_name)
    }

    /// Canonical value of a field, if one was extracted.
    pub fn value(&self, field_name: &str) -> Option<&FieldValue> {
        self.get(field_name).and_then(|r| r.normalized_value.as_ref())
    }
}
