//! Confidence scoring for extraction results.

use crate::models::{QualityLevel, ScoringConfig};

/// How normalization went for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationOutcome {
    /// A value with no notes.
    Clean,
    /// A value, but normalization recorded anomalies.
    WithNotes,
    /// No value could be produced.
    Failed,
}

impl NormalizationOutcome {
    pub fn from_parts(has_value: bool, note_count: usize) -> Self {
        match (has_value, note_count) {
            (false, _) => Self::Failed,
            (true, 0) => Self::Clean,
            (true, _) => Self::WithNotes,
        }
    }
}

/// Combines strategy confidence with validation and normalization outcomes.
#[derive(Debug, Clone)]
pub struct QualityScorer {
    config: ScoringConfig,
}

impl QualityScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Final confidence in `[0, 1]`.
    pub fn score(
        &self,
        base: f64,
        fallback_used: bool,
        error_count: usize,
        outcome: NormalizationOutcome,
    ) -> f64 {
        let factor = match outcome {
            NormalizationOutcome::Clean => 1.0,
            NormalizationOutcome::WithNotes => self.config.normalization_note_factor,
            NormalizationOutcome::Failed => 0.0,
        };

        let mut score = base;
        if fallback_used {
            score -= self.config.fallback_penalty;
        }
        score -= self.config.validation_error_penalty * error_count as f64;

        let score = (score * factor).clamp(0.0, 1.0);
        // Drop float noise before level thresholds.
        (score * 1e9).round() / 1e9
    }

    /// Score and level together.
    pub fn assess(
        &self,
        base: f64,
        fallback_used: bool,
        error_count: usize,
        outcome: NormalizationOutcome,
    ) -> (f64, QualityLevel) {
        let score = self.score(base, fallback_used, error_count, outcome);
        (score, QualityLevel::from_score(score))
    }
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}
