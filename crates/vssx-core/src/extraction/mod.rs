//! Field extraction: rules, strategy chain, scoring and orchestration.

pub mod cross;
pub mod orchestrator;
pub mod rules;
pub mod scoring;
pub mod strategies;

pub use cross::CrossValidator;
pub use orchestrator::ExtractionOrchestrator;
pub use rules::{FieldRule, NormalizationTables, Normalized, RuleSet, ValidationResult};
pub use scoring::{NormalizationOutcome, QualityScorer};
pub use strategies::{Candidate, Strategy, StrategyChain, StrategyContext};
