//! Data models for fields, extraction results and configuration.

pub mod config;
pub mod field;
pub mod result;

pub use config::{
    ExtractionConfig, PatternOverride, ScoringConfig, StrategyBounds, TableOverrides,
    ValidationConfig, VssxConfig,
};
pub use field::{FieldType, FieldValue, Member};
pub use result::{
    CrossValidation, ExtractionReport, ExtractionResult, ExtractionSummary, Grade, KnownValues,
    QualityLevel, StrategyKind, SummaryStatus,
};
