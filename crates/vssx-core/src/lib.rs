//! Core library for household record field extraction.
//!
//! This crate provides:
//! - HTML parsing into an owned, immutable document tree
//! - A pattern registry describing where each field may appear
//! - A five-strategy extraction chain with confidence ceilings and floors
//! - Normalization and validation of phones, incomes, banks, household codes
//!   and member lists
//! - Quality scoring and cross-validation against known values

pub mod document;
pub mod error;
pub mod extraction;
pub mod models;
pub mod registry;

pub use document::{Document, DocumentProfile, StructureType};
pub use error::{DocumentError, ExtractionError, PatternError, Result, VssxError};
pub use extraction::{ExtractionOrchestrator, NormalizationTables};
pub use models::{
    CrossValidation, ExtractionReport, ExtractionResult, ExtractionSummary, FieldType, FieldValue,
    Grade, KnownValues, Member, QualityLevel, StrategyKind, SummaryStatus, VssxConfig,
};
pub use registry::{PatternRegistry, DEFAULT_REGISTRY};
