//! Per-field-type normalization and validation rules.

pub mod bank;
pub mod household;
pub mod income;
pub mod members;
pub mod patterns;
pub mod phone;
pub mod tables;

pub use bank::{BankRef, BankRule};
pub use household::HouseholdCodeRule;
pub use income::{parse_amount, IncomeRule};
pub use members::MembersRule;
pub use phone::PhoneRule;
pub use tables::NormalizationTables;

use serde::{Deserialize, Serialize};

use crate::models::{FieldType, FieldValue, ValidationConfig};

/// Outcome of normalizing one raw candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    /// Canonical value, `None` when the candidate could not be interpreted.
    pub value: Option<T>,
    /// Anomalies observed while normalizing.
    pub notes: Vec<String>,
}

impl<T> Normalized<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value: Some(value),
            notes: Vec::new(),
        }
    }

    pub fn failed(note: impl Into<String>) -> Self {
        Self {
            value: None,
            notes: vec![note.into()],
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Normalized<U> {
        Normalized {
            value: self.value.map(f),
            notes: self.notes,
        }
    }
}

/// Errors and warnings for one normalized value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Normalizer and validator for one field type.
pub trait FieldRule {
    /// Canonical value this rule produces.
    type Output;

    /// Turn a raw candidate into a canonical value.
    fn normalize(&self, raw: &str) -> Normalized<Self::Output>;

    /// Check a canonical value.
    fn validate(&self, value: &Self::Output) -> ValidationResult;

    /// Whether a raw candidate plausibly holds a value of this type.
    fn conforms(&self, raw: &str) -> bool;
}

/// Tables and limits the rules consult.
#[derive(Debug, Clone, Copy)]
pub struct RuleSet<'a> {
    pub tables: &'a NormalizationTables,
    pub limits: &'a ValidationConfig,
}

impl<'a> RuleSet<'a> {
    pub fn new(tables: &'a NormalizationTables, limits: &'a ValidationConfig) -> Self {
        Self { tables, limits }
    }

    /// Normalize a raw candidate with the rule bound to `field_type`.
    pub fn normalize(&self, field_type: FieldType, raw: &str) -> Normalized<FieldValue> {
        match field_type {
            FieldType::Phone => self.phone().normalize(raw).map(FieldValue::Phone),
            FieldType::Currency => self.income().normalize(raw).map(|amount| FieldValue::Income {
                amount,
                currency: income::CURRENCY.to_string(),
            }),
            FieldType::BankReference => self
                .bank()
                .normalize(raw)
                .map(|bank| FieldValue::Bank {
                    code: bank.code,
                    full_name: bank.full_name,
                }),
            FieldType::AlphanumericCode => self.household().normalize(raw).map(FieldValue::Code),
            FieldType::StructuredList => self.members().normalize(raw).map(FieldValue::Members),
        }
    }

    /// Validate a canonical value with the rule bound to its type.
    pub fn validate(&self, value: &FieldValue) -> ValidationResult {
        match value {
            FieldValue::Phone(phone) => self.phone().validate(phone),
            FieldValue::Income { amount, .. } => self.income().validate(amount),
            FieldValue::Bank { code, full_name } => self.bank().validate(&BankRef {
                code: code.clone(),
                full_name: full_name.clone(),
            }),
            FieldValue::Code(code) => self.household().validate(code),
            FieldValue::Members(members) => self.members().validate(members),
        }
    }

    /// Whether `raw` has the shape expected for `field_type`.
    pub fn conforms(&self, field_type: FieldType, raw: &str) -> bool {
        match field_type {
            FieldType::Phone => self.phone().conforms(raw),
            FieldType::Currency => self.income().conforms(raw),
            FieldType::BankReference => self.bank().conforms(raw),
            FieldType::AlphanumericCode => self.household().conforms(raw),
            FieldType::StructuredList => self.members().conforms(raw),
        }
    }

    fn phone(&self) -> PhoneRule<'a> {
        PhoneRule::new(self.tables)
    }

    fn income(&self) -> IncomeRule<'a> {
        IncomeRule::new(self.tables, self.limits)
    }

    fn bank(&self) -> BankRule<'a> {
        BankRule::new(self.tables)
    }

    fn household(&self) -> HouseholdCodeRule {
        HouseholdCodeRule::new(self.limits.code_min_length, self.limits.code_max_length)
    }

    fn members(&self) -> MembersRule<'a> {
        MembersRule::new(self.tables, self.limits)
    }
}
