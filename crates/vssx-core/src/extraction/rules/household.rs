//! Household code normalization and validation.

use super::{FieldRule, Normalized, ValidationResult};

/// Household code rule: uppercase alphanumerics within length bounds.
#[derive(Debug, Clone, Copy)]
pub struct HouseholdCodeRule {
    min_len: usize,
    max_len: usize,
}

impl HouseholdCodeRule {
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self { min_len, max_len }
    }

    fn well_formed(&self, code: &str) -> bool {
        (self.min_len..=self.max_len).contains(&code.len())
            && code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    }
}

impl Default for HouseholdCodeRule {
    fn default() -> Self {
        Self::new(8, 15)
    }
}

impl FieldRule for HouseholdCodeRule {
    type Output = String;

    fn normalize(&self, raw: &str) -> Normalized<String> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        if cleaned.is_empty() {
            return Normalized::failed("empty household code candidate");
        }
        if self.well_formed(&cleaned) {
            Normalized::ok(cleaned)
        } else {
            let note = format!(
                "household code {} is not {}-{} alphanumeric characters",
                cleaned, self.min_len, self.max_len
            );
            Normalized::ok(cleaned).with_note(note)
        }
    }

    fn validate(&self, code: &String) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !self.well_formed(code) {
            result.error(format!(
                "invalid household code format (should be {}-{} alphanumeric characters)",
                self.min_len, self.max_len
            ));
        }
        result
    }

    fn conforms(&self, raw: &str) -> bool {
        let compact: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
        (self.min_len..=self.max_len).contains(&compact.len())
            && compact.iter().all(|c| c.is_ascii_alphanumeric())
            && compact.iter().any(|c| c.is_ascii_digit())
    }
}
