//! Comparison of extracted values with values the caller already knows.

use std::collections::BTreeSet;

use super::rules::RuleSet;
use crate::models::{CrossValidation, FieldType, FieldValue, Member};

/// Compares an extracted value against a known raw value.
#[derive(Debug, Clone, Copy)]
pub struct CrossValidator {
    threshold: f64,
}

impl CrossValidator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Compare `extracted` with `known`, normalizing `known` with `rules`.
    ///
    /// A known value with nothing extracted, or one that cannot be
    /// normalized, compares with similarity 0.
    pub fn compare(
        &self,
        rules: &RuleSet<'_>,
        field_type: FieldType,
        extracted: Option<&FieldValue>,
        known: Option<&str>,
    ) -> CrossValidation {
        let Some(known) = known else {
            return CrossValidation::NotApplicable;
        };

        let similarity = match (extracted, rules.normalize(field_type, known).value) {
            (Some(extracted), Some(expected)) => similarity(extracted, &expected),
            _ => 0.0,
        };

        CrossValidation::Compared {
            similarity,
            consistent: similarity >= self.threshold,
            known: known.to_string(),
        }
    }
}

impl Default for CrossValidator {
    fn default() -> Self {
        Self::new(0.9)
    }
}

fn same_text(a: &str, b: &str) -> bool {
    let squash = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect()
    };
    squash(a) == squash(b)
}

fn exact(equal: bool) -> f64 {
    if equal { 1.0 } else { 0.0 }
}

fn member_names(members: &[Member]) -> BTreeSet<String> {
    members
        .iter()
        .map(|m| m.name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Similarity of two canonical values in `[0, 1]`.
pub fn similarity(a: &FieldValue, b: &FieldValue) -> f64 {
    match (a, b) {
        (FieldValue::Phone(a), FieldValue::Phone(b)) => exact(same_text(a, b)),
        (FieldValue::Code(a), FieldValue::Code(b)) => exact(same_text(a, b)),
        (FieldValue::Bank { code: a, .. }, FieldValue::Bank { code: b, .. }) => {
            exact(same_text(a, b))
        }
        (FieldValue::Income { amount: a, .. }, FieldValue::Income { amount: b, .. }) => {
            let largest = a.unsigned_abs().max(b.unsigned_abs());
            if largest == 0 {
                return 1.0;
            }
            let diff = a.abs_diff(*b);
            (1.0 - diff as f64 / largest as f64).clamp(0.0, 1.0)
        }
        (FieldValue::Members(a), FieldValue::Members(b)) => {
            let a = member_names(a);
            let b = member_names(b);
            let union = a.union(&b).count();
            if union == 0 {
                return 1.0;
            }
            a.intersection(&b).count() as f64 / union as f64
        }
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::rules::NormalizationTables;
    use crate::models::ValidationConfig;
    use pretty_assertions::assert_eq;

    fn compare(
        field_type: FieldType,
        extracted: Option<&FieldValue>,
        known: Option<&str>,
    ) -> CrossValidation {
        let tables = NormalizationTables::builtin();
        let limits = ValidationConfig::default();
        let rules = RuleSet::new(&tables, &limits);
        CrossValidator::default().compare(&rules, field_type, extracted, known)
    }

    #[test]
    fn test_phone_known_value_matches_after_normalization() {
        let extracted = FieldValue::Phone("0912345678".to_string());
        let result = compare(FieldType::Phone, Some(&extracted), Some("+84 912 345 678"));
        assert_eq!(
            result,
            CrossValidation::Compared {
                similarity: 1.0,
                consistent: true,
                known: "+84 912 345 678".to_string(),
            }
        );
    }

    #[test]
    fn test_income_relative_difference() {
        let extracted = FieldValue::Income {
            amount: 18_000_000,
            currency: "VND".to_string(),
        };
        let close = compare(FieldType::Currency, Some(&extracted), Some("20 triệu"));
        assert_eq!(close.similarity(), Some(0.9));
        assert!(matches!(close, CrossValidation::Compared { consistent: true, .. }));

        let far = compare(FieldType::Currency, Some(&extracted), Some("36.000.000"));
        assert_eq!(far.similarity(), Some(0.5));
        assert!(matches!(far, CrossValidation::Compared { consistent: false, .. }));
    }

    #[test]
    fn test_bank_compares_codes() {
        let extracted = FieldValue::Bank {
            code: "VCB".to_string(),
            full_name: "Vietcombank".to_string(),
        };
        assert_eq!(
            compare(FieldType::BankReference, Some(&extracted), Some("Vietcombank")).similarity(),
            Some(1.0)
        );
        assert_eq!(
            compare(FieldType::BankReference, Some(&extracted), Some("ACB")).similarity(),
            Some(0.0)
        );
    }

    #[test]
    fn test_members_jaccard() {
        let extracted = FieldValue::Members(vec![
            Member {
                name: "Trần Thị Bình".to_string(),
                relationship: Some("Vợ".to_string()),
                birth_year: Some(1987),
            },
            Member {
                name: "Nguyễn Văn Cường".to_string(),
                relationship: Some("Con".to_string()),
                birth_year: Some(2015),
            },
        ]);
        let result = compare(
            FieldType::StructuredList,
            Some(&extracted),
            Some("Trần Thị Bình - Vợ - 1987; Nguyễn Văn Dũng - Con - 2018"),
        );
        let similarity = result.similarity().unwrap();
        assert!((similarity - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_extraction_and_missing_known() {
        assert_eq!(compare(FieldType::Phone, None, None), CrossValidation::NotApplicable);

        let result = compare(FieldType::Phone, None, Some("0912345678"));
        assert_eq!(result.similarity(), Some(0.0));

        let extracted = FieldValue::Phone("0912345678".to_string());
        let unparseable = compare(FieldType::Phone, Some(&extracted), Some("không có"));
        assert_eq!(unparseable.similarity(), Some(0.0));
    }
}
