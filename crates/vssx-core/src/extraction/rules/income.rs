//! Income (currency amount) normalization and validation.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{FieldRule, NormalizationTables, Normalized, ValidationResult};
use crate::models::ValidationConfig;

/// Currency of every normalized amount.
pub const CURRENCY: &str = "VND";

/// Longest text accepted as an amount candidate.
const MAX_AMOUNT_CHARS: usize = 48;

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"\d+(?:[.,]\d+)*").unwrap();
}

/// Parse the first number in `s`.
///
/// Separators followed only by three-digit groups are thousands separators;
/// otherwise the last separator is the decimal point
/// (`25,500,000` → 25500000, `25.0` → 25, `1,234.56` → 1234.56).
/// A minus sign directly before the number, not itself following a letter
/// or digit, makes it negative (`-5` → -5, `Q-5` → 5).
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let m = NUMBER.find(s)?;
    let negative = has_minus_sign(&s[..m.start()]);
    let groups: Vec<&str> = m.as_str().split(['.', ',']).collect();

    let text = match groups.split_last() {
        Some((_, [])) => groups[0].to_string(),
        Some((last, init)) if groups[1..].iter().all(|g| g.len() == 3) => {
            format!("{}{}", init.concat(), last)
        }
        Some((last, init)) => format!("{}.{}", init.concat(), last),
        None => return None,
    };

    let amount = Decimal::from_str(&text).ok()?;
    Some(if negative { -amount } else { amount })
}

fn has_minus_sign(before: &str) -> bool {
    match before.strip_suffix(['-', '\u{2212}']) {
        Some(rest) => !rest.ends_with(|c: char| c.is_alphanumeric()),
        None => false,
    }
}

/// Income rule: amounts in base units with multiplier keywords.
#[derive(Debug, Clone, Copy)]
pub struct IncomeRule<'a> {
    tables: &'a NormalizationTables,
    limits: &'a ValidationConfig,
}

impl<'a> IncomeRule<'a> {
    pub fn new(tables: &'a NormalizationTables, limits: &'a ValidationConfig) -> Self {
        Self { tables, limits }
    }

    /// Multiplier named by the first word after the number, if any.
    fn multiplier_after(&self, raw: &str) -> Option<i64> {
        let m = NUMBER.find(raw)?;
        let word: String = raw[m.end()..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_alphabetic())
            .collect();
        if word.is_empty() {
            return None;
        }
        self.tables.multiplier(&word)
    }
}

impl FieldRule for IncomeRule<'_> {
    type Output = i64;

    fn normalize(&self, raw: &str) -> Normalized<i64> {
        let Some(base) = parse_amount(raw) else {
            return Normalized::failed("no numeric amount in income candidate");
        };

        let factor = self.multiplier_after(raw).unwrap_or(1);
        let Some(scaled) = base.checked_mul(Decimal::from(factor)) else {
            return Normalized::failed("income amount out of range");
        };

        let rounded = scaled.round();
        let Some(amount) = rounded.to_i64() else {
            return Normalized::failed("income amount out of range");
        };

        let normalized = Normalized::ok(amount);
        if rounded != scaled {
            normalized.with_note(format!("fractional amount {} rounded", scaled))
        } else {
            normalized
        }
    }

    fn validate(&self, amount: &i64) -> ValidationResult {
        let mut result = ValidationResult::new();
        let amount = *amount;
        if amount <= 0 {
            result.error("income must be positive");
        } else if amount > self.limits.income_hard_max {
            result.error(format!(
                "income {} exceeds {} {}",
                amount, self.limits.income_hard_max, CURRENCY
            ));
        } else if amount < self.limits.income_min {
            result.warning(format!(
                "income seems too low (< {} {})",
                self.limits.income_min, CURRENCY
            ));
        } else if amount > self.limits.income_max {
            result.warning(format!(
                "income seems too high (> {} {})",
                self.limits.income_max, CURRENCY
            ));
        }
        result
    }

    fn conforms(&self, raw: &str) -> bool {
        raw.chars().count() <= MAX_AMOUNT_CHARS && NUMBER.is_match(raw)
    }
}
