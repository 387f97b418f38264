//! Phone number normalization and validation.

use lazy_static::lazy_static;
use regex::Regex;

use super::{FieldRule, NormalizationTables, Normalized, ValidationResult};

lazy_static! {
    static ref LOCAL_PHONE: Regex = Regex::new(r"^0\d{9,10}$").unwrap();
    static ref VALID_PHONE: Regex = Regex::new(r"^0[1-9]\d{8,9}$").unwrap();
}

/// Phone rule: local-format digits, carrier prefix lookup.
#[derive(Debug, Clone, Copy)]
pub struct PhoneRule<'a> {
    tables: &'a NormalizationTables,
}

impl<'a> PhoneRule<'a> {
    pub fn new(tables: &'a NormalizationTables) -> Self {
        Self { tables }
    }
}

impl FieldRule for PhoneRule<'_> {
    type Output = String;

    fn normalize(&self, raw: &str) -> Normalized<String> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return Normalized::failed("no digits in phone candidate");
        }

        // International form: 84 + subscriber number.
        let local = if digits.starts_with("84") && digits.len() >= 11 {
            format!("0{}", &digits[2..])
        } else {
            digits
        };

        if LOCAL_PHONE.is_match(&local) {
            Normalized::ok(local)
        } else {
            Normalized::failed(format!("not a local phone number: {}", local))
        }
    }

    fn validate(&self, phone: &String) -> ValidationResult {
        let mut result = ValidationResult::new();
        if !VALID_PHONE.is_match(phone) {
            result.error(format!("invalid phone number format: {}", phone));
            return result;
        }
        if self.tables.carrier(phone).is_none() {
            result.warning(format!("unknown mobile prefix: {}", &phone[..3]));
        }
        result
    }

    fn conforms(&self, raw: &str) -> bool {
        let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
        let letters = raw.chars().filter(|c| c.is_alphabetic()).count();
        (9..=13).contains(&digits) && letters < digits
    }
}
