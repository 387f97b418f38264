//! Shape patterns used to pick values out of free text.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::FieldType;

lazy_static! {
    // Phone: optional +, digits with common separators.
    pub static ref PHONE_SHAPE: Regex = Regex::new(
        r"\+?\d[\d .\-()]{7,16}\d"
    ).unwrap();

    // Amount with an optional unit word ("18 triệu", "25,500,000 VND").
    pub static ref AMOUNT_SHAPE: Regex = Regex::new(
        r"\d+(?:[.,]\d+)*(?:\s*\p{L}+)?"
    ).unwrap();

    // Run of words naming a bank, stops at cell and line boundaries.
    pub static ref BANK_SHAPE: Regex = Regex::new(
        r"\p{L}[\p{L}\d .&()\-]{1,58}[\p{L})]"
    ).unwrap();

    // Birth year token.
    pub static ref YEAR_SHAPE: Regex = Regex::new(
        r"\b(?:19|20)\d{2}\b"
    ).unwrap();

    // Letter prefix with digits, or a compact alphanumeric run.
    pub static ref CODE_SHAPE: Regex = Regex::new(
        r"\b[A-Za-z]{2,4} ?\d{5,12}\b|\b[A-Za-z0-9]{8,15}\b"
    ).unwrap();
}

/// Shape regex for scalar field types; lists are line-based.
pub fn shape_for(field_type: FieldType) -> Option<&'static Regex> {
    match field_type {
        FieldType::Phone => Some(&*PHONE_SHAPE),
        FieldType::Currency => Some(&*AMOUNT_SHAPE),
        FieldType::BankReference => Some(&*BANK_SHAPE),
        FieldType::AlphanumericCode => Some(&*CODE_SHAPE),
        FieldType::StructuredList => None,
    }
}
