//! Field types and canonical field values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PatternError;

/// Kind of value a field holds.
///
/// Every variant is bound to exactly one normalizer and one validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Mobile or landline phone number.
    Phone,
    /// Monetary amount.
    Currency,
    /// Bank code or bank name.
    BankReference,
    /// Identifier made of letters and digits (household code).
    AlphanumericCode,
    /// List of household members.
    StructuredList,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Phone => "phone",
            FieldType::Currency => "currency",
            FieldType::BankReference => "bank_reference",
            FieldType::AlphanumericCode => "alphanumeric_code",
            FieldType::StructuredList => "structured_list",
        }
    }

    /// Whether candidates for this type aggregate several matches.
    pub fn is_list(&self) -> bool {
        matches!(self, FieldType::StructuredList)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "phone" => Ok(FieldType::Phone),
            "currency" | "income" => Ok(FieldType::Currency),
            "bank_reference" | "bank" => Ok(FieldType::BankReference),
            "alphanumeric_code" | "code" => Ok(FieldType::AlphanumericCode),
            "structured_list" | "list" => Ok(FieldType::StructuredList),
            other => Err(PatternError::UnknownFieldType(other.to_string())),
        }
    }
}

/// One household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    /// Canonical relationship to the head of household.
    pub relationship: Option<String>,
    pub birth_year: Option<u16>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match (&self.relationship, self.birth_year) {
            (Some(rel), Some(year)) => write!(f, " ({}, {})", rel, year),
            (Some(rel), None) => write!(f, " ({})", rel),
            (None, Some(year)) => write!(f, " ({})", year),
            (None, None) => Ok(()),
        }
    }
}

/// Canonical value of an extracted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Local-format digits, e.g. `0912345678`.
    Phone(String),
    /// Amount in base currency units.
    Income { amount: i64, currency: String },
    Bank { code: String, full_name: String },
    Code(String),
    Members(Vec<Member>),
}

impl FieldValue {
    /// The field type this value belongs to.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Phone(_) => FieldType::Phone,
            FieldValue::Income { .. } => FieldType::Currency,
            FieldValue::Bank { .. } => FieldType::BankReference,
            FieldValue::Code(_) => FieldType::AlphanumericCode,
            FieldValue::Members(_) => FieldType::StructuredList,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Phone(phone) => f.write_str(phone),
            FieldValue::Income { amount, currency } => write!(f, "{} {}", amount, currency),
            FieldValue::Bank { code, full_name } if code == full_name => f.write_str(code),
            FieldValue::Bank { code, full_name } => write!(f, "{} ({})", code, full_name),
            FieldValue::Code(code) => f.write_str(code),
            FieldValue::Members(members) => {
                let parts: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                f.write_str(&parts.join("; "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_field_type_from_str() {
        assert_eq!("Phone".parse::<FieldType>().unwrap(), FieldType::Phone);
        assert_eq!("bank".parse::<FieldType>().unwrap(), FieldType::BankReference);
        assert_eq!(
            "structured_list".parse::<FieldType>().unwrap(),
            FieldType::StructuredList
        );
        assert!(matches!(
            "date".parse::<FieldType>(),
            Err(PatternError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn test_value_display() {
        let income = FieldValue::Income {
            amount: 18_000_000,
            currency: "VND".to_string(),
        };
        assert_eq!(income.to_string(), "18000000 VND");

        let bank = FieldValue::Bank {
            code: "VCB".to_string(),
            full_name: "Vietcombank".to_string(),
        };
        assert_eq!(bank.to_string(), "VCB (Vietcombank)");

        let members = FieldValue::Members(vec![
            Member {
                name: "Trần Thị Bình".to_string(),
                relationship: Some("Vợ".to_string()),
                birth_year: Some(1987),
            },
            Member {
                name: "Lê Văn Minh".to_string(),
                relationship: Some("Con".to_string()),
                birth_year: None,
            },
        ]);
        assert_eq!(members.to_string(), "Trần Thị Bình (Vợ, 1987); Lê Văn Minh (Con)");
        assert_eq!(members.field_type(), FieldType::StructuredList);
    }

    #[test]
    fn test_value_serializes_with_tag() {
        let value = FieldValue::Code("HGD123456789".to_string());
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"code","value":"HGD123456789"}"#);
    }
}
