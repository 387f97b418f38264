//! Bank reference normalization and validation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FieldRule, NormalizationTables, Normalized, ValidationResult};

const MAX_BANK_CHARS: usize = 60;

/// A bank code with its full name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankRef {
    pub code: String,
    pub full_name: String,
}

/// Bank rule: maps codes, aliases and free text onto the bank table.
#[derive(Debug, Clone, Copy)]
pub struct BankRule<'a> {
    tables: &'a NormalizationTables,
}

impl<'a> BankRule<'a> {
    pub fn new(tables: &'a NormalizationTables) -> Self {
        Self { tables }
    }

    fn known(&self, code: &str) -> Option<BankRef> {
        self.tables.bank_name(code).map(|name| BankRef {
            code: code.trim().to_uppercase(),
            full_name: name.to_string(),
        })
    }

    /// Resolve a candidate against the table, most specific match first.
    pub fn lookup(&self, raw: &str) -> Option<BankRef> {
        let cleaned = raw.trim();

        if let Some(bank) = self.known(cleaned) {
            return Some(bank);
        }
        if let Some(code) = self.tables.bank_alias(cleaned) {
            return self.known(code);
        }

        // Uppercase tokens that are codes, e.g. "Vietcombank (VCB)".
        let token_match = cleaned
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 2 && t.chars().all(|c| c.is_ascii_uppercase()))
            .find_map(|t| self.known(t));
        if token_match.is_some() {
            return token_match;
        }

        let lower = cleaned.to_lowercase();
        let mut aliases: Vec<(&str, &str)> = self.tables.bank_aliases().collect();
        aliases.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        aliases
            .into_iter()
            .find(|(alias, _)| contains_word(&lower, alias))
            .and_then(|(_, code)| self.known(code))
    }
}

impl FieldRule for BankRule<'_> {
    type Output = BankRef;

    fn normalize(&self, raw: &str) -> Normalized<BankRef> {
        let cleaned = raw.trim().trim_end_matches(['.', ',', ';', ':']).trim();
        if cleaned.is_empty() {
            return Normalized::failed("empty bank candidate");
        }

        match self.lookup(cleaned) {
            Some(bank) => Normalized::ok(bank),
            None => {
                debug!("Unmapped bank reference: {}", cleaned);
                Normalized::ok(BankRef {
                    code: cleaned.to_string(),
                    full_name: cleaned.to_string(),
                })
                .with_note("unmapped bank reference")
            }
        }
    }

    fn validate(&self, bank: &BankRef) -> ValidationResult {
        let mut result = ValidationResult::new();
        if bank.code.trim().is_empty() {
            result.error("bank code is empty");
        } else if self.tables.bank_name(&bank.code).is_none() {
            result.warning(format!("bank not in known banks list: {}", bank.code));
        }
        result
    }

    fn conforms(&self, raw: &str) -> bool {
        let letters = raw.chars().filter(|c| c.is_alphabetic()).count();
        let digits = raw.chars().filter(|c| c.is_ascii_digit()).count();
        letters >= 2 && digits < letters && raw.chars().count() <= MAX_BANK_CHARS
    }
}

/// Whether `needle` occurs in `haystack` delimited by non-alphanumerics.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
