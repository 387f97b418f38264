//! Per-field pattern specifications.
//!
//! A [`PatternRegistry`] is assembled through [`PatternRegistryBuilder`]
//! from uncompiled [`FieldDraft`]s, then frozen: regexes are compiled once in
//! [`PatternRegistryBuilder::build`] and the registry is shared read-only
//! (usually through an `Arc`) by every extraction.

mod defaults;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::error::PatternError;
use crate::models::{FieldType, KnownValues, PatternOverride, VssxConfig};

lazy_static! {
    /// Registry with the built-in fields and patterns.
    pub static ref DEFAULT_REGISTRY: PatternRegistry = PatternRegistry::builder()
        .with_defaults()
        .build()
        .unwrap();
}

/// Where a value may sit in the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StructuralHint {
    /// A `td`/`th` whose text contains the label; the value is the next cell.
    LabeledCell(String),
    /// A `label`/`span`/`strong`/`b`/`dt`/`th` whose text contains the label;
    /// the value is the next element sibling.
    LabeledSibling(String),
    /// An element whose attribute equals (`exact`) or contains `needle`.
    Attribute {
        name: String,
        needle: String,
        exact: bool,
    },
    /// Non-header rows of a table whose text contains `keyword`.
    TableRows { keyword: String },
    /// Child elements of a container whose class contains `class_needle`.
    ContainerItems { class_needle: String },
}

/// Predicate on an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodeTest {
    pub tag: Option<String>,
    pub class_needle: Option<String>,
    pub text_needle: Option<String>,
}

impl NodeTest {
    pub fn class(needle: &str) -> Self {
        Self {
            class_needle: Some(needle.to_string()),
            ..Self::default()
        }
    }

    pub fn tag_with_text(tag: &str, needle: &str) -> Self {
        Self {
            tag: Some(tag.to_string()),
            text_needle: Some(needle.to_string()),
            ..Self::default()
        }
    }
}

/// Filter on a descendant text node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextFilter {
    MinDigits(usize),
    MinChars(usize),
    HasYear,
    Any,
}

/// Descendant text of an element matching `ancestor`, filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathHint {
    pub ancestor: NodeTest,
    pub filter: TextFilter,
}

/// Uncompiled description of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDraft {
    pub name: String,
    pub field_type: FieldType,
    pub known_value_keys: Vec<String>,
    pub structural: Vec<StructuralHint>,
    pub regex_patterns: Vec<String>,
    pub context_keywords: Vec<String>,
    pub paths: Vec<PathHint>,
    pub fallback_patterns: Vec<String>,
}

impl FieldDraft {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            known_value_keys: Vec::new(),
            structural: Vec::new(),
            regex_patterns: Vec::new(),
            context_keywords: Vec::new(),
            paths: Vec::new(),
            fallback_patterns: Vec::new(),
        }
    }

    pub fn known_keys(mut self, keys: &[&str]) -> Self {
        self.known_value_keys
            .extend(keys.iter().map(|k| k.to_string()));
        self
    }

    pub fn structural(mut self, hint: StructuralHint) -> Self {
        self.structural.push(hint);
        self
    }

    pub fn regex(mut self, pattern: &str) -> Self {
        self.regex_patterns.push(pattern.to_string());
        self
    }

    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.context_keywords
            .extend(keywords.iter().map(|k| k.to_string()));
        self
    }

    pub fn path(mut self, ancestor: NodeTest, filter: TextFilter) -> Self {
        self.paths.push(PathHint { ancestor, filter });
        self
    }

    pub fn fallback(mut self, pattern: &str) -> Self {
        self.fallback_patterns.push(pattern.to_string());
        self
    }

    fn apply(&mut self, extra: &PatternOverride) {
        self.known_value_keys
            .extend(extra.known_value_keys.iter().cloned());
        self.regex_patterns
            .extend(extra.regex_patterns.iter().cloned());
        self.context_keywords
            .extend(extra.context_keywords.iter().cloned());
        self.fallback_patterns
            .extend(extra.fallback_patterns.iter().cloned());
    }

    fn compile(self) -> Result<FieldSpec, PatternError> {
        let compile_all = |patterns: &[String]| -> Result<Vec<Regex>, PatternError> {
            patterns
                .iter()
                .map(|p| compile(&self.name, p))
                .collect()
        };

        let regex = compile_all(&self.regex_patterns)?;
        let fallback = compile_all(&self.fallback_patterns)?;
        let context = self
            .context_keywords
            .iter()
            .map(|k| compile(&self.name, &format!("(?i){}", regex::escape(k.trim()))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FieldSpec {
            name: self.name,
            field_type: self.field_type,
            known_value_keys: self.known_value_keys,
            patterns: PatternSet {
                structural: self.structural,
                regex,
                context_keywords: self.context_keywords,
                context,
                paths: self.paths,
                fallback,
            },
        })
    }
}

fn compile(field: &str, pattern: &str) -> Result<Regex, PatternError> {
    Regex::new(pattern).map_err(|e| PatternError::InvalidRegex {
        field: field.to_string(),
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Compiled patterns for one field.
#[derive(Debug, Clone)]
pub struct PatternSet {
    pub structural: Vec<StructuralHint>,
    pub regex: Vec<Regex>,
    pub context_keywords: Vec<String>,
    /// Case-insensitive literal matchers for `context_keywords`.
    pub context: Vec<Regex>,
    pub paths: Vec<PathHint>,
    pub fallback: Vec<Regex>,
}

/// A registered field with its compiled patterns.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    /// Aliases under which a caller may supply a known value.
    pub known_value_keys: Vec<String>,
    pub patterns: PatternSet,
}

impl FieldSpec {
    /// The known value for this field, looked up by name then by alias.
    pub fn known_value<'k>(&self, known: &'k KnownValues) -> Option<&'k str> {
        std::iter::once(&self.name)
            .chain(self.known_value_keys.iter())
            .find_map(|key| known.get(key))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Frozen set of field specifications, in registration order.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    fields: Vec<FieldSpec>,
}

impl PatternRegistry {
    pub fn builder() -> PatternRegistryBuilder {
        PatternRegistryBuilder::default()
    }

    /// Built-in fields extended by configuration pattern overrides.
    pub fn from_config(config: &VssxConfig) -> Result<Self, PatternError> {
        let mut builder = Self::builder().with_defaults();
        for extra in &config.patterns {
            builder = builder.extend(extra)?;
        }
        builder.build()
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        DEFAULT_REGISTRY.clone()
    }
}

/// Builder for [`PatternRegistry`].
#[derive(Debug, Clone, Default)]
pub struct PatternRegistryBuilder {
    drafts: Vec<FieldDraft>,
}

impl PatternRegistryBuilder {
    /// Add the built-in fields.
    pub fn with_defaults(mut self) -> Self {
        self.drafts.extend(defaults::default_fields());
        self
    }

    /// Add a field.
    pub fn field(mut self, draft: FieldDraft) -> Self {
        self.drafts.push(draft);
        self
    }

    /// Append patterns to a field, adding the field when `field_type` is set
    /// and the name is new.
    pub fn extend(mut self, extra: &PatternOverride) -> Result<Self, PatternError> {
        if let Some(draft) = self.drafts.iter_mut().find(|d| d.name == extra.field) {
            draft.apply(extra);
            return Ok(self);
        }

        let Some(type_name) = &extra.field_type else {
            return Err(PatternError::UnknownField(extra.field.clone()));
        };
        let mut draft = FieldDraft::new(extra.field.clone(), type_name.parse()?);
        draft.apply(extra);
        self.drafts.push(draft);
        Ok(self)
    }

    /// Compile every pattern and freeze the registry.
    pub fn build(self) -> Result<PatternRegistry, PatternError> {
        let mut seen = HashSet::new();
        for draft in &self.drafts {
            if !seen.insert(draft.name.as_str()) {
                return Err(PatternError::DuplicateField(draft.name.clone()));
            }
        }

        let fields = self
            .drafts
            .into_iter()
            .map(FieldDraft::compile)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Built pattern registry with {} fields", fields.len());
        Ok(PatternRegistry { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_registry_fields() {
        let registry = &*DEFAULT_REGISTRY;
        assert_eq!(
            registry.field_names(),
            vec!["phone", "income", "bank", "household_code", "members"]
        );
        assert_eq!(registry.get("income").unwrap().field_type, FieldType::Currency);
        for field in registry.fields() {
            assert!(!field.patterns.regex.is_empty(), "{} has no regex", field.name);
            assert!(!field.patterns.fallback.is_empty(), "{} has no fallback", field.name);
            assert_eq!(field.patterns.context.len(), field.patterns.context_keywords.len());
        }
    }

    #[test]
    fn test_invalid_regex_is_rejected() {
        let err = PatternRegistry::builder()
            .field(FieldDraft::new("phone", FieldType::Phone).regex("(unclosed"))
            .build()
            .unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { ref field, .. } if field == "phone"));
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let err = PatternRegistry::builder()
            .with_defaults()
            .field(FieldDraft::new("phone", FieldType::Phone))
            .build()
            .unwrap_err();
        assert_eq!(err, PatternError::DuplicateField("phone".to_string()));
    }

    #[test]
    fn test_extend_existing_and_new_fields() {
        let extra = PatternOverride {
            field: "phone".to_string(),
            context_keywords: vec!["di động (a+b)".to_string()],
            ..PatternOverride::default()
        };
        let new_field = PatternOverride {
            field: "tax_code".to_string(),
            field_type: Some("alphanumeric_code".to_string()),
            regex_patterns: vec![r"MST:\s*(\d{10})".to_string()],
            ..PatternOverride::default()
        };
        let registry = PatternRegistry::builder()
            .with_defaults()
            .extend(&extra)
            .unwrap()
            .extend(&new_field)
            .unwrap()
            .build()
            .unwrap();

        let phone = registry.get("phone").unwrap();
        assert!(phone.patterns.context.last().unwrap().is_match("DI ĐỘNG (A+B): 09"));
        assert_eq!(registry.field_names().last(), Some(&"tax_code"));
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn test_extend_unknown_field_without_type() {
        let extra = PatternOverride {
            field: "email".to_string(),
            ..PatternOverride::default()
        };
        let err = PatternRegistry::builder().extend(&extra).unwrap_err();
        assert_eq!(err, PatternError::UnknownField("email".to_string()));
    }

    #[test]
    fn test_known_value_lookup_by_alias() {
        let registry = &*DEFAULT_REGISTRY;
        let phone = registry.get("phone").unwrap();
        let mut known = KnownValues::new();
        known.insert("so_dien_thoai".to_string(), "0912345678".to_string());
        assert_eq!(phone.known_value(&known), Some("0912345678"));

        known.insert("phone".to_string(), "0987654321".to_string());
        assert_eq!(phone.known_value(&known), Some("0987654321"));

        let empty = KnownValues::new();
        assert_eq!(phone.known_value(&empty), None);
    }
}
