//! Household member list normalization and validation.
//!
//! Member lists arrive in many layouts: table rows (`name\trelationship\tyear`),
//! dashed items (`Phạm Văn Nam - Chồng - 1983`), labelled items
//! (`Vợ: Nguyễn Thị Lan (1990)`) and comma-joined paragraphs
//! (`Lê Văn Tuấn (Chồng, 1982), Phan Thị Oanh (Con, 2014)`). Items are split
//! first, then each item is broken into segments and the segments are
//! classified as relationship, birth year or name.

use tracing::debug;

use super::patterns::YEAR_SHAPE;
use super::{FieldRule, NormalizationTables, Normalized, ValidationResult};
use crate::models::{Member, ValidationConfig};

/// Words that mark a leading label such as `Thành viên:`.
const LABEL_WORDS: &[&str] = &[
    "thành viên",
    "thanh vien",
    "gia đình",
    "gia dinh",
    "nhân khẩu",
    "member",
    "family",
];

const SEGMENT_SEPARATORS: &[char] = &['\t', '-', ':', '(', ')', ','];

/// Member list rule.
#[derive(Debug, Clone, Copy)]
pub struct MembersRule<'a> {
    tables: &'a NormalizationTables,
    limits: &'a ValidationConfig,
}

impl<'a> MembersRule<'a> {
    pub fn new(tables: &'a NormalizationTables, limits: &'a ValidationConfig) -> Self {
        Self { tables, limits }
    }

    /// Whether `text` mentions a kinship word or a plausible birth year.
    pub fn has_kinship_or_year(&self, text: &str) -> bool {
        YEAR_SHAPE.is_match(text) || self.has_kinship(text)
    }

    /// A kinship word counts only as a whole segment or as the leading words
    /// of one, so given names such as "Anh" or "Em" inside a name do not.
    fn has_kinship(&self, text: &str) -> bool {
        text.split(SEGMENT_SEPARATORS)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|s| self.tables.relationship(s).is_some() || self.leading_kinship(s).is_some())
    }

    /// An item is self-contained when it has a kinship word or year plus
    /// at least one other word.
    fn is_self_contained(&self, piece: &str) -> bool {
        let words = piece.split_whitespace().count();
        words >= 2 && self.has_kinship_or_year(piece)
    }

    /// Split a candidate into member items.
    pub fn split_items(&self, raw: &str) -> Vec<String> {
        let mut items = Vec::new();
        for line in raw.split(['\n', '|', ';']) {
            let line = strip_label(line).trim();
            if line.is_empty() {
                continue;
            }
            let pieces = split_top_level_commas(line);
            let self_contained = pieces.iter().filter(|p| self.is_self_contained(p)).count();
            if pieces.len() > 1 && self_contained >= 2 {
                items.extend(
                    pieces
                        .into_iter()
                        .map(|p| p.trim().to_string())
                        .filter(|p| !p.is_empty()),
                );
            } else {
                items.push(line.to_string());
            }
        }
        items
    }

    /// Parse one item into a member, `None` when it has neither a
    /// relationship nor a birth year.
    pub fn parse_member(&self, item: &str) -> Option<Member> {
        let item = strip_label(item);
        let mut name_parts: Vec<String> = Vec::new();
        let mut relationship: Option<String> = None;
        let mut birth_year: Option<u16> = None;

        for segment in item.split(SEGMENT_SEPARATORS) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            if relationship.is_none() {
                if let Some(rel) = self.tables.relationship(segment) {
                    relationship = Some(rel.to_string());
                    continue;
                }
            }
            if birth_year.is_none() && is_year(segment) {
                birth_year = segment.parse().ok();
                continue;
            }
            name_parts.push(segment.to_string());
        }

        // "Vợ Nguyễn Thị Cẩm": kinship word leading the name.
        if relationship.is_none() {
            if let Some(first) = name_parts.first_mut() {
                if let Some((rel, rest)) = self.leading_kinship(first) {
                    relationship = Some(rel);
                    *first = rest;
                }
            }
        }

        if relationship.is_none() && birth_year.is_none() {
            return None;
        }

        let name = name_parts
            .iter()
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Some(Member {
            name,
            relationship,
            birth_year,
        })
    }

    /// Kinship word (one or two words) at the start of a longer name.
    fn leading_kinship(&self, text: &str) -> Option<(String, String)> {
        let words: Vec<&str> = text.split_whitespace().collect();
        for take in [2, 1] {
            if words.len() < take + 2 {
                continue;
            }
            let head = words[..take].join(" ");
            if let Some(rel) = self.tables.relationship(&head) {
                return Some((rel.to_string(), words[take..].join(" ")));
            }
        }
        None
    }
}

impl FieldRule for MembersRule<'_> {
    type Output = Vec<Member>;

    fn normalize(&self, raw: &str) -> Normalized<Vec<Member>> {
        let mut members: Vec<Member> = Vec::new();
        let mut dropped = 0usize;

        for item in self.split_items(raw) {
            match self.parse_member(&item) {
                Some(member) => {
                    let duplicate = members.iter().any(|m| {
                        m.name.to_lowercase() == member.name.to_lowercase()
                            && m.relationship == member.relationship
                    });
                    if !duplicate {
                        members.push(member);
                    }
                }
                None => {
                    debug!("Dropped member item without relationship or year: {}", item);
                    dropped += 1;
                }
            }
        }

        let mut notes = Vec::new();
        if dropped > 0 {
            notes.push(format!("dropped {} unparseable member item(s)", dropped));
        }
        if members.is_empty() {
            notes.push("no household members recognized".to_string());
            return Normalized { value: None, notes };
        }
        Normalized {
            value: Some(members),
            notes,
        }
    }

    fn validate(&self, members: &Vec<Member>) -> ValidationResult {
        let mut result = ValidationResult::new();
        if members.is_empty() {
            result.error("member list is empty");
            return result;
        }

        for (i, member) in members.iter().enumerate() {
            let n = i + 1;
            if member.name.trim().is_empty() {
                result.warning(format!("member {}: empty name", n));
            }
            match &member.relationship {
                None => result.warning(format!("member {}: missing relationship", n)),
                Some(rel) if !self.tables.is_canonical_relationship(rel) => {
                    result.warning(format!("member {}: unknown relationship {}", n, rel))
                }
                Some(_) => {}
            }
            if let Some(year) = member.birth_year {
                if year < self.limits.min_birth_year || year > self.limits.reference_year {
                    result.warning(format!("member {}: implausible birth year {}", n, year));
                }
            }
        }
        result
    }

    fn conforms(&self, raw: &str) -> bool {
        raw.lines().any(|line| self.has_kinship_or_year(line))
    }
}

fn is_year(segment: &str) -> bool {
    segment.len() == 4 && segment.chars().all(|c| c.is_ascii_digit())
}

/// Drop a leading `Thành viên:`-style label.
fn strip_label(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some((head, tail)) = trimmed.split_once(':') {
        let head = head.to_lowercase();
        if LABEL_WORDS.iter().any(|w| head.contains(w)) {
            return tail;
        }
    }
    trimmed
}

/// Split on commas outside parentheses.
fn split_top_level_commas(line: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in line.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = (depth - 1).max(0),
            ',' if depth == 0 => {
                pieces.push(&line[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&line[start..]);
    pieces
}
