//! The strategy chain.
//!
//! Each strategy proposes raw candidates for one field; the chain scores them
//! against the strategy's ceiling and floor and returns the first one that
//! clears the floor. Strategies are tried in priority order and the fallback
//! patterns come last.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use tracing::debug;

use super::rules::patterns::{shape_for, YEAR_SHAPE};
use super::rules::{MembersRule, RuleSet};
use crate::document::{contains_ci, Document, NodeId, NodeRef};
use crate::models::{ExtractionConfig, FieldType, ScoringConfig, StrategyKind};
use crate::registry::{FieldSpec, NodeTest, PathHint, StructuralHint, TextFilter};

/// Tags that may carry a label for the next element sibling.
const LABEL_TAGS: &[&str] = &["label", "span", "strong", "b", "dt", "th"];

const CELL_TAGS: &[&str] = &["td", "th"];

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Label cells longer than this are layout containers, not labels.
const MAX_LABEL_CHARS: usize = 80;

/// Lines a list may span after a context keyword.
const MAX_LIST_LINES: usize = 30;

/// A located raw value with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub raw: String,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub fallback_used: bool,
}

/// Everything a strategy may consult for one field.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub document: &'a Document,
    pub field: &'a FieldSpec,
    pub rules: RuleSet<'a>,
    pub scoring: &'a ScoringConfig,
    pub extraction: &'a ExtractionConfig,
}

impl StrategyContext<'_> {
    fn field_type(&self) -> FieldType {
        self.field.field_type
    }

    fn members(&self) -> MembersRule<'_> {
        MembersRule::new(self.rules.tables, self.rules.limits)
    }
}

/// One way of locating a field in a document.
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Raw candidates in preference order.
    fn candidates(&self, ctx: &StrategyContext<'_>) -> Vec<String>;
}

/// Ordered strategies with confidence scoring.
pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyChain {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    /// First candidate, across strategies in order, at or above its floor.
    pub fn run(&self, ctx: &StrategyContext<'_>) -> Option<Candidate> {
        for strategy in &self.strategies {
            let kind = strategy.kind();
            let bounds = ctx.scoring.bounds(kind);

            for raw in strategy.candidates(ctx) {
                let raw = raw.trim();
                if raw.chars().count() < ctx.extraction.min_candidate_chars {
                    continue;
                }

                let factor = if ctx.rules.conforms(ctx.field_type(), raw) {
                    1.0
                } else {
                    ctx.scoring.shape_mismatch_factor
                };
                let confidence = bounds.ceiling * factor;

                if confidence >= bounds.floor {
                    debug!(
                        "{}: {} strategy accepted {:?} ({:.2})",
                        ctx.field.name, kind, raw, confidence
                    );
                    return Some(Candidate {
                        raw: raw.to_string(),
                        strategy: kind,
                        confidence,
                        fallback_used: kind == StrategyKind::Fallback,
                    });
                }
                debug!(
                    "{}: {} strategy rejected {:?} ({:.2} < {:.2})",
                    ctx.field.name, kind, raw, confidence, bounds.floor
                );
            }
        }

        debug!("{}: no strategy produced a candidate", ctx.field.name);
        None
    }
}

impl Default for StrategyChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(StructuralStrategy),
            Box::new(RegexStrategy),
            Box::new(ContextStrategy),
            Box::new(PathStrategy),
            Box::new(FallbackStrategy),
        ])
    }
}

impl std::fmt::Debug for StrategyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyChain")
            .field("strategies", &self.kinds())
            .finish()
    }
}

/// Scalars propose every value; lists propose one newline-joined aggregate.
fn collect(field_type: FieldType, values: Vec<String>) -> Vec<String> {
    let values: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if field_type.is_list() {
        if values.is_empty() {
            Vec::new()
        } else {
            vec![values.join("\n")]
        }
    } else {
        values
    }
}

/// Drop elements that have a matching ancestor.
fn outermost<'a>(nodes: Vec<NodeRef<'a>>) -> Vec<NodeRef<'a>> {
    let ids: HashSet<NodeId> = nodes.iter().map(|n| n.id()).collect();
    // Whether a node is, or sits below, one of `nodes`.
    let mut covered: HashMap<NodeId, bool> = HashMap::new();

    nodes
        .into_iter()
        .filter(|node| {
            let mut path = Vec::new();
            let mut below = false;
            for ancestor in node.ancestors() {
                if let Some(&known) = covered.get(&ancestor.id()) {
                    below = known;
                    break;
                }
                if ids.contains(&ancestor.id()) {
                    below = true;
                    break;
                }
                path.push(ancestor.id());
            }
            covered.extend(path.into_iter().map(|id| (id, below)));
            !below
        })
        .collect()
}

/// Drop elements that have a matching descendant.
fn innermost<'a>(nodes: Vec<NodeRef<'a>>) -> Vec<NodeRef<'a>> {
    let mut shadowed: HashSet<NodeId> = HashSet::new();
    for node in &nodes {
        for ancestor in node.ancestors() {
            // Everything above an already shadowed node is shadowed too.
            if !shadowed.insert(ancestor.id()) {
                break;
            }
        }
    }
    nodes
        .into_iter()
        .filter(|n| !shadowed.contains(&n.id()))
        .collect()
}

/// Strategy 1: structural hints.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralStrategy;

impl StructuralStrategy {
    fn labeled_cell(doc: &Document, label: &str) -> Vec<String> {
        doc.find_by_text(CELL_TAGS, label)
            .filter(|cell| cell.text().chars().count() <= MAX_LABEL_CHARS)
            .filter_map(|cell| cell.next_element_sibling())
            .filter(|next| next.tag().is_some_and(|t| CELL_TAGS.contains(&t)))
            .map(|next| next.value_text())
            .collect()
    }

    fn labeled_sibling(doc: &Document, label: &str) -> Vec<String> {
        doc.find_by_text(LABEL_TAGS, label)
            .filter(|el| el.text().chars().count() <= MAX_LABEL_CHARS)
            .filter_map(|el| el.next_element_sibling())
            .map(|next| next.value_text())
            .collect()
    }

    fn attribute(doc: &Document, name: &str, needle: &str, exact: bool) -> Vec<String> {
        doc.find_by_attribute(name, needle, exact)
            .map(|el| el.value_text())
            .collect()
    }

    fn table_rows(doc: &Document, keyword: &str) -> Vec<String> {
        let tables: Vec<_> = doc
            .find_by_tag("table")
            .filter(|t| contains_ci(&t.text(), keyword))
            .collect();

        let mut rows = Vec::new();
        for table in innermost(tables) {
            for row in table.descendants() {
                if row.tag() != Some("tr") {
                    continue;
                }
                let own_table = row.ancestors().find(|a| a.tag() == Some("table"));
                if own_table.map(|t| t.id()) != Some(table.id()) {
                    continue;
                }
                if row.child_elements().any(|c| c.tag() == Some("th")) {
                    continue;
                }
                let text = row.text();
                if contains_ci(&text, keyword) {
                    continue;
                }
                rows.push(text);
            }
        }
        rows
    }

    fn container_items(doc: &Document, class_needle: &str) -> Vec<String> {
        let containers: Vec<_> = doc.elements().filter(|e| e.has_class(class_needle)).collect();

        let mut items = Vec::new();
        for container in outermost(containers) {
            let children: Vec<String> = container
                .child_elements()
                .filter(|c| !c.tag().is_some_and(|t| HEADING_TAGS.contains(&t)))
                .map(|c| c.value_text())
                .filter(|t| !t.trim().is_empty() && !t.trim_end().ends_with(':'))
                .collect();
            if children.is_empty() {
                items.push(container.text());
            } else {
                items.extend(children);
            }
        }
        items
    }

    fn apply(doc: &Document, hint: &StructuralHint) -> Vec<String> {
        match hint {
            StructuralHint::LabeledCell(label) => Self::labeled_cell(doc, label),
            StructuralHint::LabeledSibling(label) => Self::labeled_sibling(doc, label),
            StructuralHint::Attribute { name, needle, exact } => {
                Self::attribute(doc, name, needle, *exact)
            }
            StructuralHint::TableRows { keyword } => Self::table_rows(doc, keyword),
            StructuralHint::ContainerItems { class_needle } => {
                Self::container_items(doc, class_needle)
            }
        }
    }
}

impl Strategy for StructuralStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Structural
    }

    fn candidates(&self, ctx: &StrategyContext<'_>) -> Vec<String> {
        ctx.field
            .patterns
            .structural
            .iter()
            .flat_map(|hint| collect(ctx.field_type(), Self::apply(ctx.document, hint)))
            .collect()
    }
}

/// Matches of `patterns` over `text`: group 1 when present, else the match.
fn regex_candidates(field_type: FieldType, patterns: &[Regex], text: &str) -> Vec<String> {
    patterns
        .iter()
        .flat_map(|re| {
            let values: Vec<String> = re
                .captures_iter(text)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(0)))
                .map(|m| m.as_str().to_string())
                .collect();
            collect(field_type, values)
        })
        .collect()
}

/// Strategy 2: regex patterns over the document text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexStrategy;

impl Strategy for RegexStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Regex
    }

    fn candidates(&self, ctx: &StrategyContext<'_>) -> Vec<String> {
        regex_candidates(ctx.field_type(), &ctx.field.patterns.regex, ctx.document.text())
    }
}

/// Strategy 3: values near context keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextStrategy;

impl ContextStrategy {
    /// Text after a keyword: at most `width` chars and one line break,
    /// starting after a nearby colon.
    fn window(text: &str, width: usize) -> &str {
        let mut end = text.len();
        let mut breaks = 0;
        for (n, (i, c)) in text.char_indices().enumerate() {
            if n >= width {
                end = i;
                break;
            }
            if c == '\n' {
                breaks += 1;
                if breaks > 1 {
                    end = i;
                    break;
                }
            }
        }
        let window = &text[..end];

        let head_end = window
            .char_indices()
            .nth(30)
            .map(|(i, _)| i)
            .unwrap_or(window.len());
        let head = &window[..head_end];
        match head.find(':') {
            Some(colon) if !head[..colon].contains('\n') => &window[colon + 1..],
            _ => window,
        }
    }

    fn scalar(ctx: &StrategyContext<'_>, after: &str) -> Option<String> {
        let shape = shape_for(ctx.field_type())?;
        let window = Self::window(after, ctx.extraction.context_window);
        shape
            .find_iter(window)
            .map(|m| m.as_str())
            .find(|raw| ctx.rules.conforms(ctx.field_type(), raw))
            .map(str::to_string)
    }

    fn list(members: &MembersRule<'_>, after: &str) -> Option<String> {
        let mut lines = after.lines();
        let mut picked = Vec::new();

        let first = lines.next().unwrap_or_default();
        let first = first.split_once(':').map(|(_, rest)| rest).unwrap_or(first);
        if members.has_kinship_or_year(first) {
            picked.push(first.trim());
        }
        for line in lines.take(MAX_LIST_LINES) {
            if !members.has_kinship_or_year(line) {
                break;
            }
            picked.push(line.trim());
        }

        if picked.is_empty() {
            None
        } else {
            Some(picked.join("\n"))
        }
    }
}

impl Strategy for ContextStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Context
    }

    fn candidates(&self, ctx: &StrategyContext<'_>) -> Vec<String> {
        let text = ctx.document.text();
        let members = ctx.members();
        let mut out = Vec::new();

        for keyword in &ctx.field.patterns.context {
            for m in keyword.find_iter(text) {
                let after = &text[m.end()..];
                let found = if ctx.field_type().is_list() {
                    Self::list(&members, after)
                } else {
                    Self::scalar(ctx, after)
                };
                out.extend(found);
            }
        }
        out
    }
}

/// Strategy 4: descendant text of structurally matched ancestors.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathStrategy;

impl PathStrategy {
    fn matches(node: &NodeRef<'_>, test: &NodeTest) -> bool {
        if let Some(tag) = &test.tag {
            if node.tag() != Some(tag.as_str()) {
                return false;
            }
        }
        if let Some(needle) = &test.class_needle {
            if !node.has_class(needle) {
                return false;
            }
        }
        if let Some(needle) = &test.text_needle {
            if !contains_ci(&node.text(), needle) {
                return false;
            }
        }
        true
    }

    fn passes(text: &str, filter: TextFilter) -> bool {
        match filter {
            TextFilter::MinDigits(n) => text.chars().filter(|c| c.is_ascii_digit()).count() >= n,
            TextFilter::MinChars(n) => text.chars().count() >= n,
            TextFilter::HasYear => YEAR_SHAPE.is_match(text),
            TextFilter::Any => true,
        }
    }

    /// Innermost elements matching `test`.
    ///
    /// Elements are visited deepest first so an element above a match is
    /// never tested, which keeps text needles from rendering every
    /// enclosing subtree.
    fn anchors<'a>(doc: &'a Document, test: &NodeTest) -> Vec<NodeRef<'a>> {
        if let Some(needle) = &test.text_needle {
            if !contains_ci(doc.text(), needle) {
                return Vec::new();
            }
        }

        let elements: Vec<_> = doc.elements().collect();
        let mut shadowed: HashSet<NodeId> = HashSet::new();
        let mut found = Vec::new();
        for node in elements.into_iter().rev() {
            if shadowed.contains(&node.id()) || !Self::matches(&node, test) {
                continue;
            }
            for ancestor in node.ancestors() {
                if !shadowed.insert(ancestor.id()) {
                    break;
                }
            }
            found.push(node);
        }
        found.reverse();
        found
    }

    fn texts(doc: &Document, hint: &PathHint) -> Vec<String> {
        let mut out = Vec::new();
        for anchor in Self::anchors(doc, &hint.ancestor) {
            let mut stack: Vec<NodeRef<'_>> = anchor.children().collect();
            stack.reverse();
            while let Some(node) = stack.pop() {
                if matches!(node.tag(), Some("script" | "style")) {
                    continue;
                }
                let Some(raw) = node.raw_text() else {
                    let mut children: Vec<_> = node.children().collect();
                    children.reverse();
                    stack.extend(children);
                    continue;
                };
                let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
                if text.is_empty() || text.ends_with(':') {
                    continue;
                }
                if Self::passes(&text, hint.filter) {
                    out.push(text);
                }
            }
        }
        out
    }
}

impl Strategy for PathStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Path
    }

    fn candidates(&self, ctx: &StrategyContext<'_>) -> Vec<String> {
        ctx.field
            .patterns
            .paths
            .iter()
            .flat_map(|hint| collect(ctx.field_type(), Self::texts(ctx.document, hint)))
            .collect()
    }
}

/// Strategy 5: loose fallback patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackStrategy;

impl Strategy for FallbackStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fallback
    }

    fn candidates(&self, ctx: &StrategyContext<'_>) -> Vec<String> {
        regex_candidates(ctx.field_type(), &ctx.field.patterns.fallback, ctx.document.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::rules::NormalizationTables;
    use crate::models::ValidationConfig;
    use crate::registry::{FieldDraft, PatternRegistry, DEFAULT_REGISTRY};
    use pretty_assertions::assert_eq;

    struct Fixture {
        tables: NormalizationTables,
        limits: ValidationConfig,
        scoring: ScoringConfig,
        extraction: ExtractionConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tables: NormalizationTables::builtin(),
                limits: ValidationConfig::default(),
                scoring: ScoringConfig::default(),
                extraction: ExtractionConfig::default(),
            }
        }

        fn run(&self, doc: &Document, field: &FieldSpec) -> Option<Candidate> {
            let ctx = StrategyContext {
                document: doc,
                field,
                rules: RuleSet::new(&self.tables, &self.limits),
                scoring: &self.scoring,
                extraction: &self.extraction,
            };
            StrategyChain::default().run(&ctx)
        }

        fn run_default(&self, html: &str, field: &str) -> Option<Candidate> {
            let doc = Document::parse(html).unwrap();
            self.run(&doc, DEFAULT_REGISTRY.get(field).unwrap())
        }
    }

    #[test]
    fn test_structural_wins_over_regex() {
        let html = r#"<table>
            <tr><td>Điện thoại:</td><td>0912 345 678</td></tr>
        </table>
        <p>Liên hệ: 0987654321</p>"#;
        let candidate = Fixture::new().run_default(html, "phone").unwrap();
        assert_eq!(candidate.raw, "0912 345 678");
        assert_eq!(candidate.strategy, StrategyKind::Structural);
        assert_eq!(candidate.confidence, 1.0);
        assert!(!candidate.fallback_used);
    }

    #[test]
    fn test_regex_when_no_structure() {
        let candidate = Fixture::new()
            .run_default("<p>Thu nhập: 18 triệu đồng</p>", "income")
            .unwrap();
        assert_eq!(candidate.strategy, StrategyKind::Regex);
        assert_eq!(candidate.raw, "18 triệu đồng");
        assert_eq!(candidate.confidence, 0.9);
    }

    #[test]
    fn test_labeled_sibling_and_select() {
        let html = r#"<form>
            <label>Ngân hàng:</label>
            <select name="bank_select"><option value="">--</option><option selected>Á Châu (ACB)</option></select>
        </form>"#;
        let candidate = Fixture::new().run_default(html, "bank").unwrap();
        assert_eq!(candidate.raw, "Á Châu (ACB)");
        assert_eq!(candidate.strategy, StrategyKind::Structural);
    }

    #[test]
    fn test_table_rows_skip_header() {
        let html = r#"<table class="family-table">
            <thead><tr><th>Họ tên</th><th>Quan hệ</th><th>Năm sinh</th></tr></thead>
            <tbody>
              <tr><td>Trần Thị Bình</td><td>Vợ</td><td>1987</td></tr>
              <tr><td>Nguyễn Văn Cường</td><td>Con</td><td>2015</td></tr>
            </tbody>
        </table>"#;
        let candidate = Fixture::new().run_default(html, "members").unwrap();
        assert_eq!(candidate.raw, "Trần Thị Bình\tVợ\t1987\nNguyễn Văn Cường\tCon\t2015");
        assert_eq!(candidate.strategy, StrategyKind::Structural);
    }

    #[test]
    fn test_container_items_skip_headings_and_nested_matches() {
        let html = r#"<div class="family-members">
            <h4>Thành viên gia đình</h4>
            <div class="member">Phạm Văn Nam - Chồng - 1983</div>
            <div class="member">Lê Văn Minh - Con - 2012</div>
        </div>"#;
        let candidate = Fixture::new().run_default(html, "members").unwrap();
        assert_eq!(
            candidate.raw,
            "Phạm Văn Nam - Chồng - 1983\nLê Văn Minh - Con - 2012"
        );
    }

    #[test]
    fn test_context_window() {
        let fixture = Fixture::new();
        let field = PatternRegistry::builder()
            .field(FieldDraft::new("phone", FieldType::Phone).keywords(&["gọi cho"]))
            .build()
            .unwrap();
        let spec = field.get("phone").unwrap();

        let near = Document::parse("<p>Vui lòng gọi cho số 0912 345 678 nhé</p>").unwrap();
        let candidate = fixture.run(&near, spec).unwrap();
        assert_eq!(candidate.strategy, StrategyKind::Context);
        assert_eq!(candidate.raw, "0912 345 678");
        assert_eq!(candidate.confidence, 0.8);

        let far = format!("<p>gọi cho {} 0912345678</p>", "x".repeat(120));
        let far = Document::parse(&far).unwrap();
        assert_eq!(fixture.run(&far, spec), None);

        let two_lines = Document::parse("<p>gọi cho</p><p>a</p><p>0912345678</p>").unwrap();
        assert_eq!(fixture.run(&two_lines, spec), None);
    }

    #[test]
    fn test_context_list_lines() {
        let fixture = Fixture::new();
        let registry = PatternRegistry::builder()
            .field(FieldDraft::new("members", FieldType::StructuredList).keywords(&["nhân khẩu"]))
            .build()
            .unwrap();
        let doc = Document::parse(
            "<p>Nhân khẩu:</p><p>Nguyễn Văn A - Con - 2010</p><p>Lê Thị B (Vợ)</p><p>Địa chỉ thường trú</p>",
        )
        .unwrap();
        let candidate = fixture.run(&doc, registry.get("members").unwrap()).unwrap();
        assert_eq!(candidate.raw, "Nguyễn Văn A - Con - 2010\nLê Thị B (Vợ)");
    }

    #[test]
    fn test_path_hint_skips_labels() {
        let fixture = Fixture::new();
        let registry = PatternRegistry::builder()
            .field(
                FieldDraft::new("household_code", FieldType::AlphanumericCode)
                    .path(NodeTest::class("hgd-info"), TextFilter::MinChars(3)),
            )
            .build()
            .unwrap();
        let doc = Document::parse(
            r#"<div class="hgd-info"><i>Mã số:</i> <i>HGD567890123</i></div>"#,
        )
        .unwrap();
        let candidate = fixture
            .run(&doc, registry.get("household_code").unwrap())
            .unwrap();
        assert_eq!(candidate.raw, "HGD567890123");
        assert_eq!(candidate.strategy, StrategyKind::Path);
        assert_eq!(candidate.confidence, 0.75);
    }

    #[test]
    fn test_fallback_sets_flag() {
        let candidate = Fixture::new()
            .run_default("<p>Ghi chú 0912345678</p>", "phone")
            .unwrap();
        assert_eq!(candidate.strategy, StrategyKind::Regex);

        let fixture = Fixture::new();
        let registry = PatternRegistry::builder()
            .field(FieldDraft::new("phone", FieldType::Phone).fallback(r"\b\d{10}\b"))
            .build()
            .unwrap();
        let doc = Document::parse("<p>Ghi chú 0912345678</p>").unwrap();
        let candidate = fixture.run(&doc, registry.get("phone").unwrap()).unwrap();
        assert_eq!(candidate.strategy, StrategyKind::Fallback);
        assert!(candidate.fallback_used);
        assert_eq!(candidate.confidence, 0.5);
    }

    #[test]
    fn test_shape_mismatch_below_floor_is_rejected() {
        let fixture = Fixture::new();
        let registry = PatternRegistry::builder()
            .field(FieldDraft::new("phone", FieldType::Phone).regex(r"Ghi chú: (\w+)"))
            .build()
            .unwrap();
        let doc = Document::parse("<p>Ghi chú: không</p>").unwrap();
        assert_eq!(fixture.run(&doc, registry.get("phone").unwrap()), None);
    }

    #[test]
    fn test_no_candidate() {
        let html = "<p>Họ tên: Nguyễn Văn An</p><p>Thu nhập: 18 triệu đồng</p>";
        assert_eq!(Fixture::new().run_default(html, "phone"), None);
    }
}
