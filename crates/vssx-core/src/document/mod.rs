//! Parsed HTML documents.
//!
//! The parser crate's tree is converted once into an owned arena so the
//! extraction strategies work against a small fixed query surface
//! (find-by-tag, find-by-attribute, find-by-text, children, siblings,
//! descendants, rendered text) and never see parser-specific node types.
//! A [`Document`] is immutable after construction and is `Send + Sync`.

mod profile;
mod text;

pub use profile::{DocumentProfile, StructureType};
pub use text::normalize_text;

use scraper::{Html, Node};
use tracing::debug;

use crate::error::DocumentError;

/// Result type for document construction.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Default upper bound on input size (8 MiB).
pub const DEFAULT_MAX_BYTES: usize = 8 * 1024 * 1024;

/// Index of a node in a document's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeEntry {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable parsed HTML page.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeEntry>,
    root: NodeId,
    text: String,
}

impl Document {
    /// Parse HTML with the default size bound.
    pub fn parse(html: &str) -> Result<Self> {
        Self::parse_with_limit(html, DEFAULT_MAX_BYTES)
    }

    /// Parse HTML, rejecting inputs larger than `limit` bytes.
    ///
    /// HTML parsing itself is error tolerant; the only rejected inputs are
    /// empty text, binary data and oversized documents.
    pub fn parse_with_limit(html: &str, limit: usize) -> Result<Self> {
        if html.len() > limit {
            return Err(DocumentError::TooLarge {
                size: html.len(),
                limit,
            });
        }
        if let Some(offset) = html.bytes().position(|b| b == 0) {
            return Err(DocumentError::Binary(offset));
        }
        if html.trim().is_empty() {
            return Err(DocumentError::Empty);
        }

        let parsed = Html::parse_document(html);
        let mut document = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            text: String::new(),
        };
        document.build(&parsed);
        document.text = text::render(&document, document.root);

        debug!(
            "Parsed document: {} nodes, {} chars of text",
            document.nodes.len(),
            document.text.chars().count()
        );

        Ok(document)
    }

    /// Copy the parser's tree into the arena in document order.
    ///
    /// Nesting depth is bounded only by the input size, so the walk keeps
    /// its own stack.
    fn build(&mut self, parsed: &Html) {
        let mut stack = vec![(*parsed.root_element(), None)];

        while let Some((node, parent)) = stack.pop() {
            let data = match node.value() {
                Node::Element(element) => NodeData::Element {
                    tag: element.name().to_ascii_lowercase(),
                    attrs: element
                        .attrs()
                        .map(|(name, val)| (name.to_ascii_lowercase(), val.to_string()))
                        .collect(),
                },
                Node::Text(text) => NodeData::Text(String::from(&**text)),
                _ => continue,
            };

            let id = NodeId(self.nodes.len());
            self.nodes.push(NodeEntry {
                data,
                parent,
                children: Vec::new(),
            });
            if let Some(NodeId(parent)) = parent {
                self.nodes[parent].children.push(id);
            }

            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
        }
    }

    /// The root (`<html>`) element.
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Look up a node by id.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// Normalized text content of the whole document.
    ///
    /// Block elements end a line, table cells are separated by tabs, runs of
    /// whitespace collapse to one space.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of nodes (elements and text) in the document.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len())
            .map(|i| self.node(NodeId(i)))
            .filter(|n| n.is_element())
    }

    /// Elements with the given tag name, in document order.
    pub fn find_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.elements().filter(move |n| n.tag() == Some(tag))
    }

    /// Elements whose attribute `name` equals (`exact`) or contains `needle`.
    ///
    /// Comparison is case-insensitive.
    pub fn find_by_attribute<'a>(
        &'a self,
        name: &'a str,
        needle: &'a str,
        exact: bool,
    ) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.elements().filter(move |n| match n.attr(name) {
            Some(value) if exact => value.trim().eq_ignore_ascii_case(needle),
            Some(value) => contains_ci(value, needle),
            None => false,
        })
    }

    /// Elements with one of `tags` whose rendered text contains `needle`.
    pub fn find_by_text<'a>(
        &'a self,
        tags: &'a [&'a str],
        needle: &'a str,
    ) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        // No element renders text the page as a whole does not.
        let present = contains_ci(&self.text, needle);
        self.elements()
            .filter(move |_| present)
            .filter(move |n| n.tag().is_some_and(|t| tags.contains(&t)))
            .filter(move |n| contains_ci(&n.text(), needle))
    }
}

/// A borrowed handle to one node of a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    fn entry(&self) -> &'a NodeEntry {
        &self.doc.nodes[self.id.0]
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn is_element(&self) -> bool {
        matches!(self.entry().data, NodeData::Element { .. })
    }

    /// Tag name for elements, `None` for text nodes.
    pub fn tag(&self) -> Option<&'a str> {
        match &self.entry().data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match &self.entry().data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            NodeData::Text(_) => None,
        }
    }

    /// Whether the `class` attribute contains `needle` (case-insensitive).
    pub fn has_class(&self, needle: &str) -> bool {
        self.attr("class").is_some_and(|c| contains_ci(c, needle))
    }

    /// Raw content of a text node.
    pub fn raw_text(&self) -> Option<&'a str> {
        match &self.entry().data {
            NodeData::Text(text) => Some(text.as_str()),
            NodeData::Element { .. } => None,
        }
    }

    /// Normalized rendered text of this node's subtree.
    pub fn text(&self) -> String {
        text::render(self.doc, self.id)
    }

    /// Text a form control or element presents as its value.
    ///
    /// Inputs yield their `value` attribute, selects their selected option,
    /// everything else its rendered text.
    pub fn value_text(&self) -> String {
        match self.tag() {
            Some("input") => self.attr("value").map(|v| v.trim().to_string()).unwrap_or_default(),
            Some("select") => self
                .descendants()
                .into_iter()
                .find(|n| n.tag() == Some("option") && n.attr("selected").is_some())
                .map(|n| n.text())
                .unwrap_or_default(),
            _ => self.text(),
        }
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.entry().parent.map(|id| self.doc.node(id))
    }

    /// Direct children, text nodes included.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.entry().children.iter().map(move |id| doc.node(*id))
    }

    /// Direct element children.
    pub fn child_elements(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.children().filter(|n| n.is_element())
    }

    /// The next element among this node's siblings.
    pub fn next_element_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.parent()?;
        parent
            .child_elements()
            .skip_while(|n| n.id != self.id)
            .nth(1)
    }

    /// All descendants in document order, excluding this node.
    pub fn descendants(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.entry().children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = self.doc.node(id);
            stack.extend(node.entry().children.iter().rev().copied());
            out.push(node);
        }
        out
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.parent(), |n| n.parent())
    }
}

/// Case-insensitive substring test that handles non-ASCII letters.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
        <html><body>
          <table class="info-table">
            <tr><td class="label">Điện thoại:</td><td class="value">0912 345 678</td></tr>
            <tr><td>Ngân hàng:</td><td>Vietcombank (VCB)</td></tr>
          </table>
          <div class="contact" data-field="phone"><span>SĐT</span> <b>0987654321</b></div>
          <form>
            <input type="text" name="income" value="30,000,000 VNĐ">
            <select name="bank"><option value="">--</option><option value="ACB" selected>Á Châu (ACB)</option></select>
          </form>
          <script>var x = {"a": 1};</script>
        </body></html>
    "#;

    #[test]
    fn test_parse_rejects_empty_and_binary() {
        assert_eq!(Document::parse("   \n ").unwrap_err(), DocumentError::Empty);
        assert_eq!(Document::parse("ab\0c").unwrap_err(), DocumentError::Binary(2));
        assert_eq!(
            Document::parse_with_limit("<p>abc</p>", 4).unwrap_err(),
            DocumentError::TooLarge { size: 10, limit: 4 }
        );
    }

    #[test]
    fn test_plain_text_is_accepted() {
        let doc = Document::parse("Thu nhập: 18 triệu đồng").unwrap();
        assert_eq!(doc.text(), "Thu nhập: 18 triệu đồng");
    }

    #[test]
    fn test_text_rendering_rows_and_cells() {
        let doc = Document::parse(SAMPLE).unwrap();
        let text = doc.text();
        assert!(text.contains("Điện thoại:\t0912 345 678"));
        assert!(text.contains("Ngân hàng:\tVietcombank (VCB)"));
        assert!(text.contains("SĐT 0987654321"));
        assert!(text.contains("30,000,000 VNĐ"));
        assert!(text.contains("Á Châu (ACB)"));
        assert!(!text.contains("--"));
        assert!(!text.contains("var x"));
    }

    #[test]
    fn test_find_by_attribute() {
        let doc = Document::parse(SAMPLE).unwrap();
        let exact: Vec<_> = doc.find_by_attribute("data-field", "PHONE", true).collect();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].text(), "SĐT 0987654321");

        let contains: Vec<_> = doc.find_by_attribute("class", "info", false).collect();
        assert_eq!(contains.len(), 1);
        assert_eq!(contains[0].tag(), Some("table"));
    }

    #[test]
    fn test_sibling_and_value_text() {
        let doc = Document::parse(SAMPLE).unwrap();
        let label = doc
            .find_by_text(&["td"], "điện thoại")
            .next()
            .expect("label cell");
        let value = label.next_element_sibling().expect("value cell");
        assert_eq!(value.text(), "0912 345 678");

        let input = doc.find_by_tag("input").next().unwrap();
        assert_eq!(input.value_text(), "30,000,000 VNĐ");

        let select = doc.find_by_tag("select").next().unwrap();
        assert_eq!(select.value_text(), "Á Châu (ACB)");
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let doc = Document::parse("<div><p>a</p><p>b<span>c</span></p></div>").unwrap();
        let div = doc.find_by_tag("div").next().unwrap();
        let texts: Vec<_> = div
            .descendants()
            .into_iter()
            .filter_map(|n| n.raw_text())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(div.descendants()[0].ancestors().any(|a| a.id() == div.id()));
    }

    #[test]
    fn test_contains_ci_unicode() {
        assert!(contains_ci("ĐIỆN THOẠI", "điện thoại"));
        assert!(!contains_ci("Ngân hàng", "thu nhập"));
    }
}
