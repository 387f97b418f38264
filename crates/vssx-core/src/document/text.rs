//! Rendering of a subtree into normalized text.

use super::{Document, NodeData, NodeId};

/// Elements that start and end a line.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "caption", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "html", "legend", "li", "main", "nav", "ol", "p", "pre", "section", "table",
    "tbody", "tfoot", "thead", "tr", "ul",
];

/// Elements whose content never renders.
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

pub(super) fn render(doc: &Document, id: NodeId) -> String {
    let mut buf = String::new();
    walk(doc, id, &mut buf);
    normalize_text(&buf)
}

enum Step {
    Enter(NodeId),
    Leave(char),
}

fn is_masked_input(attrs: &[(String, String)]) -> bool {
    attrs.iter().any(|(k, v)| {
        k == "type" && (v.eq_ignore_ascii_case("hidden") || v.eq_ignore_ascii_case("password"))
    })
}

fn walk(doc: &Document, root: NodeId, buf: &mut String) {
    let mut stack = vec![Step::Enter(root)];

    while let Some(step) = stack.pop() {
        let id = match step {
            Step::Enter(id) => id,
            Step::Leave(c) => {
                buf.push(c);
                continue;
            }
        };

        let entry = &doc.nodes[id.0];
        let (tag, attrs) = match &entry.data {
            NodeData::Text(text) => {
                // Source formatting is not layout: every whitespace char is a space.
                buf.extend(text.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
                continue;
            }
            NodeData::Element { tag, attrs } => (tag.as_str(), attrs),
        };

        if SKIPPED_TAGS.contains(&tag) {
            continue;
        }

        match tag {
            "br" => {
                buf.push('\n');
                continue;
            }
            "input" => {
                if !is_masked_input(attrs) {
                    if let Some((_, value)) = attrs.iter().find(|(k, _)| k == "value") {
                        buf.push(' ');
                        buf.push_str(value);
                        buf.push(' ');
                    }
                }
                continue;
            }
            "option" if !attrs.iter().any(|(k, _)| k == "selected") => continue,
            _ => {}
        }

        let block = BLOCK_TAGS.contains(&tag);
        if block {
            buf.push('\n');
        }
        match tag {
            "td" | "th" => stack.push(Step::Leave('\t')),
            "option" => stack.push(Step::Leave(' ')),
            _ if block => stack.push(Step::Leave('\n')),
            _ => {}
        }
        stack.extend(entry.children.iter().rev().map(|child| Step::Enter(*child)));
    }
}

/// Collapse whitespace inside each tab-separated cell and drop empty lines.
pub fn normalize_text(raw: &str) -> String {
    raw.split('\n')
        .map(|line| {
            line.split('\t')
                .map(|cell| cell.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
