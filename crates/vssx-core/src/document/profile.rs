//! Structure analysis of a parsed document.

use serde::{Deserialize, Serialize};

use super::Document;

/// Dominant layout style of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    TableBased,
    FormBased,
    DivBased,
    Mixed,
}

/// Element counts and a layout classification for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProfile {
    pub total_elements: usize,
    pub table_count: usize,
    pub div_count: usize,
    pub span_count: usize,
    pub form_count: usize,
    pub input_count: usize,
    /// A `<script>` element carries something that looks like a JSON object.
    pub has_json_script: bool,
    /// Length of the rendered text in characters.
    pub text_length: usize,
    pub structure_type: StructureType,
}

impl DocumentProfile {
    pub fn analyze(doc: &Document) -> Self {
        let mut profile = DocumentProfile {
            total_elements: 0,
            table_count: 0,
            div_count: 0,
            span_count: 0,
            form_count: 0,
            input_count: 0,
            has_json_script: false,
            text_length: doc.text().chars().count(),
            structure_type: StructureType::Mixed,
        };

        for element in doc.elements() {
            profile.total_elements += 1;
            match element.tag() {
                Some("table") => profile.table_count += 1,
                Some("div") => profile.div_count += 1,
                Some("span") => profile.span_count += 1,
                Some("form") => profile.form_count += 1,
                Some("input") => profile.input_count += 1,
                Some("script") => {
                    let body: String = element.children().filter_map(|c| c.raw_text()).collect();
                    if body.contains('{') && body.contains('}') && body.contains(':') {
                        profile.has_json_script = true;
                    }
                }
                _ => {}
            }
        }

        profile.structure_type = if profile.table_count > 3 {
            StructureType::TableBased
        } else if profile.form_count > 0 {
            StructureType::FormBased
        } else if profile.div_count > 10 {
            StructureType::DivBased
        } else {
            StructureType::Mixed
        };

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_form_based_profile() {
        let doc = Document::parse(
            r#"<form><input name="a" value="1"><input name="b"></form>
               <script type="application/json">{"phone": "0912345678"}</script>"#,
        )
        .unwrap();
        let profile = DocumentProfile::analyze(&doc);
        assert_eq!(profile.form_count, 1);
        assert_eq!(profile.input_count, 2);
        assert!(profile.has_json_script);
        assert_eq!(profile.structure_type, StructureType::FormBased);
    }

    #[test]
    fn test_table_and_div_classification() {
        let tables = "<table><tr><td>x</td></tr></table>".repeat(4);
        let doc = Document::parse(&tables).unwrap();
        assert_eq!(DocumentProfile::analyze(&doc).structure_type, StructureType::TableBased);

        let divs = "<div>x</div>".repeat(11);
        let doc = Document::parse(&divs).unwrap();
        let profile = DocumentProfile::analyze(&doc);
        assert_eq!(profile.div_count, 11);
        assert_eq!(profile.structure_type, StructureType::DivBased);

        let doc = Document::parse("<p>plain</p>").unwrap();
        let profile = DocumentProfile::analyze(&doc);
        assert_eq!(profile.structure_type, StructureType::Mixed);
        assert!(!profile.has_json_script);
        assert_eq!(profile.text_length, 5);
    }
}
