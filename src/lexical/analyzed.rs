//! Documents after analysis.

use std::collections::BTreeMap;

use crate::analysis::PerFieldAnalyzer;
use crate::data::Document;
use crate::error::Result;

/// One occurrence of a term inside a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedTerm {
    pub text: String,
    pub position: u32,
}

/// A document turned into the terms and stored values the index needs.
#[derive(Debug, Clone)]
pub struct AnalyzedDocument {
    /// External document id.
    pub id: String,

    /// Terms per indexed field, in token order.
    pub field_terms: BTreeMap<String, Vec<AnalyzedTerm>>,

    /// Values of the fields flagged `stored`.
    pub stored: BTreeMap<String, String>,
}

impl AnalyzedDocument {
    /// Number of terms the document contributes to `field`.
    pub fn field_length(&self, field: &str) -> Option<u32> {
        self.field_terms.get(field).map(|terms| terms.len() as u32)
    }
}

/// Validate `doc` and run every indexed field through its analyzer.
///
/// Fields that are indexed but not tokenized bypass the analyzer and produce
/// their trimmed value as a single term.
pub fn analyze_document(analyzer: &PerFieldAnalyzer, doc: &Document) -> Result<AnalyzedDocument> {
    doc.validate()?;

    let mut field_terms = BTreeMap::new();
    for (name, field) in &doc.fields {
        if !field.option.indexed {
            continue;
        }
        let terms: Vec<AnalyzedTerm> = if field.option.tokenized {
            analyzer
                .analyze_field(name, &field.value)
                .map(|token| AnalyzedTerm {
                    text: token.text,
                    position: token.position,
                })
                .collect()
        } else {
            let value = field.value.trim();
            if value.is_empty() {
                Vec::new()
            } else {
                vec![AnalyzedTerm {
                    text: value.to_string(),
                    position: 0,
                }]
            }
        };
        field_terms.insert(name.clone(), terms);
    }

    Ok(AnalyzedDocument {
        id: doc.id.clone(),
        field_terms,
        stored: doc.stored_fields(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::{PipelineAnalyzer, StopWords};

    fn analyzer() -> PerFieldAnalyzer {
        PerFieldAnalyzer::new(Arc::new(PipelineAnalyzer::standard(
            true,
            &StopWords::new(["市"], true),
        )))
    }

    #[test]
    fn test_untokenized_field_is_one_term() {
        let doc = Document::with_id("1").add_string("code", "  AB-12 x ", true);
        let analyzed = analyze_document(&analyzer(), &doc).unwrap();
        let terms = &analyzed.field_terms["code"];
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].text, "AB-12 x");
    }

    #[test]
    fn test_stop_word_gap_is_kept_in_positions() {
        let doc = Document::with_id("1").add_text("addr", "上海市浦东", false);
        let analyzed = analyze_document(&analyzer(), &doc).unwrap();
        let positions: Vec<u32> = analyzed.field_terms["addr"]
            .iter()
            .map(|t| t.position)
            .collect();
        assert_eq!(positions, vec![0, 1, 3, 4]);
        assert_eq!(analyzed.field_length("addr"), Some(4));
        assert!(analyzed.stored.is_empty());
    }

    #[test]
    fn test_stored_only_field_is_not_indexed() {
        let doc = Document::with_id("1").add_stored("note", "hello");
        let analyzed = analyze_document(&analyzer(), &doc).unwrap();
        assert!(analyzed.field_terms.is_empty());
        assert_eq!(analyzed.stored["note"], "hello");
    }
}
