//! Per-field analyzer selection.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::token::TokenStream;
use crate::lexical::term::Term;

/// Routes each field to its own analyzer, falling back to a default one.
#[derive(Debug, Clone)]
pub struct PerFieldAnalyzer {
    default_analyzer: Arc<dyn Analyzer>,
    field_analyzers: AHashMap<String, Arc<dyn Analyzer>>,
}

impl PerFieldAnalyzer {
    pub fn new(default_analyzer: Arc<dyn Analyzer>) -> Self {
        PerFieldAnalyzer {
            default_analyzer,
            field_analyzers: AHashMap::new(),
        }
    }

    pub fn add_analyzer(&mut self, field: impl Into<String>, analyzer: Arc<dyn Analyzer>) {
        self.field_analyzers.insert(field.into(), analyzer);
    }

    pub fn with_analyzer(mut self, field: impl Into<String>, analyzer: Arc<dyn Analyzer>) -> Self {
        self.add_analyzer(field, analyzer);
        self
    }

    pub fn analyzer_for(&self, field: &str) -> &Arc<dyn Analyzer> {
        self.field_analyzers
            .get(field)
            .unwrap_or(&self.default_analyzer)
    }

    pub fn default_analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.default_analyzer
    }

    /// Analyze `text` with the analyzer configured for `field`.
    pub fn analyze_field<'a>(&'a self, field: &str, text: &'a str) -> TokenStream<'a> {
        self.analyzer_for(field).analyze(text)
    }

    /// Turn `text` into the terms it contributes to `field`.
    pub fn tokenize<'a>(&'a self, text: &'a str, field: &'a str) -> impl Iterator<Item = Term> + 'a {
        self.analyze_field(field, text)
            .map(move |token| Term::new(field, token.text))
    }
}
