//! Index configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::token_filter::StopWordsConfig;
use crate::analysis::{AnalyzerConfig, PerFieldAnalyzer, StopWords};
use crate::error::Result;
use crate::lexical::similarity::Bm25;
use crate::lexical::writer::{IndexWriterConfig, OpenMode};

/// Configuration of one index.
///
/// Every key is optional when loading from JSON; missing keys take their
/// default value.
///
/// ```
/// use lucerne::IndexConfig;
///
/// let config = IndexConfig::from_json_str(r#"{
///     "analyzer": { "type": "cjk" },
///     "field_analyzers": { "id": { "type": "keyword" } },
///     "default_field": "name"
/// }"#).unwrap();
/// assert_eq!(config.default_field, "name");
/// assert!(config.case_fold);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Analyzer for fields without an entry in `field_analyzers`.
    pub analyzer: AnalyzerConfig,

    /// Per-field analyzer overrides.
    pub field_analyzers: BTreeMap<String, AnalyzerConfig>,

    pub stop_words: StopWordsConfig,

    /// Lowercase tokens in the analyzers that normalize.
    pub case_fold: bool,

    pub bm25: Bm25,

    pub open_mode: OpenMode,

    /// Field searched by unqualified query clauses.
    pub default_field: String,

    pub merge_on_commit: bool,

    pub max_buffered_docs: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let writer = IndexWriterConfig::default();
        IndexConfig {
            analyzer: AnalyzerConfig::default(),
            field_analyzers: BTreeMap::new(),
            stop_words: StopWordsConfig::default(),
            case_fold: true,
            bm25: Bm25::default(),
            open_mode: writer.open_mode,
            default_field: "content".to_string(),
            merge_on_commit: writer.merge_on_commit,
            max_buffered_docs: writer.max_buffered_docs,
        }
    }
}

impl IndexConfig {
    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// The analyzer set described by this configuration.
    pub fn build_analyzer(&self) -> Result<PerFieldAnalyzer> {
        let stop_words = StopWords::from_config(&self.stop_words);
        let mut analyzer =
            PerFieldAnalyzer::new(self.analyzer.build(self.case_fold, &stop_words)?);
        for (field, config) in &self.field_analyzers {
            analyzer.add_analyzer(field.as_str(), config.build(self.case_fold, &stop_words)?);
        }
        Ok(analyzer)
    }

    pub fn writer_config(&self) -> IndexWriterConfig {
        IndexWriterConfig {
            open_mode: self.open_mode,
            merge_on_commit: self.merge_on_commit,
            max_buffered_docs: self.max_buffered_docs,
        }
    }
}

#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    pub fn analyzer(mut self, analyzer: AnalyzerConfig) -> Self {
        self.config.analyzer = analyzer;
        self
    }

    pub fn field_analyzer(mut self, field: impl Into<String>, analyzer: AnalyzerConfig) -> Self {
        self.config.field_analyzers.insert(field.into(), analyzer);
        self
    }

    pub fn stop_words<I, S>(mut self, words: I, ignore_case: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.stop_words = StopWordsConfig {
            words: words.into_iter().map(Into::into).collect(),
            ignore_case,
        };
        self
    }

    pub fn case_fold(mut self, case_fold: bool) -> Self {
        self.config.case_fold = case_fold;
        self
    }

    pub fn bm25(mut self, k1: f32, b: f32) -> Self {
        self.config.bm25 = Bm25::new(k1, b);
        self
    }

    pub fn open_mode(mut self, mode: OpenMode) -> Self {
        self.config.open_mode = mode;
        self
    }

    pub fn default_field(mut self, field: impl Into<String>) -> Self {
        self.config.default_field = field.into();
        self
    }

    pub fn merge_on_commit(mut self, merge: bool) -> Self {
        self.config.merge_on_commit = merge;
        self
    }

    pub fn max_buffered_docs(mut self, max: usize) -> Self {
        self.config.max_buffered_docs = max;
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}
