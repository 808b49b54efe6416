//! Analyzers combine a tokenizer with a chain of token filters.

pub mod per_field;

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{Filter, LowercaseFilter, StopFilter, StopWords};
use crate::analysis::tokenizer::{
    CjkBigramTokenizer, DictionaryTokenizer, KeywordTokenizer, LetterTokenizer,
    StandardTokenizer, Tokenizer, WhitespaceTokenizer,
};
use crate::error::Result;

/// Turns text into a stream of normalized tokens.
pub trait Analyzer: Send + Sync + Debug {
    /// Analyze `text`. The stream is lazy and borrows both the analyzer and
    /// the text; calling `analyze` again restarts from the beginning.
    fn analyze<'a>(&'a self, text: &'a str) -> TokenStream<'a>;

    fn name(&self) -> &str;
}

/// An analyzer built from one tokenizer followed by filters applied in order.
#[derive(Debug, Clone)]
pub struct PipelineAnalyzer {
    name: String,
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn Filter>>,
}

impl PipelineAnalyzer {
    pub fn new(name: impl Into<String>, tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            name: name.into(),
            tokenizer,
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    fn with_normalization(mut self, case_fold: bool, stop_words: &StopWords) -> Self {
        if case_fold {
            self = self.add_filter(Arc::new(LowercaseFilter::new()));
        }
        if !stop_words.is_empty() {
            self = self.add_filter(Arc::new(StopFilter::new(stop_words.clone())));
        }
        self
    }

    /// Word-boundary segmentation, optional lowercasing and stop words.
    pub fn standard(case_fold: bool, stop_words: &StopWords) -> Self {
        PipelineAnalyzer::new("standard", Arc::new(StandardTokenizer::new()))
            .with_normalization(case_fold, stop_words)
    }

    /// Whitespace splitting with no normalization at all.
    pub fn whitespace() -> Self {
        PipelineAnalyzer::new("whitespace", Arc::new(WhitespaceTokenizer::new()))
    }

    /// Letter runs, lowercased.
    pub fn simple(case_fold: bool) -> Self {
        PipelineAnalyzer::new("simple", Arc::new(LetterTokenizer::new()))
            .with_normalization(case_fold, &StopWords::empty())
    }

    /// Letter runs, lowercased, minus English stop words and `extra`.
    pub fn stop(case_fold: bool, extra: &StopWords) -> Self {
        PipelineAnalyzer::new("stop", Arc::new(LetterTokenizer::new()))
            .with_normalization(case_fold, &StopWords::english().union(extra))
    }

    /// The whole input as one token.
    pub fn keyword() -> Self {
        PipelineAnalyzer::new("keyword", Arc::new(KeywordTokenizer::new()))
    }

    /// Character bigrams over CJK text.
    pub fn cjk(case_fold: bool, stop_words: &StopWords) -> Self {
        PipelineAnalyzer::new("cjk", Arc::new(CjkBigramTokenizer::new()))
            .with_normalization(case_fold, stop_words)
    }

    /// Dictionary segmentation over CJK text.
    pub fn dictionary<I, S>(words: I, case_fold: bool, stop_words: &StopWords) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokenizer = DictionaryTokenizer::new(words)?;
        Ok(PipelineAnalyzer::new("dictionary", Arc::new(tokenizer))
            .with_normalization(case_fold, stop_words))
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let mut stream = self.tokenizer.tokenize(text);
        for filter in &self.filters {
            stream = filter.filter(stream);
        }
        stream
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Selects an analysis strategy by configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalyzerConfig {
    #[default]
    Standard,
    Whitespace,
    Simple,
    Stop,
    Keyword,
    Cjk,
    Dictionary {
        words: Vec<String>,
    },
}

impl AnalyzerConfig {
    /// Build the analyzer. `case_fold` and `stop_words` apply to the
    /// strategies that normalize (`whitespace` and `keyword` keep text as-is).
    pub fn build(&self, case_fold: bool, stop_words: &StopWords) -> Result<Arc<dyn Analyzer>> {
        let analyzer = match self {
            AnalyzerConfig::Standard => PipelineAnalyzer::standard(case_fold, stop_words),
            AnalyzerConfig::Whitespace => PipelineAnalyzer::whitespace(),
            AnalyzerConfig::Simple => PipelineAnalyzer::simple(case_fold),
            AnalyzerConfig::Stop => PipelineAnalyzer::stop(case_fold, stop_words),
            AnalyzerConfig::Keyword => PipelineAnalyzer::keyword(),
            AnalyzerConfig::Cjk => PipelineAnalyzer::cjk(case_fold, stop_words),
            AnalyzerConfig::Dictionary { words } => {
                PipelineAnalyzer::dictionary(words, case_fold, stop_words)?
            }
        };
        Ok(Arc::new(analyzer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &str = "I have a lot of dreams. 北京市海淀区. 北京798 S302,上虞区北街南明村X230";

    fn texts(analyzer: &dyn Analyzer, text: &str) -> Vec<String> {
        analyzer.analyze(text).map(|t| t.text).collect()
    }

    #[test]
    fn test_standard_with_chinese_stop_words() {
        let stop = StopWords::new(["镇", "村", "市", "乡"], true);
        let analyzer = AnalyzerConfig::Standard.build(true, &stop).unwrap();
        let tokens = texts(analyzer.as_ref(), "上海市浦东新区学业路302号");
        assert_eq!(
            tokens,
            vec!["上", "海", "浦", "东", "新", "区", "学", "业", "路", "302", "号"]
        );
    }

    #[test]
    fn test_whitespace_keeps_case_and_punctuation() {
        let analyzer = AnalyzerConfig::Whitespace
            .build(true, &StopWords::english())
            .unwrap();
        let tokens = texts(analyzer.as_ref(), "I have a lot");
        assert_eq!(tokens, vec!["I", "have", "a", "lot"]);
    }

    #[test]
    fn test_stop_analyzer_drops_english_stop_words() {
        let analyzer = AnalyzerConfig::Stop.build(true, &StopWords::empty()).unwrap();
        let tokens = texts(analyzer.as_ref(), "I have a lot of dreams");
        assert_eq!(tokens, vec!["i", "have", "lot", "dreams"]);
    }

    #[test]
    fn test_keyword_is_single_token() {
        let analyzer = AnalyzerConfig::Keyword.build(true, &StopWords::empty()).unwrap();
        assert_eq!(texts(analyzer.as_ref(), SENTENCE), vec![SENTENCE.to_string()]);
    }

    #[test]
    fn test_cjk_lowercases_latin() {
        let analyzer = AnalyzerConfig::Cjk.build(true, &StopWords::empty()).unwrap();
        let tokens = texts(analyzer.as_ref(), "南明村X230");
        assert_eq!(tokens, vec!["南明", "明村", "x230"]);
    }

    #[test]
    fn test_dictionary_config() {
        let config = AnalyzerConfig::Dictionary {
            words: vec!["海淀区".to_string(), "北京".to_string()],
        };
        let analyzer = config.build(true, &StopWords::new(["市"], false)).unwrap();
        assert_eq!(texts(analyzer.as_ref(), "北京市海淀区"), vec!["北京", "海淀区"]);
    }

    #[test]
    fn test_every_strategy_handles_empty_text() {
        let configs = [
            AnalyzerConfig::Standard,
            AnalyzerConfig::Whitespace,
            AnalyzerConfig::Simple,
            AnalyzerConfig::Stop,
            AnalyzerConfig::Keyword,
            AnalyzerConfig::Cjk,
            AnalyzerConfig::Dictionary { words: vec![] },
        ];
        for config in configs {
            let analyzer = config.build(true, &StopWords::empty()).unwrap();
            assert_eq!(analyzer.analyze("").count(), 0, "{}", analyzer.name());
        }
    }

    #[test]
    fn test_no_token_has_surrounding_whitespace() {
        let configs = [
            AnalyzerConfig::Standard,
            AnalyzerConfig::Cjk,
            AnalyzerConfig::Simple,
            AnalyzerConfig::Dictionary { words: vec!["饭店".to_string()] },
        ];
        for config in configs {
            let analyzer = config.build(true, &StopWords::empty()).unwrap();
            for text in [SENTENCE, "x \u{037A} y", "饭店\u{037A}"] {
                for token in analyzer.analyze(text) {
                    assert_eq!(token.text.trim(), token.text, "{}", analyzer.name());
                    assert!(!token.text.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_config_serde_tagging() {
        let json = r#"{"type":"dictionary","words":["饭店"]}"#;
        let config: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            AnalyzerConfig::Dictionary {
                words: vec!["饭店".to_string()]
            }
        );
        let cjk: AnalyzerConfig = serde_json::from_str(r#"{"type":"cjk"}"#).unwrap();
        assert_eq!(cjk, AnalyzerConfig::Cjk);
    }
}
