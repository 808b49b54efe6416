//! Token filters transform or drop tokens of a stream.

use std::fmt::Debug;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::analysis::token::TokenStream;

/// A stage of the analysis pipeline applied after tokenization.
pub trait Filter: Send + Sync + Debug {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a>;

    fn name(&self) -> &'static str;
}

/// Lowercases token text.
#[derive(Debug, Clone, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        Box::new(tokens.map(|mut token| {
            token.text = token.text.to_lowercase();
            token
        }))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}

/// English stop words, as used by the `stop` analyzer.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Stop-word configuration as it appears in the index configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopWordsConfig {
    /// Terms excluded from indexing and querying.
    pub words: Vec<String>,

    /// Match stop words regardless of case.
    pub ignore_case: bool,
}

/// A set of stop words with an optional case-insensitive membership test.
///
/// Words added case-insensitively and exact words are kept apart, so a union
/// never widens an exact word into a case-insensitive one.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    exact: AHashSet<String>,
    folded: AHashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I, ignore_case: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| {
                let w = w.as_ref().trim();
                if ignore_case {
                    w.to_lowercase()
                } else {
                    w.to_string()
                }
            })
            .filter(|w| !w.is_empty())
            .collect();
        if ignore_case {
            StopWords {
                exact: AHashSet::new(),
                folded: words,
            }
        } else {
            StopWords {
                exact: words,
                folded: AHashSet::new(),
            }
        }
    }

    pub fn empty() -> Self {
        StopWords::default()
    }

    pub fn english() -> Self {
        StopWords::new(ENGLISH_STOP_WORDS.iter().copied(), true)
    }

    pub fn from_config(config: &StopWordsConfig) -> Self {
        StopWords::new(&config.words, config.ignore_case)
    }

    /// Union of two sets. Each word keeps the case sensitivity it was added
    /// with.
    pub fn union(&self, other: &StopWords) -> StopWords {
        StopWords {
            exact: self.exact.union(&other.exact).cloned().collect(),
            folded: self.folded.union(&other.folded).cloned().collect(),
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.exact.contains(term)
            || (!self.folded.is_empty() && self.folded.contains(&term.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.folded.is_empty()
    }
}

/// Drops tokens found in a stop-word set. Positions of the remaining tokens
/// are left untouched.
#[derive(Debug, Clone)]
pub struct StopFilter {
    stop_words: StopWords,
}

impl StopFilter {
    pub fn new(stop_words: StopWords) -> Self {
        StopFilter { stop_words }
    }
}

impl Filter for StopFilter {
    fn filter<'a>(&'a self, tokens: TokenStream<'a>) -> TokenStream<'a> {
        Box::new(tokens.filter(move |token| !self.stop_words.contains(&token.text)))
    }

    fn name(&self) -> &'static str {
        "stop"
    }
}
