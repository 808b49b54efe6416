//! Text analysis.
//!
//! Raw text is turned into a stream of normalized tokens before indexing or
//! searching:
//!
//! ```text
//! Text → Tokenizer → Token Stream → Token Filters → Analyzed Tokens
//! ```
//!
//! The strategy used for a field is chosen by configuration through
//! [`AnalyzerConfig`], never by subclassing.
//!
//! # Examples
//!
//! ```
//! use lucerne::analysis::{AnalyzerConfig, StopWords};
//!
//! let analyzer = AnalyzerConfig::Standard.build(true, &StopWords::empty()).unwrap();
//! let tokens: Vec<String> = analyzer.analyze("Hello World!").map(|t| t.text).collect();
//! assert_eq!(tokens, vec!["hello", "world"]);
//! ```

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::per_field::PerFieldAnalyzer;
pub use analyzer::{Analyzer, AnalyzerConfig, PipelineAnalyzer};
pub use token::{Token, TokenStream};
pub use token_filter::{Filter as TokenFilter, LowercaseFilter, StopFilter, StopWords};
pub use tokenizer::Tokenizer;
