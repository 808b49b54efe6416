//! # Lucerne
//!
//! A small full-text search library: text analysis, a segmented inverted
//! index with a transactional writer, and BM25-ranked retrieval.
//!
//! ## Features
//!
//! - Configurable analysis (standard, CJK bigram, dictionary, keyword, ...)
//! - Single-writer, many-reader index with commit and rollback
//! - Tombstone deletes and merges that reclaim them
//! - Query string parser with fields, phrases, negation and `OR`
//! - Stored fields for result hydration
//! - File system and in-memory storage

pub mod analysis;
mod data;
mod engine;
mod error;
pub mod lexical;
pub mod storage;
pub mod store;

pub use analysis::{Analyzer, AnalyzerConfig, PerFieldAnalyzer, StopWords};
pub use analysis::token_filter::StopWordsConfig;
pub use data::{Document, Field, FieldOption};
pub use engine::Engine;
pub use engine::config::{IndexConfig, IndexConfigBuilder};
pub use error::{LucerneError, Result};
pub use lexical::{
    Bm25, BooleanClause, BooleanQuery, CancellationToken, IndexReader, IndexWriter,
    IndexWriterConfig, OpenMode, Occur, PhraseQuery, Query, QueryParser, ScoredDoc, SearchHit,
    Searcher, Term, TermQuery, WriterStats,
};
pub use storage::{Storage, StorageConfig, StorageFactory};
pub use store::{DocumentStore, StoredDocument};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
