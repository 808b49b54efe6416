//! Lexical search over inverted indexes.
//!
//! # Module Structure
//!
//! - `term`: field-qualified terms
//! - `analyzed`: documents turned into terms, ready for indexing
//! - `index`: posting lists, immutable segments, the manifest and deletions
//! - `writer`: the transactional single-session index writer
//! - `reader`: point-in-time snapshots of committed segments
//! - `query`: query types and the query string parser
//! - `search`: BM25 scoring and top-k collection

pub mod analyzed;
pub mod index;
pub mod query;
pub mod reader;
pub mod search;
pub mod similarity;
pub mod term;
pub mod writer;

pub use query::parser::QueryParser;
pub use query::{BooleanClause, BooleanQuery, Occur, PhraseQuery, Query, TermQuery};
pub use reader::IndexReader;
pub use search::{CancellationToken, ScoredDoc, SearchHit, Searcher};
pub use similarity::Bm25;
pub use term::Term;
pub use writer::{IndexWriter, IndexWriterConfig, OpenMode, WriterStats};
