//! The engine facade.
//!
//! An [`Engine`] ties one index directory to its configuration. It hands
//! out the single [`IndexWriter`] session and any number of
//! [`IndexReader`] snapshots, all sharing one segment cache.

pub mod config;

use std::path::Path;
use std::sync::Arc;

use log::debug;

use crate::analysis::PerFieldAnalyzer;
use crate::error::Result;
use crate::lexical::index::cache::SegmentCache;
use crate::lexical::query::parser::QueryParser;
use crate::lexical::reader::IndexReader;
use crate::lexical::search::Searcher;
use crate::lexical::writer::IndexWriter;
use crate::storage::Storage;
use crate::storage::file::{FileStorage, FileStorageConfig};

use self::config::IndexConfig;

/// Entry point to one index.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use lucerne::storage::memory::MemoryStorage;
/// use lucerne::{Document, Engine, IndexConfig};
///
/// let config = IndexConfig::builder().default_field("name").build();
/// let engine = Engine::new(Arc::new(MemoryStorage::default()), config).unwrap();
///
/// let mut writer = engine.writer().unwrap();
/// writer.add_document(Document::with_id("1").add_text("name", "Hotel Lucerne", true)).unwrap();
/// writer.commit().unwrap();
///
/// let query = engine.query_parser().parse("hotel").unwrap();
/// let hits = engine.searcher().unwrap().search(&query, 10).unwrap();
/// assert_eq!(hits[0].id, "1");
/// ```
#[derive(Debug)]
pub struct Engine {
    storage: Arc<dyn Storage>,
    config: IndexConfig,
    analyzer: Arc<PerFieldAnalyzer>,
    cache: Arc<SegmentCache>,
}

impl Engine {
    pub fn new(storage: Arc<dyn Storage>, config: IndexConfig) -> Result<Self> {
        let analyzer = Arc::new(config.build_analyzer()?);
        debug!("engine configured with {:?}", config.analyzer);
        Ok(Engine {
            storage,
            config,
            analyzer,
            cache: Arc::new(SegmentCache::new()),
        })
    }

    /// An engine over an index directory, created if missing.
    pub fn open_dir(path: impl AsRef<Path>, config: IndexConfig) -> Result<Self> {
        let storage = FileStorage::new(FileStorageConfig::new(path.as_ref()))?;
        Engine::new(Arc::new(storage), config)
    }

    /// Start the writer session. Fails with `LockContention` while another
    /// session is open on the same directory.
    pub fn writer(&self) -> Result<IndexWriter> {
        IndexWriter::open(
            Arc::clone(&self.storage),
            Arc::clone(&self.analyzer),
            Arc::clone(&self.cache),
            self.config.writer_config(),
        )
    }

    /// A snapshot of the latest commit.
    pub fn reader(&self) -> Result<IndexReader> {
        let reader = IndexReader::open(self.storage.as_ref(), &self.cache)?;
        self.cache.retain(reader.manifest());
        Ok(reader)
    }

    /// A searcher over a fresh snapshot, scoring with the configured BM25
    /// parameters.
    pub fn searcher(&self) -> Result<Searcher> {
        Ok(Searcher::new(self.reader()?).with_bm25(self.config.bm25))
    }

    pub fn query_parser(&self) -> QueryParser {
        QueryParser::new(Arc::clone(&self.analyzer))
            .with_default_field(self.config.default_field.as_str())
    }

    pub fn analyzer(&self) -> &Arc<PerFieldAnalyzer> {
        &self.analyzer
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }
}
