//! The transactional index writer.
//!
//! One writer session exists per index at a time; it holds `write.lock`
//! from [`IndexWriter::open`] until [`IndexWriter::close`] or drop.
//!
//! Added documents are analyzed immediately and buffered in memory. Deletes
//! are staged as tombstones. Nothing reaches storage before
//! [`commit`](IndexWriter::commit), which writes one new segment (postings
//! first, then stored fields), folds the staged tombstones into the
//! manifest and swaps the manifest in. The swap is the commit point:
//! readers opened before it keep seeing the previous state.

use std::sync::Arc;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::PerFieldAnalyzer;
use crate::data::Document;
use crate::error::{LucerneError, Result};
use crate::lexical::analyzed::{AnalyzedDocument, analyze_document};
use crate::lexical::index::cache::SegmentCache;
use crate::lexical::index::deletion::{DocAddress, PendingDeletions};
use crate::lexical::index::manifest::{MANIFEST_TEMP_FILE, Manifest, SegmentEntry};
use crate::lexical::index::merge::{MergeSource, merge_segments};
use crate::lexical::index::segment::{POSTINGS_EXTENSION, SegmentBuilder, postings_file};
use crate::lexical::reader::IndexReader;
use crate::storage::{Storage, StorageLock};
use crate::store::document::{STORED_EXTENSION, StoredDocument, StoredFields};

/// Name of the advisory writer lock.
pub const WRITE_LOCK: &str = "write.lock";

/// How [`IndexWriter::open`] treats an existing index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Start from an empty index. The previous content disappears at the
    /// first commit.
    Create,
    /// Continue an existing index; fails with `IndexNotFound` if none exists.
    Append,
    /// Append if an index exists, otherwise create one.
    #[default]
    CreateOrAppend,
}

/// Index writer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexWriterConfig {
    pub open_mode: OpenMode,

    /// Rewrite segments carrying tombstones at every commit.
    pub merge_on_commit: bool,

    /// Number of buffered documents that triggers an automatic commit.
    /// Zero disables it.
    pub max_buffered_docs: usize,
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            open_mode: OpenMode::default(),
            merge_on_commit: false,
            max_buffered_docs: 10_000,
        }
    }
}

/// Counters of one writer session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub docs_added: u64,
    pub docs_deleted: u64,
    pub commits: u64,
    pub rollbacks: u64,
    pub segments_created: u64,
    pub merges: u64,
}

pub struct IndexWriter {
    storage: Arc<dyn Storage>,
    analyzer: Arc<PerFieldAnalyzer>,
    config: IndexWriterConfig,
    cache: Arc<SegmentCache>,

    /// State of the last commit (or the truncated state in create mode).
    committed: IndexReader,

    /// Documents added since the last commit, in insertion order.
    buffered: Vec<AnalyzedDocument>,

    /// Tombstones staged since the last commit.
    pending: PendingDeletions,

    /// Set in create mode until the truncated manifest is committed.
    truncate: bool,

    lock: Option<StorageLock>,
    closed: bool,
    stats: WriterStats,
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter")
            .field("config", &self.config)
            .field("generation", &self.committed.generation())
            .field("buffered_docs", &self.buffered.len())
            .field("pending_deletes", &self.pending.len())
            .field("closed", &self.closed)
            .field("stats", &self.stats)
            .finish()
    }
}

impl IndexWriter {
    /// Open a writer session with a private segment cache.
    pub fn new(
        storage: Arc<dyn Storage>,
        analyzer: Arc<PerFieldAnalyzer>,
        config: IndexWriterConfig,
    ) -> Result<Self> {
        Self::open(storage, analyzer, Arc::new(SegmentCache::new()), config)
    }

    /// Open a writer session. Fails with `LockContention` while another
    /// session holds the lock.
    pub fn open(
        storage: Arc<dyn Storage>,
        analyzer: Arc<PerFieldAnalyzer>,
        cache: Arc<SegmentCache>,
        config: IndexWriterConfig,
    ) -> Result<Self> {
        let lock = storage.obtain_lock(WRITE_LOCK)?;

        let existing = Manifest::load(storage.as_ref())?;
        if config.open_mode == OpenMode::Append && existing.is_none() {
            return Err(LucerneError::IndexNotFound(
                "append mode requires an existing index".to_string(),
            ));
        }
        let on_disk = existing.clone().unwrap_or_default();
        remove_unreferenced_files(storage.as_ref(), &on_disk, true)?;

        let (manifest, truncate) = match (config.open_mode, existing) {
            (OpenMode::Create, existing) => {
                (existing.map(|m| m.truncated()).unwrap_or_default(), true)
            }
            (_, Some(manifest)) => (manifest, false),
            (_, None) => (Manifest::default(), true),
        };
        let committed = IndexReader::from_manifest(storage.as_ref(), &cache, manifest)?;

        info!(
            "opened index writer ({:?}): generation {}, {} segments, {} live docs",
            config.open_mode,
            committed.generation(),
            committed.segment_count(),
            committed.doc_count()
        );

        Ok(IndexWriter {
            storage,
            analyzer,
            config,
            cache,
            committed,
            buffered: Vec::new(),
            pending: PendingDeletions::new(),
            truncate,
            lock: Some(lock),
            closed: false,
            stats: WriterStats::default(),
        })
    }

    /// Buffer a document.
    pub fn add_document(&mut self, doc: Document) -> Result<()> {
        self.check_closed()?;
        let analyzed = analyze_document(&self.analyzer, &doc)?;
        self.buffer(vec![analyzed])
    }

    /// Buffer a batch of documents. They are analyzed in parallel and
    /// buffered in input order. If one fails validation, none is buffered.
    pub fn add_documents(&mut self, docs: Vec<Document>) -> Result<usize> {
        self.check_closed()?;
        let analyzer = Arc::clone(&self.analyzer);
        let analyzed = docs
            .par_iter()
            .map(|doc| analyze_document(&analyzer, doc))
            .collect::<Result<Vec<_>>>()?;
        let count = analyzed.len();
        self.buffer(analyzed)?;
        Ok(count)
    }

    /// Replace every copy of `id` with `doc`. Readers see either the old
    /// or the new version, depending on whether they were opened before or
    /// after the commit.
    pub fn update_document(&mut self, id: &str, doc: Document) -> Result<()> {
        self.check_closed()?;
        if doc.id != id {
            return Err(LucerneError::invalid_argument(format!(
                "document id {:?} does not match {id:?}",
                doc.id
            )));
        }
        let analyzed = analyze_document(&self.analyzer, &doc)?;
        self.delete_document(id)?;
        self.buffer(vec![analyzed])
    }

    /// Delete every copy of `id`. Returns whether a copy existed.
    pub fn delete_document(&mut self, id: &str) -> Result<bool> {
        self.check_closed()?;

        let before = self.buffered.len();
        self.buffered.retain(|doc| doc.id != id);
        let mut deleted = before - self.buffered.len();

        let manifest = self.committed.manifest();
        for entry in self.committed.segments() {
            let name = entry.segment.name();
            for &ordinal in entry.segment.ordinals_of(id) {
                if !manifest.is_deleted(name, ordinal)
                    && self.pending.stage(DocAddress::new(name, ordinal))
                {
                    deleted += 1;
                }
            }
        }

        self.stats.docs_deleted += deleted as u64;
        debug!("deleted {deleted} copies of document {id:?}");
        Ok(deleted > 0)
    }

    /// The writer session's view of `id`: buffered documents are visible
    /// and pending deletions already apply.
    pub fn get_document(&self, id: &str) -> Result<Option<StoredDocument>> {
        self.check_closed()?;
        if let Some(doc) = self.buffered.iter().rev().find(|doc| doc.id == id) {
            return Ok(Some(StoredDocument {
                id: doc.id.clone(),
                fields: doc.stored.clone(),
            }));
        }
        let pending = &self.pending;
        Ok(self
            .committed
            .store()
            .get_where(id, |segment, ordinal| pending.contains(segment, ordinal)))
    }

    /// Discard everything buffered or staged since the last commit.
    pub fn rollback(&mut self) -> Result<()> {
        self.check_closed()?;
        info!(
            "rolling back {} buffered docs and {} pending deletes",
            self.buffered.len(),
            self.pending.len()
        );
        self.buffered.clear();
        self.pending.clear();
        self.stats.rollbacks += 1;
        Ok(())
    }

    /// Make pending changes durable and visible to new readers. Returns
    /// `false` without touching storage when there is nothing to commit.
    pub fn commit(&mut self) -> Result<bool> {
        self.check_closed()?;
        if self.buffered.is_empty() && self.pending.is_empty() && !self.truncate {
            debug!("nothing to commit");
            return Ok(false);
        }

        let mut manifest = self.committed.manifest().clone();
        let added = self.buffered.len();

        if !self.buffered.is_empty() {
            let name = manifest.allocate_segment_name();
            let mut builder = SegmentBuilder::new();
            let mut stored = Vec::with_capacity(self.buffered.len());
            for doc in &self.buffered {
                builder.add_document(doc);
                stored.push(doc.stored.clone());
            }
            let segment = builder.build(name.as_str());
            let fields = StoredFields::new(stored);

            // Postings before stored fields; the manifest comes last.
            segment.write(self.storage.as_ref())?;
            fields.write(self.storage.as_ref(), &name)?;

            manifest.segments.push(SegmentEntry {
                name,
                doc_count: segment.doc_count(),
            });
            self.cache.insert(Arc::new(segment), Arc::new(fields));
        }

        self.pending.apply_to(&mut manifest.deletions);
        let dropped = manifest.drop_fully_deleted();
        if !dropped.is_empty() {
            debug!("dropping fully deleted segments {dropped:?}");
        }
        if self.config.merge_on_commit {
            self.merge_deletes(&mut manifest)?;
        }

        manifest.generation += 1;
        self.publish(manifest)?;

        self.buffered.clear();
        self.pending.clear();
        self.truncate = false;
        self.stats.commits += 1;
        if added > 0 {
            self.stats.segments_created += 1;
        }

        info!(
            "committed generation {}: {added} docs added, {} segments, {} live docs",
            self.committed.generation(),
            self.committed.segment_count(),
            self.committed.doc_count()
        );
        Ok(true)
    }

    /// Commit, then rewrite the segments carrying tombstones so deleted
    /// documents are physically removed. Returns whether anything was
    /// rewritten.
    pub fn force_merge_deletes(&mut self) -> Result<bool> {
        self.commit()?;
        let mut manifest = self.committed.manifest().clone();
        if !manifest.has_deletions() {
            return Ok(false);
        }
        self.merge_deletes(&mut manifest)?;
        manifest.generation += 1;
        self.publish(manifest)?;
        info!(
            "merged away deletions: generation {}, {} segments",
            self.committed.generation(),
            self.committed.segment_count()
        );
        Ok(true)
    }

    /// Commit and release the lock. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        let result = self.commit();
        self.closed = true;
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
        debug!("closed index writer");
        result.map(|_| ())
    }

    pub fn pending_docs(&self) -> usize {
        self.buffered.len()
    }

    pub fn pending_deletes(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> &WriterStats {
        &self.stats
    }

    pub fn config(&self) -> &IndexWriterConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(LucerneError::WriterClosed)
        } else {
            Ok(())
        }
    }

    fn buffer(&mut self, docs: Vec<AnalyzedDocument>) -> Result<()> {
        self.stats.docs_added += docs.len() as u64;
        self.buffered.extend(docs);
        let limit = self.config.max_buffered_docs;
        if limit > 0 && self.buffered.len() >= limit {
            debug!("{} buffered docs reached the limit, committing", self.buffered.len());
            self.commit()?;
        }
        Ok(())
    }

    /// Store `manifest` and switch the committed view to it.
    ///
    /// Storing the manifest is the last step that can fail. Once it returns
    /// the commit has landed, so cleaning up obsolete files only logs errors;
    /// the next writer session removes whatever is left.
    fn publish(&mut self, manifest: Manifest) -> Result<()> {
        let storage = self.storage.as_ref();
        let reader = IndexReader::from_manifest(storage, &self.cache, manifest)?;
        reader.manifest().store(storage)?;

        self.committed = reader;
        self.cache.retain(self.committed.manifest());
        if let Err(e) = remove_unreferenced_files(storage, self.committed.manifest(), false) {
            warn!("failed to remove obsolete index files: {e}");
        }
        Ok(())
    }

    /// Replace the run of segments starting at the oldest one with
    /// tombstones by a single segment holding their live documents.
    ///
    /// Merging the whole tail keeps segment order equal to insertion order,
    /// which is what makes the newest copy of a duplicated id win.
    fn merge_deletes(&mut self, manifest: &mut Manifest) -> Result<()> {
        let Some(start) = manifest
            .segments
            .iter()
            .position(|entry| manifest.deletions.contains_key(&entry.name))
        else {
            return Ok(());
        };

        let name = manifest.allocate_segment_name();
        let storage = self.storage.as_ref();
        let empty = Default::default();
        let mut sources = Vec::with_capacity(manifest.segments.len() - start);
        for entry in &manifest.segments[start..] {
            sources.push(MergeSource {
                segment: self.cache.segment(storage, &entry.name)?,
                fields: self.cache.stored_fields(storage, &entry.name)?,
                deleted: manifest.deletions.get(&entry.name).unwrap_or(&empty),
            });
        }
        let replaced: Vec<String> = manifest.segments[start..]
            .iter()
            .map(|entry| entry.name.clone())
            .collect();

        let merged = merge_segments(&sources, &name)?;
        drop(sources);

        manifest.segments.truncate(start);
        if let Some((segment, fields)) = merged {
            segment.write(storage)?;
            fields.write(storage, &name)?;
            manifest.segments.push(SegmentEntry {
                name,
                doc_count: segment.doc_count(),
            });
            self.cache.insert(Arc::new(segment), Arc::new(fields));
        }
        manifest.prune_deletions();

        self.stats.merges += 1;
        debug!("merged segments {replaced:?}");
        Ok(())
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to close index writer: {e}");
        }
    }
}

/// Delete segment files `manifest` does not reference. On open this also
/// removes stored-field files without postings and a leftover temporary
/// manifest.
fn remove_unreferenced_files(
    storage: &dyn Storage,
    manifest: &Manifest,
    reconcile: bool,
) -> Result<()> {
    let files = storage.list_files()?;
    let mut removed = Vec::new();
    for file in &files {
        let orphan = match file.rsplit_once('.') {
            Some((segment, POSTINGS_EXTENSION)) => !manifest.contains_segment(segment),
            Some((segment, STORED_EXTENSION)) => {
                !manifest.contains_segment(segment)
                    || (reconcile && !files.contains(&postings_file(segment)))
            }
            _ => reconcile && file == MANIFEST_TEMP_FILE,
        };
        if orphan {
            storage.delete_file(file)?;
            removed.push(file.as_str());
        }
    }
    if !removed.is_empty() {
        if reconcile {
            warn!("removed files left over by an interrupted session: {removed:?}");
        } else {
            debug!("removed unreferenced files {removed:?}");
        }
    }
    Ok(())
}
