//! Point-in-time snapshots of the committed index.

use std::io;
use std::sync::Arc;

use ahash::AHashMap;
use log::debug;

use crate::error::{LucerneError, Result};
use crate::lexical::index::cache::SegmentCache;
use crate::lexical::index::manifest::Manifest;
use crate::lexical::index::segment::FieldStats;
use crate::lexical::term::Term;
use crate::storage::Storage;
use crate::store::document::{DocumentStore, StoreSegment, StoredDocument};

/// An immutable view of one commit. Cloning is cheap.
///
/// Statistics (`doc_count`, `doc_freq`, `field_stats`) only count live
/// documents: tombstoned ones are excluded even though their postings are
/// still on disk.
#[derive(Debug, Clone)]
pub struct IndexReader {
    inner: Arc<ReaderInner>,
}

#[derive(Debug)]
struct ReaderInner {
    manifest: Manifest,
    store: DocumentStore,
    field_stats: AHashMap<String, FieldStats>,
    live_docs: u64,
}

impl IndexReader {
    /// Open the latest commit. An index that was never committed reads as
    /// empty.
    ///
    /// A writer deletes the files of segments its commit made obsolete, so
    /// a segment can vanish between reading the manifest and loading it.
    /// In that case a newer manifest exists and the open starts over from it.
    pub fn open(storage: &dyn Storage, cache: &SegmentCache) -> Result<IndexReader> {
        let mut manifest = Manifest::load(storage)?.unwrap_or_default();
        loop {
            let generation = manifest.generation;
            match IndexReader::from_manifest(storage, cache, manifest) {
                Err(LucerneError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    let latest = Manifest::load(storage)?.unwrap_or_default();
                    if latest.generation == generation {
                        return Err(LucerneError::Io(e));
                    }
                    debug!(
                        "generation {generation} was replaced while opening, retrying with {}",
                        latest.generation
                    );
                    manifest = latest;
                }
                result => return result,
            }
        }
    }

    /// A snapshot of the segments `manifest` lists.
    pub(crate) fn from_manifest(
        storage: &dyn Storage,
        cache: &SegmentCache,
        manifest: Manifest,
    ) -> Result<IndexReader> {
        let mut segments = Vec::with_capacity(manifest.segments.len());
        for entry in &manifest.segments {
            let segment = cache.segment(storage, &entry.name)?;
            let fields = cache.stored_fields(storage, &entry.name)?;
            let deleted = Arc::new(
                manifest
                    .deletions
                    .get(&entry.name)
                    .cloned()
                    .unwrap_or_default(),
            );
            segments.push(StoreSegment {
                segment,
                fields,
                deleted,
            });
        }
        Ok(IndexReader::from_parts(manifest, segments))
    }

    pub(crate) fn from_parts(manifest: Manifest, segments: Vec<StoreSegment>) -> IndexReader {
        let mut field_stats: AHashMap<String, FieldStats> = AHashMap::new();
        let live_docs = manifest.live_doc_count();
        for entry in &segments {
            let segment = &entry.segment;
            for field in segment.fields() {
                let mut stats = segment.field_stats(field);
                for &ordinal in entry.deleted.iter() {
                    if let Some(length) = segment.field_length(field, ordinal) {
                        stats.remove(length);
                    }
                }
                let total = field_stats.entry(field.to_string()).or_default();
                total.doc_count += stats.doc_count;
                total.total_length += stats.total_length;
            }
        }

        IndexReader {
            inner: Arc::new(ReaderInner {
                manifest,
                store: DocumentStore::new(segments),
                field_stats,
                live_docs,
            }),
        }
    }

    pub fn generation(&self) -> u64 {
        self.inner.manifest.generation
    }

    /// Number of live documents.
    pub fn doc_count(&self) -> u64 {
        self.inner.live_docs
    }

    /// Number of documents including tombstoned ones.
    pub fn max_doc(&self) -> u64 {
        self.inner.manifest.total_doc_count()
    }

    pub fn segment_count(&self) -> usize {
        self.inner.manifest.segments.len()
    }

    pub fn has_deletions(&self) -> bool {
        self.inner.manifest.has_deletions()
    }

    pub fn field_stats(&self, field: &str) -> FieldStats {
        self.inner
            .field_stats
            .get(field)
            .copied()
            .unwrap_or_default()
    }

    /// Number of live documents containing `term`.
    pub fn doc_freq(&self, term: &Term) -> u64 {
        self.segments()
            .iter()
            .filter_map(|entry| {
                entry.segment.postings(term).map(|list| {
                    list.iter()
                        .filter(|p| !entry.deleted.contains(&p.doc))
                        .count() as u64
                })
            })
            .sum()
    }

    /// Stored document by external id.
    pub fn document(&self, id: &str) -> Option<StoredDocument> {
        self.inner.store.get(id)
    }

    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    pub fn manifest(&self) -> &Manifest {
        &self.inner.manifest
    }

    pub(crate) fn segments(&self) -> &[StoreSegment] {
        self.inner.store.segments()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::analysis::{PerFieldAnalyzer, PipelineAnalyzer, StopWords};
    use crate::data::Document;
    use crate::lexical::index::manifest::MANIFEST_FILE;
    use crate::lexical::writer::{IndexWriter, IndexWriterConfig};
    use crate::storage::memory::MemoryStorage;
    use crate::storage::{StorageInput, StorageLock, StorageOutput};

    /// Serves the manifest saved as `stale.json` on the next manifest read,
    /// as if a writer published a new commit right after it was read.
    #[derive(Debug)]
    struct LaggingManifest {
        inner: MemoryStorage,
        stale_once: AtomicBool,
    }

    impl Storage for LaggingManifest {
        fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
            if name == MANIFEST_FILE && self.stale_once.swap(false, Ordering::SeqCst) {
                return self.inner.open_input("stale.json");
            }
            self.inner.open_input(name)
        }

        fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
            self.inner.create_output(name)
        }

        fn file_exists(&self, name: &str) -> bool {
            self.inner.file_exists(name)
        }

        fn delete_file(&self, name: &str) -> Result<()> {
            self.inner.delete_file(name)
        }

        fn list_files(&self) -> Result<Vec<String>> {
            self.inner.list_files()
        }

        fn rename_file(&self, from: &str, to: &str) -> Result<()> {
            self.inner.rename_file(from, to)
        }

        fn obtain_lock(&self, name: &str) -> Result<StorageLock> {
            self.inner.obtain_lock(name)
        }

        fn sync(&self) -> Result<()> {
            self.inner.sync()
        }
    }

    #[test]
    fn test_uncommitted_index_reads_empty() {
        let storage = MemoryStorage::default();
        let reader = IndexReader::open(&storage, &SegmentCache::new()).unwrap();
        assert_eq!(reader.doc_count(), 0);
        assert_eq!(reader.segment_count(), 0);
        assert!(reader.document("1").is_none());
        assert_eq!(reader.doc_freq(&Term::new("name", "x")), 0);
    }

    #[test]
    fn test_open_retries_when_segments_are_merged_away() {
        let inner = MemoryStorage::default();
        let storage = Arc::new(LaggingManifest {
            inner: inner.clone(),
            stale_once: AtomicBool::new(false),
        });
        let analyzer = Arc::new(PerFieldAnalyzer::new(Arc::new(PipelineAnalyzer::standard(
            true,
            &StopWords::empty(),
        ))));
        let mut writer =
            IndexWriter::new(storage.clone(), analyzer, IndexWriterConfig::default()).unwrap();
        writer
            .add_document(Document::with_id("1").add_text("name", "apple", true))
            .unwrap();
        writer
            .add_document(Document::with_id("2").add_text("name", "pear", true))
            .unwrap();
        writer.commit().unwrap();
        writer.delete_document("1").unwrap();
        writer.commit().unwrap();

        let before_merge = inner.read_file(MANIFEST_FILE).unwrap();
        inner.write_file("stale.json", &before_merge).unwrap();
        assert!(writer.force_merge_deletes().unwrap());
        assert!(!inner.file_exists("seg_000000.pst"));

        storage.stale_once.store(true, Ordering::SeqCst);
        let reader = IndexReader::open(storage.as_ref(), &SegmentCache::new()).unwrap();
        assert!(!storage.stale_once.load(Ordering::SeqCst));

        let latest = Manifest::load(&inner).unwrap().unwrap();
        assert_eq!(reader.generation(), latest.generation);
        assert_eq!(reader.segment_count(), 1);
        assert_eq!(reader.doc_count(), 1);
        assert!(reader.document("1").is_none());
        assert!(reader.document("2").is_some());
    }

    #[test]
    fn test_missing_segment_of_latest_commit_is_an_error() {
        let storage = MemoryStorage::default();
        let analyzer = Arc::new(PerFieldAnalyzer::new(Arc::new(PipelineAnalyzer::standard(
            true,
            &StopWords::empty(),
        ))));
        let mut writer =
            IndexWriter::new(Arc::new(storage.clone()), analyzer, IndexWriterConfig::default())
                .unwrap();
        writer
            .add_document(Document::with_id("1").add_text("name", "apple", true))
            .unwrap();
        writer.commit().unwrap();
        storage.delete_file("seg_000000.pst").unwrap();

        assert!(matches!(
            IndexReader::open(&storage, &SegmentCache::new()),
            Err(LucerneError::Io(_))
        ));
    }
}
