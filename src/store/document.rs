//! Per-segment stored-field files and the document store built on them.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LucerneError, Result};
use crate::lexical::index::segment::Segment;
use crate::storage::Storage;
use crate::storage::structured::{StructReader, StructWriter};

const STORED_MAGIC: u32 = 0x4C53_544F; // "LSTO"
const STORED_VERSION: u32 = 1;

pub const STORED_EXTENSION: &str = "sto";

pub fn stored_file(segment: &str) -> String {
    format!("{segment}.{STORED_EXTENSION}")
}

/// Stored values of every document of one segment, indexed by ordinal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredFields {
    docs: Vec<BTreeMap<String, String>>,
}

impl StoredFields {
    pub fn new(docs: Vec<BTreeMap<String, String>>) -> Self {
        StoredFields { docs }
    }

    pub fn get(&self, ordinal: u32) -> Option<&BTreeMap<String, String>> {
        self.docs.get(ordinal as usize)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn write(&self, storage: &dyn Storage, segment: &str) -> Result<()> {
        let file = stored_file(segment);
        let mut writer = StructWriter::new(storage.create_output(&file)?);
        writer.write_u32(STORED_MAGIC)?;
        writer.write_u32(STORED_VERSION)?;
        writer.write_varint(self.docs.len() as u64)?;
        for fields in &self.docs {
            writer.write_varint(fields.len() as u64)?;
            for (name, value) in fields {
                writer.write_string(name)?;
                writer.write_string(value)?;
            }
        }
        writer.close()?;
        debug!("wrote {file}: {} docs", self.docs.len());
        Ok(())
    }

    pub fn load(storage: &dyn Storage, segment: &str) -> Result<Self> {
        let file = stored_file(segment);
        let mut reader = StructReader::new(storage.open_input(&file)?)?;
        if reader.read_u32()? != STORED_MAGIC {
            return Err(LucerneError::corrupted(format!("{file}: bad magic")));
        }
        let version = reader.read_u32()?;
        if version != STORED_VERSION {
            return Err(LucerneError::corrupted(format!(
                "{file}: unsupported version {version}"
            )));
        }
        let count = reader.read_varint()? as usize;
        let mut docs = Vec::with_capacity(count);
        for _ in 0..count {
            let field_count = reader.read_varint()?;
            let mut fields = BTreeMap::new();
            for _ in 0..field_count {
                let name = reader.read_string()?;
                let value = reader.read_string()?;
                fields.insert(name, value);
            }
            docs.push(fields);
        }
        Ok(StoredFields { docs })
    }
}

/// A document as returned by the store: its id and stored field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

impl StoredDocument {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// One segment as seen by a document store.
#[derive(Debug, Clone)]
pub(crate) struct StoreSegment {
    pub segment: Arc<Segment>,
    /// `None` when the stored-fields file is missing.
    pub fields: Option<Arc<StoredFields>>,
    pub deleted: Arc<BTreeSet<u32>>,
}

impl StoreSegment {
    pub fn fields_of(&self, ordinal: u32) -> BTreeMap<String, String> {
        self.fields
            .as_ref()
            .and_then(|fields| fields.get(ordinal))
            .cloned()
            .unwrap_or_default()
    }
}

/// Lookup of stored documents by external id over a set of segments.
///
/// Deleted copies are never returned. When several live copies of an id
/// exist, the most recently written one wins.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    segments: Vec<StoreSegment>,
}

impl DocumentStore {
    pub(crate) fn new(segments: Vec<StoreSegment>) -> Self {
        DocumentStore { segments }
    }

    /// The stored document `id`, or `None` if no live copy exists.
    pub fn get(&self, id: &str) -> Option<StoredDocument> {
        self.get_where(id, |_, _| false)
    }

    /// Like [`get`](Self::get), additionally skipping the copies for which
    /// `hidden(segment, ordinal)` holds.
    pub(crate) fn get_where<F>(&self, id: &str, hidden: F) -> Option<StoredDocument>
    where
        F: Fn(&str, u32) -> bool,
    {
        for entry in self.segments.iter().rev() {
            let name = entry.segment.name();
            for &ordinal in entry.segment.ordinals_of(id).iter().rev() {
                if entry.deleted.contains(&ordinal) || hidden(name, ordinal) {
                    continue;
                }
                return Some(StoredDocument {
                    id: id.to_string(),
                    fields: entry.fields_of(ordinal),
                });
            }
        }
        None
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn segments(&self) -> &[StoreSegment] {
        &self.segments
    }

    /// Number of live documents.
    pub fn len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| s.segment.doc_count() as usize - s.deleted.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::analysis::{PerFieldAnalyzer, PipelineAnalyzer, StopWords};
    use crate::data::Document;
    use crate::lexical::analyzed::analyze_document;
    use crate::lexical::index::segment::SegmentBuilder;
    use crate::storage::memory::MemoryStorage;

    fn store_segment(name: &str, docs: &[Document], deleted: &[u32]) -> StoreSegment {
        let analyzer =
            PerFieldAnalyzer::new(Arc::new(PipelineAnalyzer::standard(true, &StopWords::empty())));
        let mut builder = SegmentBuilder::new();
        let mut stored = Vec::new();
        for doc in docs {
            let analyzed = analyze_document(&analyzer, doc).unwrap();
            builder.add_document(&analyzed);
            stored.push(analyzed.stored);
        }
        StoreSegment {
            segment: Arc::new(builder.build(name)),
            fields: Some(Arc::new(StoredFields::new(stored))),
            deleted: Arc::new(deleted.iter().copied().collect()),
        }
    }

    #[test]
    fn test_write_load() {
        let storage = MemoryStorage::default();
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), "追加饭店".to_string());
        let stored = StoredFields::new(vec![fields, BTreeMap::new()]);
        stored.write(&storage, "seg_000000").unwrap();
        assert!(storage.file_exists("seg_000000.sto"));
        assert_eq!(StoredFields::load(&storage, "seg_000000").unwrap(), stored);
    }

    #[test]
    fn test_newest_live_copy_wins() {
        let old = store_segment(
            "seg_000000",
            &[Document::with_id("1").add_text("name", "old", true)],
            &[],
        );
        let new = store_segment(
            "seg_000001",
            &[Document::with_id("1").add_text("name", "new", true)],
            &[],
        );
        let store = DocumentStore::new(vec![old, new]);
        assert_eq!(store.get("1").unwrap().get("name"), Some("new"));
        assert_eq!(store.len(), 2);

        let older = store.get_where("1", |segment, _| segment == "seg_000001");
        assert_eq!(older.unwrap().get("name"), Some("old"));
    }

    #[test]
    fn test_deleted_copy_is_not_found() {
        let segment = store_segment(
            "seg_000000",
            &[
                Document::with_id("1").add_text("name", "追加饭店", true),
                Document::with_id("2").add_text("name", "other", false),
            ],
            &[0],
        );
        let store = DocumentStore::new(vec![segment]);
        assert!(store.get("1").is_none());
        assert!(store.get("missing").is_none());

        let two = store.get("2").unwrap();
        assert!(two.fields.is_empty());
        assert_eq!(store.len(), 1);
    }
}
