//! Shared cache of loaded segments.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::Result;
use crate::lexical::index::manifest::Manifest;
use crate::lexical::index::segment::Segment;
use crate::storage::Storage;
use crate::store::document::{StoredFields, stored_file};

/// Loaded segments and stored-field files, keyed by segment name.
///
/// Segment names are never reused, so a cached entry can never go stale;
/// it can only become unreferenced and get evicted by [`retain`].
///
/// [`retain`]: SegmentCache::retain
#[derive(Debug, Default)]
pub struct SegmentCache {
    segments: Mutex<AHashMap<String, Arc<Segment>>>,
    stored: Mutex<AHashMap<String, Arc<StoredFields>>>,
}

impl SegmentCache {
    pub fn new() -> Self {
        SegmentCache::default()
    }

    pub fn segment(&self, storage: &dyn Storage, name: &str) -> Result<Arc<Segment>> {
        if let Some(segment) = self.segments.lock().get(name) {
            return Ok(Arc::clone(segment));
        }
        let segment = Arc::new(Segment::load(storage, name)?);
        debug!("loaded segment {name} ({} docs)", segment.doc_count());
        self.segments
            .lock()
            .insert(name.to_string(), Arc::clone(&segment));
        Ok(segment)
    }

    /// Stored fields of a segment, or `None` if its file is missing.
    pub fn stored_fields(
        &self,
        storage: &dyn Storage,
        name: &str,
    ) -> Result<Option<Arc<StoredFields>>> {
        if let Some(fields) = self.stored.lock().get(name) {
            return Ok(Some(Arc::clone(fields)));
        }
        if !storage.file_exists(&stored_file(name)) {
            warn!("stored fields of segment {name} are missing; its documents have no stored values");
            return Ok(None);
        }
        let fields = Arc::new(StoredFields::load(storage, name)?);
        self.stored.lock().insert(name.to_string(), Arc::clone(&fields));
        Ok(Some(fields))
    }

    pub fn insert(&self, segment: Arc<Segment>, fields: Arc<StoredFields>) {
        let name = segment.name().to_string();
        self.stored.lock().insert(name.clone(), fields);
        self.segments.lock().insert(name, segment);
    }

    /// Evict every segment the manifest no longer lists.
    pub fn retain(&self, manifest: &Manifest) {
        self.segments
            .lock()
            .retain(|name, _| manifest.contains_segment(name));
        self.stored
            .lock()
            .retain(|name, _| manifest.contains_segment(name));
    }

    pub fn len(&self) -> usize {
        self.segments.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
