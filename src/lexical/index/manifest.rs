//! The manifest: the list of committed segments and their tombstones.
//!
//! The manifest is the commit point of the index. It is written to a
//! temporary file and renamed over `manifest.json`, so a reader sees either
//! the previous commit or the new one.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LucerneError, Result};
use crate::lexical::index::deletion::Deletions;
use crate::storage::Storage;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_TEMP_FILE: &str = "manifest.json.tmp";
pub const FORMAT_VERSION: u32 = 1;

/// A committed segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub name: String,
    pub doc_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,

    /// Incremented by every commit that changes the index.
    pub generation: u64,

    /// Number used for the next segment name. Never reused, even after the
    /// index is recreated.
    pub next_segment_id: u64,

    /// Segments in creation order.
    pub segments: Vec<SegmentEntry>,

    #[serde(default)]
    pub deletions: Deletions,
}

impl Default for Manifest {
    fn default() -> Self {
        Manifest {
            version: FORMAT_VERSION,
            generation: 0,
            next_segment_id: 0,
            segments: Vec::new(),
            deletions: Deletions::new(),
        }
    }
}

impl Manifest {
    pub fn exists(storage: &dyn Storage) -> bool {
        storage.file_exists(MANIFEST_FILE)
    }

    /// Read the current manifest, or `None` if the index was never committed.
    pub fn load(storage: &dyn Storage) -> Result<Option<Manifest>> {
        if !Self::exists(storage) {
            return Ok(None);
        }
        let data = storage.read_file(MANIFEST_FILE)?;
        let manifest: Manifest = serde_json::from_slice(&data)?;
        if manifest.version > FORMAT_VERSION {
            return Err(LucerneError::corrupted(format!(
                "manifest version {} is newer than supported version {FORMAT_VERSION}",
                manifest.version
            )));
        }
        Ok(Some(manifest))
    }

    /// Atomically replace the manifest.
    ///
    /// The rename is the commit point: once it succeeds readers see the new
    /// manifest, so a failing directory sync afterwards is only logged.
    pub fn store(&self, storage: &dyn Storage) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        storage.write_file(MANIFEST_TEMP_FILE, &data)?;
        storage.rename_file(MANIFEST_TEMP_FILE, MANIFEST_FILE)?;
        if let Err(e) = storage.sync() {
            warn!("failed to sync the index directory after storing the manifest: {e}");
        }
        debug!(
            "stored manifest generation {} with {} segments",
            self.generation,
            self.segments.len()
        );
        Ok(())
    }

    /// An empty index that keeps the numbering of this one.
    pub fn truncated(&self) -> Manifest {
        Manifest {
            version: FORMAT_VERSION,
            generation: self.generation,
            next_segment_id: self.next_segment_id,
            segments: Vec::new(),
            deletions: Deletions::new(),
        }
    }

    pub fn allocate_segment_name(&mut self) -> String {
        let name = format!("seg_{:06}", self.next_segment_id);
        self.next_segment_id += 1;
        name
    }

    pub fn contains_segment(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s.name == name)
    }

    pub fn is_deleted(&self, segment: &str, ordinal: u32) -> bool {
        self.deletions
            .get(segment)
            .is_some_and(|ords| ords.contains(&ordinal))
    }

    pub fn deleted_count(&self, segment: &str) -> u32 {
        self.deletions.get(segment).map_or(0, |ords| ords.len() as u32)
    }

    pub fn total_doc_count(&self) -> u64 {
        self.segments.iter().map(|s| u64::from(s.doc_count)).sum()
    }

    pub fn live_doc_count(&self) -> u64 {
        self.segments
            .iter()
            .map(|s| u64::from(s.doc_count.saturating_sub(self.deleted_count(&s.name))))
            .sum()
    }

    pub fn has_deletions(&self) -> bool {
        self.deletions.values().any(|ords| !ords.is_empty())
    }

    /// Remove segments whose every document is deleted, returning their names.
    pub fn drop_fully_deleted(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        let deletions = &self.deletions;
        self.segments.retain(|entry| {
            let deleted = deletions.get(&entry.name).map_or(0, |ords| ords.len() as u32);
            let keep = deleted < entry.doc_count;
            if !keep {
                dropped.push(entry.name.clone());
            }
            keep
        });
        self.prune_deletions();
        dropped
    }

    /// Forget tombstones of segments that are no longer listed.
    pub fn prune_deletions(&mut self) {
        let segments = &self.segments;
        self.deletions
            .retain(|name, ords| !ords.is_empty() && segments.iter().any(|s| &s.name == name));
    }
}
