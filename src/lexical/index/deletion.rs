//! Tombstones.
//!
//! Committed tombstones live in the manifest as a map from segment name to
//! deleted ordinals. Tombstones created by a writer session are staged in a
//! [`PendingDeletions`] arena and only folded into the manifest at commit,
//! so a rollback is just clearing the arena.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashSet;

/// Committed tombstones: segment name to deleted ordinals.
pub type Deletions = BTreeMap<String, BTreeSet<u32>>;

/// Location of one document copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocAddress {
    pub segment: String,
    pub ordinal: u32,
}

impl DocAddress {
    pub fn new(segment: impl Into<String>, ordinal: u32) -> Self {
        DocAddress {
            segment: segment.into(),
            ordinal,
        }
    }
}

/// Tombstones staged since the last commit.
#[derive(Debug, Default)]
pub struct PendingDeletions {
    staged: Vec<DocAddress>,
    index: AHashSet<DocAddress>,
}

impl PendingDeletions {
    pub fn new() -> Self {
        PendingDeletions::default()
    }

    /// Stage a tombstone. Returns false if it was already staged.
    pub fn stage(&mut self, address: DocAddress) -> bool {
        if self.index.insert(address.clone()) {
            self.staged.push(address);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, segment: &str, ordinal: u32) -> bool {
        self.index.contains(&DocAddress::new(segment, ordinal))
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Copy the staged tombstones into committed deletions.
    pub fn apply_to(&self, deletions: &mut Deletions) {
        for address in &self.staged {
            deletions
                .entry(address.segment.clone())
                .or_default()
                .insert(address.ordinal);
        }
    }

    pub fn clear(&mut self) {
        self.staged.clear();
        self.index.clear();
    }
}
