//! Inverted index structures.
//!
//! An index is a list of immutable segments named by the manifest. Each
//! segment maps terms to posting lists over its own document ordinals and
//! keeps the field statistics BM25 needs. Deleted documents are tombstoned
//! in the manifest until a merge rewrites their segment.

pub mod cache;
pub mod deletion;
pub mod manifest;
pub mod merge;
pub mod posting;
pub mod segment;

pub use cache::SegmentCache;
pub use deletion::{Deletions, DocAddress, PendingDeletions};
pub use manifest::{Manifest, SegmentEntry};
pub use merge::{MergeSource, merge_segments};
pub use posting::{Posting, PostingCursor, PostingList};
pub use segment::{FieldStats, Segment, SegmentBuilder};
