//! Rewriting segments without their deleted documents.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::lexical::index::posting::Posting;
use crate::lexical::index::segment::{Segment, SegmentBuilder};
use crate::store::document::StoredFields;

/// A segment taking part in a merge.
#[derive(Debug)]
pub struct MergeSource<'a> {
    pub segment: Arc<Segment>,
    pub fields: Option<Arc<StoredFields>>,
    pub deleted: &'a BTreeSet<u32>,
}

/// Merge `sources` into one segment holding only their live documents, in
/// source order. Returns `None` if no document survives.
pub fn merge_segments(
    sources: &[MergeSource<'_>],
    name: &str,
) -> Result<Option<(Segment, StoredFields)>> {
    let mut builder = SegmentBuilder::new();
    let mut stored = Vec::new();
    let mut remaps: Vec<Vec<Option<u32>>> = Vec::with_capacity(sources.len());

    for source in sources {
        let segment = &source.segment;
        let mut remap = vec![None; segment.doc_count() as usize];
        for ordinal in 0..segment.doc_count() {
            if source.deleted.contains(&ordinal) {
                continue;
            }
            let Some(id) = segment.external_id(ordinal) else {
                continue;
            };
            let new_ordinal = builder.add_raw_document(id);
            remap[ordinal as usize] = Some(new_ordinal);
            stored.push(
                source
                    .fields
                    .as_ref()
                    .and_then(|fields| fields.get(ordinal))
                    .cloned()
                    .unwrap_or_default(),
            );
            for field in segment.fields() {
                if let Some(length) = segment.field_length(field, ordinal) {
                    builder.set_field_length(field, new_ordinal, length);
                }
            }
        }
        remaps.push(remap);
    }

    if builder.is_empty() {
        return Ok(None);
    }

    // Sources are visited in order and ordinals are assigned in the same
    // order, so every posting list stays strictly increasing.
    for (source, remap) in sources.iter().zip(&remaps) {
        for (term, list) in source.segment.terms() {
            let live: Vec<&Posting> = list
                .iter()
                .filter(|p| remap[p.doc as usize].is_some())
                .collect();
            if live.is_empty() {
                continue;
            }
            let target = builder.posting_list_mut(term);
            for posting in live {
                if let Some(doc) = remap[posting.doc as usize] {
                    target.push(Posting::new(doc, posting.positions.clone()))?;
                }
            }
        }
    }

    Ok(Some((builder.build(name), StoredFields::new(stored))))
}
