//! Immutable index segments and the postings file codec.

use std::collections::BTreeMap;

use ahash::AHashMap;
use log::debug;

use crate::error::{LucerneError, Result};
use crate::lexical::analyzed::AnalyzedDocument;
use crate::lexical::index::posting::PostingList;
use crate::lexical::term::Term;
use crate::storage::Storage;
use crate::storage::structured::{StructReader, StructWriter};

const POSTINGS_MAGIC: u32 = 0x4C50_5354; // "LPST"
const POSTINGS_VERSION: u32 = 1;

/// Extension of the postings file of a segment.
pub const POSTINGS_EXTENSION: &str = "pst";

pub fn postings_file(segment: &str) -> String {
    format!("{segment}.{POSTINGS_EXTENSION}")
}

/// Document count and summed length of one field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    pub doc_count: u64,
    pub total_length: u64,
}

impl FieldStats {
    pub fn avg_length(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.total_length as f32 / self.doc_count as f32
        }
    }

    pub(crate) fn add(&mut self, length: u32) {
        self.doc_count += 1;
        self.total_length += u64::from(length);
    }

    pub(crate) fn remove(&mut self, length: u32) {
        self.doc_count = self.doc_count.saturating_sub(1);
        self.total_length = self.total_length.saturating_sub(u64::from(length));
    }
}

/// An immutable, searchable set of documents.
#[derive(Debug)]
pub struct Segment {
    name: String,
    doc_ids: Vec<String>,
    id_index: AHashMap<String, Vec<u32>>,
    field_lengths: BTreeMap<String, Vec<Option<u32>>>,
    field_stats: AHashMap<String, FieldStats>,
    postings: BTreeMap<Term, PostingList>,
}

impl Segment {
    fn new(
        name: String,
        doc_ids: Vec<String>,
        field_lengths: BTreeMap<String, Vec<Option<u32>>>,
        postings: BTreeMap<Term, PostingList>,
    ) -> Self {
        let mut id_index: AHashMap<String, Vec<u32>> = AHashMap::new();
        for (ordinal, id) in doc_ids.iter().enumerate() {
            id_index.entry(id.clone()).or_default().push(ordinal as u32);
        }

        let field_stats = field_lengths
            .iter()
            .map(|(field, lengths)| {
                let mut stats = FieldStats::default();
                lengths.iter().flatten().for_each(|&len| stats.add(len));
                (field.clone(), stats)
            })
            .collect();

        Segment {
            name,
            doc_ids,
            id_index,
            field_lengths,
            field_stats,
            postings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_ids.len() as u32
    }

    pub fn external_id(&self, ordinal: u32) -> Option<&str> {
        self.doc_ids.get(ordinal as usize).map(String::as_str)
    }

    /// Ordinals holding a copy of the document `id`.
    pub fn ordinals_of(&self, id: &str) -> &[u32] {
        self.id_index.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn postings(&self, term: &Term) -> Option<&PostingList> {
        self.postings.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Term, &PostingList)> {
        self.postings.iter()
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Number of terms `ordinal` has in `field`, or `None` if the document
    /// has no such indexed field.
    pub fn field_length(&self, field: &str, ordinal: u32) -> Option<u32> {
        self.field_lengths
            .get(field)
            .and_then(|lengths| lengths.get(ordinal as usize).copied().flatten())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.field_lengths.keys().map(String::as_str)
    }

    /// Statistics over every document of the segment, deleted or not.
    pub fn field_stats(&self, field: &str) -> FieldStats {
        self.field_stats.get(field).copied().unwrap_or_default()
    }

    /// Write the postings file. The output is synced before it is closed.
    pub fn write(&self, storage: &dyn Storage) -> Result<()> {
        let file = postings_file(&self.name);
        let mut writer = StructWriter::new(storage.create_output(&file)?);

        writer.write_u32(POSTINGS_MAGIC)?;
        writer.write_u32(POSTINGS_VERSION)?;

        writer.write_varint(self.doc_ids.len() as u64)?;
        for id in &self.doc_ids {
            writer.write_string(id)?;
        }

        writer.write_varint(self.field_lengths.len() as u64)?;
        for (field, lengths) in &self.field_lengths {
            writer.write_string(field)?;
            let present: Vec<(u32, u32)> = lengths
                .iter()
                .enumerate()
                .filter_map(|(ord, len)| len.map(|len| (ord as u32, len)))
                .collect();
            writer.write_varint(present.len() as u64)?;
            let mut prev = 0u32;
            for (ord, len) in present {
                writer.write_varint(u64::from(ord - prev))?;
                writer.write_varint(u64::from(len))?;
                prev = ord;
            }
        }

        writer.write_varint(self.postings.len() as u64)?;
        for (term, list) in &self.postings {
            writer.write_string(term.field())?;
            writer.write_string(term.text())?;
            list.encode(&mut writer)?;
        }

        writer.close()?;
        debug!(
            "wrote {file}: {} docs, {} terms",
            self.doc_ids.len(),
            self.postings.len()
        );
        Ok(())
    }

    /// Load a segment from its postings file.
    pub fn load(storage: &dyn Storage, name: &str) -> Result<Segment> {
        let file = postings_file(name);
        let mut reader = StructReader::new(storage.open_input(&file)?)?;

        let magic = reader.read_u32()?;
        if magic != POSTINGS_MAGIC {
            return Err(LucerneError::corrupted(format!(
                "{file}: bad magic {magic:#010x}"
            )));
        }
        let version = reader.read_u32()?;
        if version != POSTINGS_VERSION {
            return Err(LucerneError::corrupted(format!(
                "{file}: unsupported version {version}"
            )));
        }

        let doc_count = reader.read_varint()? as usize;
        let mut doc_ids = Vec::with_capacity(doc_count);
        for _ in 0..doc_count {
            doc_ids.push(reader.read_string()?);
        }

        let field_count = reader.read_varint()?;
        let mut field_lengths = BTreeMap::new();
        for _ in 0..field_count {
            let field = reader.read_string()?;
            let mut lengths = vec![None; doc_count];
            let present = reader.read_varint()?;
            let mut ord = 0u64;
            for _ in 0..present {
                ord += reader.read_varint()?;
                let len = reader.read_varint()? as u32;
                let slot = lengths.get_mut(ord as usize).ok_or_else(|| {
                    LucerneError::corrupted(format!("{file}: field length for ordinal {ord}"))
                })?;
                *slot = Some(len);
            }
            field_lengths.insert(field, lengths);
        }

        let term_count = reader.read_varint()?;
        let mut postings = BTreeMap::new();
        for _ in 0..term_count {
            let field = reader.read_string()?;
            let text = reader.read_string()?;
            let list = PostingList::decode(&mut reader)?;
            if list.iter().any(|p| p.doc as usize >= doc_count) {
                return Err(LucerneError::corrupted(format!(
                    "{file}: posting beyond document count for {field}:{text}"
                )));
            }
            postings.insert(Term::new(field, text), list);
        }

        if !reader.is_eof() {
            return Err(LucerneError::corrupted(format!("{file}: trailing data")));
        }

        Ok(Segment::new(name.to_string(), doc_ids, field_lengths, postings))
    }
}

/// Accumulates analyzed documents into a new segment.
#[derive(Debug, Default)]
pub struct SegmentBuilder {
    doc_ids: Vec<String>,
    field_lengths: BTreeMap<String, Vec<Option<u32>>>,
    postings: BTreeMap<Term, PostingList>,
}

impl SegmentBuilder {
    pub fn new() -> Self {
        SegmentBuilder::default()
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_ids.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    /// Add a document and return its ordinal.
    pub fn add_document(&mut self, doc: &AnalyzedDocument) -> u32 {
        let ordinal = self.doc_ids.len() as u32;
        self.doc_ids.push(doc.id.clone());

        for (field, terms) in &doc.field_terms {
            self.set_field_length(field, ordinal, terms.len() as u32);
            for term in terms {
                self.postings
                    .entry(Term::new(field.as_str(), term.text.as_str()))
                    .or_default()
                    .add_occurrence(ordinal, term.position);
            }
        }
        ordinal
    }

    /// Start a document whose postings are pushed one by one (merging).
    pub(crate) fn add_raw_document(&mut self, id: &str) -> u32 {
        let ordinal = self.doc_ids.len() as u32;
        self.doc_ids.push(id.to_string());
        ordinal
    }

    pub(crate) fn set_field_length(&mut self, field: &str, ordinal: u32, length: u32) {
        let lengths = self.field_lengths.entry(field.to_string()).or_default();
        if lengths.len() <= ordinal as usize {
            lengths.resize(ordinal as usize + 1, None);
        }
        lengths[ordinal as usize] = Some(length);
    }

    pub(crate) fn posting_list_mut(&mut self, term: &Term) -> &mut PostingList {
        self.postings.entry(term.clone()).or_default()
    }

    pub fn build(self, name: impl Into<String>) -> Segment {
        let doc_count = self.doc_ids.len();
        let field_lengths = self
            .field_lengths
            .into_iter()
            .map(|(field, mut lengths)| {
                lengths.resize(doc_count, None);
                (field, lengths)
            })
            .collect();
        Segment::new(name.into(), self.doc_ids, field_lengths, self.postings)
    }
}
