//! Posting lists.

use crate::error::{LucerneError, Result};
use crate::storage::StorageOutput;
use crate::storage::structured::{StructReader, StructWriter};

/// Occurrences of one term in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    /// Document ordinal within the segment.
    pub doc: u32,

    /// Term frequency. Always equal to `positions.len()`.
    pub freq: u32,

    /// Token positions, ascending.
    pub positions: Vec<u32>,
}

impl Posting {
    pub fn new(doc: u32, positions: Vec<u32>) -> Self {
        Posting {
            doc,
            freq: positions.len() as u32,
            positions,
        }
    }
}

/// Postings of one term ordered by document ordinal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList::default()
    }

    /// Append a posting. Ordinals must be strictly increasing.
    pub fn push(&mut self, posting: Posting) -> Result<()> {
        if let Some(last) = self.postings.last()
            && posting.doc <= last.doc
        {
            return Err(LucerneError::invalid_argument(format!(
                "posting for document {} pushed after document {}",
                posting.doc, last.doc
            )));
        }
        self.postings.push(posting);
        Ok(())
    }

    /// Record one occurrence at build time, extending the last posting when
    /// it belongs to the same document.
    pub(crate) fn add_occurrence(&mut self, doc: u32, position: u32) {
        match self.postings.last_mut() {
            Some(last) if last.doc == doc => {
                last.positions.push(position);
                last.freq += 1;
            }
            _ => self.postings.push(Posting::new(doc, vec![position])),
        }
    }

    /// Number of documents containing the term.
    pub fn doc_freq(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn cursor(&self) -> PostingCursor<'_> {
        PostingCursor {
            postings: &self.postings,
            next: 0,
        }
    }

    /// Delta + varint encoding of ordinals and positions.
    pub fn encode<W: StorageOutput>(&self, writer: &mut StructWriter<W>) -> Result<()> {
        writer.write_varint(self.postings.len() as u64)?;
        let mut prev_doc = 0u32;
        for posting in &self.postings {
            writer.write_varint(u64::from(posting.doc - prev_doc))?;
            writer.write_varint(u64::from(posting.freq))?;
            let mut prev_pos = 0u32;
            for &pos in &posting.positions {
                writer.write_varint(u64::from(pos - prev_pos))?;
                prev_pos = pos;
            }
            prev_doc = posting.doc;
        }
        Ok(())
    }

    pub fn decode(reader: &mut StructReader) -> Result<Self> {
        let count = reader.read_varint()? as usize;
        let mut postings = Vec::with_capacity(count);
        let mut doc = 0u32;
        for i in 0..count {
            let delta = to_u32(reader.read_varint()?)?;
            if i > 0 && delta == 0 {
                return Err(LucerneError::corrupted("posting list ordinals not increasing"));
            }
            doc = doc
                .checked_add(delta)
                .ok_or_else(|| LucerneError::corrupted("posting ordinal overflow"))?;
            let freq = to_u32(reader.read_varint()?)?;
            let mut positions = Vec::with_capacity(freq as usize);
            let mut pos = 0u32;
            for _ in 0..freq {
                pos = pos
                    .checked_add(to_u32(reader.read_varint()?)?)
                    .ok_or_else(|| LucerneError::corrupted("position overflow"))?;
                positions.push(pos);
            }
            postings.push(Posting { doc, freq, positions });
        }
        Ok(PostingList { postings })
    }
}

fn to_u32(value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| LucerneError::corrupted(format!("value {value} exceeds u32")))
}

/// Forward-only iteration over a posting list.
#[derive(Debug, Clone)]
pub struct PostingCursor<'a> {
    postings: &'a [Posting],
    next: usize,
}

impl<'a> PostingCursor<'a> {
    /// Move to the first posting at or after the current one whose ordinal is
    /// at least `target`.
    pub fn advance(&mut self, target: u32) -> Option<&'a Posting> {
        let from = self.next.saturating_sub(1);
        let rest = &self.postings[from..];
        let idx = from + rest.partition_point(|p| p.doc < target);
        self.next = idx + 1;
        self.postings.get(idx)
    }

    /// The posting the cursor is on, if any.
    pub fn current(&self) -> Option<&'a Posting> {
        self.next.checked_sub(1).and_then(|i| self.postings.get(i))
    }
}

impl<'a> Iterator for PostingCursor<'a> {
    type Item = &'a Posting;

    fn next(&mut self) -> Option<Self::Item> {
        let posting = self.postings.get(self.next);
        if posting.is_some() {
            self.next += 1;
        }
        posting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::storage::memory::MemoryStorage;

    fn list(docs: &[(u32, &[u32])]) -> PostingList {
        let mut list = PostingList::new();
        for (doc, positions) in docs {
            list.push(Posting::new(*doc, positions.to_vec())).unwrap();
        }
        list
    }

    #[test]
    fn test_push_rejects_non_increasing() {
        let mut list = list(&[(3, &[0])]);
        assert!(list.push(Posting::new(3, vec![1])).is_err());
        assert!(list.push(Posting::new(1, vec![1])).is_err());
        assert!(list.push(Posting::new(4, vec![1])).is_ok());
    }

    #[test]
    fn test_add_occurrence_groups_by_doc() {
        let mut list = PostingList::new();
        list.add_occurrence(0, 1);
        list.add_occurrence(0, 4);
        list.add_occurrence(2, 0);
        let postings: Vec<_> = list.iter().cloned().collect();
        assert_eq!(postings[0], Posting::new(0, vec![1, 4]));
        assert_eq!(postings[0].freq, 2);
        assert_eq!(list.doc_freq(), 2);
    }

    #[test]
    fn test_cursor_advance() {
        let list = list(&[(1, &[0]), (4, &[0]), (9, &[0]), (12, &[0])]);
        let mut cursor = list.cursor();
        assert!(cursor.current().is_none());
        assert_eq!(cursor.next().map(|p| p.doc), Some(1));
        assert_eq!(cursor.advance(5).map(|p| p.doc), Some(9));
        // never moves backwards
        assert_eq!(cursor.advance(2).map(|p| p.doc), Some(9));
        assert_eq!(cursor.next().map(|p| p.doc), Some(12));
        assert_eq!(cursor.advance(13), None);
        assert_eq!(cursor.next(), None);
    }

    #[test]
    fn test_encode_decode() {
        let original = list(&[(0, &[0, 5, 6]), (7, &[2]), (300, &[1000])]);
        let storage = MemoryStorage::default();
        let mut writer = StructWriter::new(storage.create_output("p").unwrap());
        original.encode(&mut writer).unwrap();
        writer.close().unwrap();

        let mut reader = StructReader::new(storage.open_input("p").unwrap()).unwrap();
        assert_eq!(PostingList::decode(&mut reader).unwrap(), original);
    }
}
