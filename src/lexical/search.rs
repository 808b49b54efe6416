//! Ranked retrieval over an [`IndexReader`] snapshot.
//!
//! A query is first turned into a tree of weights that carries the
//! collection statistics of the snapshot (live document count, document
//! frequency, average field length). Each segment is then scored on its own
//! and the best hits are kept by a bounded heap.

mod collector;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LucerneError, Result};
use crate::lexical::index::posting::{Posting, PostingList};
use crate::lexical::query::{BooleanQuery, Occur, PhraseQuery, Query};
use crate::lexical::reader::IndexReader;
use crate::lexical::similarity::Bm25;
use crate::lexical::term::Term;
use crate::store::document::StoreSegment;

use self::collector::{Candidate, TopDocsCollector};

/// Cooperative cancellation flag shared between a search and its caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once [`cancel`](Self::cancel) has been called.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(LucerneError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A ranked document id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub id: String,
    pub score: f32,
}

/// A ranked document with its stored fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
    pub fields: BTreeMap<String, String>,
}

/// Executes queries against one reader snapshot.
#[derive(Debug, Clone)]
pub struct Searcher {
    reader: IndexReader,
    bm25: Bm25,
}

impl Searcher {
    pub fn new(reader: IndexReader) -> Self {
        Searcher {
            reader,
            bm25: Bm25::default(),
        }
    }

    pub fn with_bm25(mut self, bm25: Bm25) -> Self {
        self.bm25 = bm25;
        self
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    /// At most `top_k` documents, best first. Equal scores are ordered by
    /// document id.
    pub fn search(&self, query: &Query, top_k: usize) -> Result<Vec<ScoredDoc>> {
        self.search_with_cancellation(query, top_k, &CancellationToken::new())
    }

    pub fn search_with_cancellation(
        &self,
        query: &Query,
        top_k: usize,
        token: &CancellationToken,
    ) -> Result<Vec<ScoredDoc>> {
        let collector = self.collect(query, top_k, token)?;
        Ok(collector
            .into_sorted()
            .into_iter()
            .map(|c| ScoredDoc {
                id: c.id,
                score: c.score,
            })
            .collect())
    }

    /// Like [`search`](Self::search), with the stored fields of every hit.
    pub fn search_documents(&self, query: &Query, top_k: usize) -> Result<Vec<SearchHit>> {
        let collector = self.collect(query, top_k, &CancellationToken::new())?;
        let segments = self.reader.segments();
        Ok(collector
            .into_sorted()
            .into_iter()
            .map(|c| SearchHit {
                fields: segments[c.segment].fields_of(c.ordinal),
                id: c.id,
                score: c.score,
            })
            .collect())
    }

    /// Number of matching live documents.
    pub fn count(&self, query: &Query) -> Result<usize> {
        Ok(self
            .collect(query, 0, &CancellationToken::new())?
            .total_hits())
    }

    fn collect(
        &self,
        query: &Query,
        top_k: usize,
        token: &CancellationToken,
    ) -> Result<TopDocsCollector> {
        let weight = self.weight(query);
        let mut collector = TopDocsCollector::new(top_k);

        for (index, entry) in self.reader.segments().iter().enumerate() {
            token.check()?;
            let scorer = SegmentScorer {
                entry,
                bm25: &self.bm25,
                token,
            };
            for (ordinal, score) in scorer.evaluate(&weight)? {
                let Some(id) = entry.segment.external_id(ordinal) else {
                    continue;
                };
                collector.collect(Candidate {
                    score,
                    id: id.to_string(),
                    segment: index,
                    ordinal,
                });
            }
        }

        debug!(
            "query {query} matched {} docs in {} segments",
            collector.total_hits(),
            self.reader.segment_count()
        );
        Ok(collector)
    }

    fn weight(&self, query: &Query) -> Weight {
        match query {
            Query::Term(q) => self.term_weight(&q.term),
            Query::Phrase(q) => self.phrase_weight(q),
            Query::Boolean(q) => self.boolean_weight(q),
        }
    }

    fn term_weight(&self, term: &Term) -> Weight {
        let doc_freq = self.reader.doc_freq(term);
        if doc_freq == 0 {
            return Weight::Nothing;
        }
        let stats = self.reader.field_stats(term.field());
        Weight::Term {
            term: term.clone(),
            idf: self.bm25.idf(doc_freq, stats.doc_count),
            avg_length: stats.avg_length(),
        }
    }

    fn phrase_weight(&self, query: &PhraseQuery) -> Weight {
        if query.terms().is_empty() {
            return Weight::Nothing;
        }
        let stats = self.reader.field_stats(query.field());
        let mut idf = 0.0;
        let mut terms = Vec::with_capacity(query.terms().len());
        for (text, offset) in query.terms() {
            let term = Term::new(query.field(), text.as_str());
            let doc_freq = self.reader.doc_freq(&term);
            if doc_freq == 0 {
                return Weight::Nothing;
            }
            idf += self.bm25.idf(doc_freq, stats.doc_count);
            terms.push((term, *offset));
        }
        Weight::Phrase {
            field: query.field().to_string(),
            terms,
            idf,
            avg_length: stats.avg_length(),
        }
    }

    fn boolean_weight(&self, query: &BooleanQuery) -> Weight {
        if !query.has_positive_clause() {
            return Weight::Nothing;
        }
        let mut weight = BooleanWeight::default();
        for clause in query.clauses() {
            let inner = self.weight(&clause.query);
            match clause.occur {
                Occur::Must => weight.must.push(inner),
                Occur::Should => weight.should.push(inner),
                Occur::MustNot => weight.must_not.push(inner),
                Occur::Filter => weight.filter.push(inner),
            }
        }
        Weight::Boolean(weight)
    }
}

/// A query bound to the statistics of one snapshot.
#[derive(Debug)]
enum Weight {
    Nothing,
    Term {
        term: Term,
        idf: f32,
        avg_length: f32,
    },
    Phrase {
        field: String,
        /// Terms with their offset from the first one.
        terms: Vec<(Term, u32)>,
        idf: f32,
        avg_length: f32,
    },
    Boolean(BooleanWeight),
}

#[derive(Debug, Default)]
struct BooleanWeight {
    must: Vec<Weight>,
    should: Vec<Weight>,
    must_not: Vec<Weight>,
    filter: Vec<Weight>,
}

type Scores = AHashMap<u32, f32>;

struct SegmentScorer<'a> {
    entry: &'a StoreSegment,
    bm25: &'a Bm25,
    token: &'a CancellationToken,
}

impl SegmentScorer<'_> {
    fn evaluate(&self, weight: &Weight) -> Result<Scores> {
        match weight {
            Weight::Nothing => Ok(Scores::new()),
            Weight::Term {
                term,
                idf,
                avg_length,
            } => self.term(term, *idf, *avg_length),
            Weight::Phrase {
                field,
                terms,
                idf,
                avg_length,
            } => self.phrase(field, terms, *idf, *avg_length),
            Weight::Boolean(weight) => self.boolean(weight),
        }
    }

    fn is_live(&self, posting: &Posting) -> bool {
        !self.entry.deleted.contains(&posting.doc)
    }

    fn score(&self, field: &str, doc: u32, idf: f32, freq: u32, avg_length: f32) -> f32 {
        let length = self
            .entry
            .segment
            .field_length(field, doc)
            .unwrap_or(freq);
        self.bm25
            .score(idf, freq as f32, length as f32, avg_length)
    }

    fn postings(&self, term: &Term) -> Result<Option<&PostingList>> {
        self.token.check()?;
        Ok(self.entry.segment.postings(term))
    }

    fn term(&self, term: &Term, idf: f32, avg_length: f32) -> Result<Scores> {
        let mut scores = Scores::new();
        if let Some(list) = self.postings(term)? {
            for posting in list.iter().filter(|p| self.is_live(p)) {
                let score = self.score(term.field(), posting.doc, idf, posting.freq, avg_length);
                scores.insert(posting.doc, score);
            }
        }
        Ok(scores)
    }

    fn phrase(
        &self,
        field: &str,
        terms: &[(Term, u32)],
        idf: f32,
        avg_length: f32,
    ) -> Result<Scores> {
        let mut scores = Scores::new();
        let mut lists = Vec::with_capacity(terms.len());
        for (term, offset) in terms {
            match self.postings(term)? {
                Some(list) => lists.push((list, *offset)),
                None => return Ok(scores),
            }
        }
        let Some(((lead, lead_offset), rest)) = lists.split_first() else {
            return Ok(scores);
        };
        let mut cursors: Vec<_> = rest
            .iter()
            .map(|(list, offset)| (list.cursor(), *offset))
            .collect();

        'docs: for posting in lead.iter().filter(|p| self.is_live(p)) {
            let mut matched = Vec::with_capacity(cursors.len());
            for (cursor, offset) in cursors.iter_mut() {
                match cursor.advance(posting.doc) {
                    Some(other) if other.doc == posting.doc => matched.push((other, *offset)),
                    Some(_) => continue 'docs,
                    None => break 'docs,
                }
            }

            let freq = posting
                .positions
                .iter()
                .filter_map(|&p| p.checked_sub(*lead_offset))
                .filter(|start| {
                    matched
                        .iter()
                        .all(|(other, offset)| other.positions.binary_search(&(start + offset)).is_ok())
                })
                .count() as u32;
            if freq > 0 {
                scores.insert(posting.doc, self.score(field, posting.doc, idf, freq, avg_length));
            }
        }
        Ok(scores)
    }

    fn boolean(&self, weight: &BooleanWeight) -> Result<Scores> {
        let mut required: Option<Scores> = None;
        for (inner, scoring) in weight
            .must
            .iter()
            .map(|w| (w, true))
            .chain(weight.filter.iter().map(|w| (w, false)))
        {
            let mut scores = self.evaluate(inner)?;
            if !scoring {
                scores.values_mut().for_each(|s| *s = 0.0);
            }
            required = Some(match required {
                None => scores,
                Some(mut acc) => {
                    acc.retain(|doc, score| match scores.get(doc) {
                        Some(extra) => {
                            *score += extra;
                            true
                        }
                        None => false,
                    });
                    acc
                }
            });
            if required.as_ref().is_some_and(|r| r.is_empty()) {
                return Ok(Scores::new());
            }
        }

        let mut result = match required {
            Some(mut acc) => {
                for inner in &weight.should {
                    for (doc, score) in self.evaluate(inner)? {
                        if let Some(total) = acc.get_mut(&doc) {
                            *total += score;
                        }
                    }
                }
                acc
            }
            None => {
                let mut union = Scores::new();
                for inner in &weight.should {
                    for (doc, score) in self.evaluate(inner)? {
                        *union.entry(doc).or_insert(0.0) += score;
                    }
                }
                union
            }
        };

        for inner in &weight.must_not {
            if result.is_empty() {
                break;
            }
            for doc in self.evaluate(inner)?.keys() {
                result.remove(doc);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::analysis::{PerFieldAnalyzer, PipelineAnalyzer, StopWords};
    use crate::data::Document;
    use crate::lexical::analyzed::analyze_document;
    use crate::lexical::index::manifest::{Manifest, SegmentEntry};
    use crate::lexical::index::segment::SegmentBuilder;
    use crate::store::document::StoredFields;

    fn segment(name: &str, docs: &[(&str, &str)], deleted: &[u32]) -> StoreSegment {
        let analyzer =
            PerFieldAnalyzer::new(Arc::new(PipelineAnalyzer::standard(true, &StopWords::empty())));
        let mut builder = SegmentBuilder::new();
        let mut stored = Vec::new();
        for (id, text) in docs {
            let doc = Document::with_id(*id).add_text("body", *text, true);
            let analyzed = analyze_document(&analyzer, &doc).unwrap();
            builder.add_document(&analyzed);
            stored.push(analyzed.stored);
        }
        StoreSegment {
            segment: Arc::new(builder.build(name)),
            fields: Some(Arc::new(StoredFields::new(stored))),
            deleted: Arc::new(deleted.iter().copied().collect()),
        }
    }

    fn reader(segments: Vec<StoreSegment>) -> IndexReader {
        let mut manifest = Manifest::default();
        for entry in &segments {
            let name = entry.segment.name().to_string();
            manifest.segments.push(SegmentEntry {
                name: name.clone(),
                doc_count: entry.segment.doc_count(),
            });
            if !entry.deleted.is_empty() {
                let deleted: BTreeSet<u32> = entry.deleted.iter().copied().collect();
                manifest.deletions.insert(name, deleted);
            }
        }
        IndexReader::from_parts(manifest, segments)
    }

    fn ids(hits: &[ScoredDoc]) -> Vec<&str> {
        hits.iter().map(|h| h.id.as_str()).collect()
    }

    #[test]
    fn test_term_frequency_ranks_higher() {
        let reader = reader(vec![segment(
            "s0",
            &[
                ("one", "apple pear plum kiwi fig"),
                ("three", "apple apple apple kiwi fig"),
                ("five", "apple apple apple apple apple"),
                ("none", "lime lime lime lime lime"),
            ],
            &[],
        )]);
        let hits = Searcher::new(reader)
            .search(&Query::term("body", "apple"), 10)
            .unwrap();
        assert_eq!(ids(&hits), vec!["five", "three", "one"]);
        assert!(hits[0].score > hits[1].score && hits[1].score > hits[2].score);
    }

    #[test]
    fn test_ties_break_by_id_and_top_k_bounds() {
        let reader = reader(vec![segment("s0", &[("b", "x"), ("c", "x"), ("a", "x")], &[])]);
        let searcher = Searcher::new(reader);
        let hits = searcher.search(&Query::term("body", "x"), 2).unwrap();
        assert_eq!(ids(&hits), vec!["a", "b"]);
        assert!(searcher.search(&Query::term("body", "x"), 0).unwrap().is_empty());
        assert_eq!(searcher.count(&Query::term("body", "x")).unwrap(), 3);
    }

    #[test]
    fn test_deleted_documents_do_not_match() {
        let reader = reader(vec![
            segment("s0", &[("1", "red apple"), ("2", "red cherry")], &[0]),
            segment("s1", &[("3", "green apple")], &[]),
        ]);
        assert_eq!(reader.doc_count(), 2);
        let searcher = Searcher::new(reader);
        let hits = searcher.search(&Query::term("body", "apple"), 10).unwrap();
        assert_eq!(ids(&hits), vec!["3"]);
    }

    #[test]
    fn test_boolean_semantics() {
        let reader = reader(vec![segment(
            "s0",
            &[("1", "rust search"), ("2", "rust web"), ("3", "go search")],
            &[],
        )]);
        let searcher = Searcher::new(reader);

        let mut must = BooleanQuery::new();
        must.add_must(Query::term("body", "rust"));
        must.add_must_not(Query::term("body", "web"));
        let hits = searcher.search(&must.into(), 10).unwrap();
        assert_eq!(ids(&hits), vec!["1"]);

        let mut should = BooleanQuery::new();
        should.add_should(Query::term("body", "web"));
        should.add_should(Query::term("body", "go"));
        let mut hits = ids(&searcher.search(&should.into(), 10).unwrap())
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        hits.sort();
        assert_eq!(hits, vec!["2", "3"]);

        let mut filtered = BooleanQuery::new();
        filtered.add_filter(Query::term("body", "search"));
        let hits = searcher.search(&filtered.into(), 10).unwrap();
        assert_eq!(ids(&hits), vec!["1", "3"]);
        assert!(hits.iter().all(|h| h.score == 0.0));

        let mut negative = BooleanQuery::new();
        negative.add_must_not(Query::term("body", "web"));
        assert!(searcher.search(&negative.into(), 10).unwrap().is_empty());
    }

    #[test]
    fn test_phrase_requires_adjacent_positions() {
        let reader = reader(vec![segment(
            "s0",
            &[("1", "new york city"), ("2", "york is new")],
            &[],
        )]);
        let searcher = Searcher::new(reader);
        let phrase: Query = PhraseQuery::new("body", ["new", "york"]).into();
        assert_eq!(ids(&searcher.search(&phrase, 10).unwrap()), vec!["1"]);
    }

    #[test]
    fn test_cancelled_search_fails() {
        let reader = reader(vec![segment("s0", &[("1", "x")], &[])]);
        let token = CancellationToken::new();
        token.cancel();
        let result = Searcher::new(reader).search_with_cancellation(&Query::term("body", "x"), 10, &token);
        assert!(matches!(result, Err(LucerneError::Cancelled)));
    }

    #[test]
    fn test_search_documents_hydrates() {
        let reader = reader(vec![segment("s0", &[("1", "hello world")], &[])]);
        let hits = Searcher::new(reader)
            .search_documents(&Query::term("body", "hello"), 1)
            .unwrap();
        assert_eq!(hits[0].fields["body"], "hello world");
    }
}
