//! Query types.
//!
//! Queries are plain values. They are built either directly or by the
//! [`QueryParser`](parser::QueryParser) from a query string, and executed by
//! the [`Searcher`](crate::lexical::search::Searcher).

pub mod parser;

use std::fmt;

use crate::lexical::term::Term;

/// Occurrence requirements for boolean clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occur {
    /// The clause must match (equivalent to AND).
    Must,
    /// The clause should match (equivalent to OR).
    Should,
    /// The clause must not match (equivalent to NOT).
    MustNot,
    /// The clause must match but does not contribute to scoring.
    Filter,
}

/// Matches documents containing one term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    pub term: Term,
}

impl TermQuery {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        TermQuery {
            term: Term::new(field, text),
        }
    }
}

/// Matches documents containing terms at fixed relative positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseQuery {
    field: String,
    /// Term text with its position relative to the first term.
    terms: Vec<(String, u32)>,
}

impl PhraseQuery {
    /// A phrase of consecutive terms.
    pub fn new<I, S>(field: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms = terms
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.into(), i as u32))
            .collect();
        PhraseQuery {
            field: field.into(),
            terms,
        }
    }

    /// A phrase with explicit token positions. Positions are rebased so the
    /// first term sits at zero; gaps (for instance from removed stop words)
    /// are kept.
    pub fn with_positions(field: impl Into<String>, terms: Vec<(String, u32)>) -> Self {
        let base = terms.iter().map(|(_, pos)| *pos).min().unwrap_or(0);
        let mut terms: Vec<(String, u32)> =
            terms.into_iter().map(|(t, pos)| (t, pos - base)).collect();
        terms.sort_by_key(|(_, pos)| *pos);
        PhraseQuery {
            field: field.into(),
            terms,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn terms(&self) -> &[(String, u32)] {
        &self.terms
    }
}

/// A clause in a boolean query.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanClause {
    pub query: Query,
    pub occur: Occur,
}

impl BooleanClause {
    pub fn new(query: Query, occur: Occur) -> Self {
        BooleanClause { query, occur }
    }

    pub fn must(query: Query) -> Self {
        BooleanClause::new(query, Occur::Must)
    }

    pub fn should(query: Query) -> Self {
        BooleanClause::new(query, Occur::Should)
    }

    pub fn must_not(query: Query) -> Self {
        BooleanClause::new(query, Occur::MustNot)
    }

    pub fn filter(query: Query) -> Self {
        BooleanClause::new(query, Occur::Filter)
    }
}

/// Combines clauses with boolean logic.
///
/// A document matches when it matches every `Must` and `Filter` clause and
/// no `MustNot` clause. If there is no `Must` or `Filter` clause, it must
/// also match at least one `Should` clause. A query without any positive
/// clause matches nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanQuery {
    clauses: Vec<BooleanClause>,
}

impl BooleanQuery {
    pub fn new() -> Self {
        BooleanQuery::default()
    }

    pub fn add_clause(&mut self, clause: BooleanClause) {
        self.clauses.push(clause);
    }

    pub fn add_must(&mut self, query: Query) {
        self.add_clause(BooleanClause::must(query));
    }

    pub fn add_should(&mut self, query: Query) {
        self.add_clause(BooleanClause::should(query));
    }

    pub fn add_must_not(&mut self, query: Query) {
        self.add_clause(BooleanClause::must_not(query));
    }

    pub fn add_filter(&mut self, query: Query) {
        self.add_clause(BooleanClause::filter(query));
    }

    pub fn with_clause(mut self, clause: BooleanClause) -> Self {
        self.add_clause(clause);
        self
    }

    pub fn clauses(&self) -> &[BooleanClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn has_positive_clause(&self) -> bool {
        self.clauses.iter().any(|c| c.occur != Occur::MustNot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Term(TermQuery),
    Phrase(PhraseQuery),
    Boolean(BooleanQuery),
}

impl Query {
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Query::Term(TermQuery::new(field, text))
    }

    /// A query that matches no document.
    pub fn match_none() -> Self {
        Query::Boolean(BooleanQuery::new())
    }

    /// Every term the query mentions, negated clauses included.
    pub fn terms(&self) -> Vec<Term> {
        let mut terms = Vec::new();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms(&self, out: &mut Vec<Term>) {
        match self {
            Query::Term(q) => out.push(q.term.clone()),
            Query::Phrase(q) => out.extend(
                q.terms
                    .iter()
                    .map(|(text, _)| Term::new(q.field.as_str(), text.as_str())),
            ),
            Query::Boolean(q) => q.clauses.iter().for_each(|c| c.query.collect_terms(out)),
        }
    }
}

impl From<TermQuery> for Query {
    fn from(query: TermQuery) -> Self {
        Query::Term(query)
    }
}

impl From<PhraseQuery> for Query {
    fn from(query: PhraseQuery) -> Self {
        Query::Phrase(query)
    }
}

impl From<BooleanQuery> for Query {
    fn from(query: BooleanQuery) -> Self {
        Query::Boolean(query)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Term(q) => write!(f, "{}", q.term),
            Query::Phrase(q) => {
                let words: Vec<&str> = q.terms.iter().map(|(t, _)| t.as_str()).collect();
                write!(f, "{}:\"{}\"", q.field, words.join(" "))
            }
            Query::Boolean(q) => {
                for (i, clause) in q.clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    let prefix = match clause.occur {
                        Occur::Must => "+",
                        Occur::Should => "",
                        Occur::MustNot => "-",
                        Occur::Filter => "#",
                    };
                    match &clause.query {
                        Query::Boolean(_) => write!(f, "{prefix}({})", clause.query)?,
                        other => write!(f, "{prefix}{other}")?,
                    }
                }
                Ok(())
            }
        }
    }
}
