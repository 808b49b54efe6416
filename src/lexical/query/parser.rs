//! Query string parser.
//!
//! # Supported Syntax
//!
//! - `rust` searches the default field
//! - `title:rust` searches the `title` field
//! - `rust search` requires both clauses (implicit AND)
//! - `-draft` excludes documents matching the clause
//! - `"full text"` matches terms at consecutive positions
//! - `rust OR go` matches either group
//!
//! Clause values go through the analyzer configured for their field, so
//! `name:追加饭店` becomes the conjunction of the terms the analyzer
//! produces. A value made only of stop words is dropped.

use std::sync::Arc;

use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::analysis::PerFieldAnalyzer;
use crate::error::{LucerneError, Result};
use crate::lexical::query::{BooleanClause, BooleanQuery, Occur, PhraseQuery, Query};

/// Pest grammar parser for the query string language.
#[derive(Parser)]
#[grammar = "lexical/query/parser.pest"]
struct QueryStringParser;

/// Parses query strings into [`Query`] values.
#[derive(Debug, Clone)]
pub struct QueryParser {
    analyzer: Arc<PerFieldAnalyzer>,
    default_field: String,
}

impl QueryParser {
    pub fn new(analyzer: Arc<PerFieldAnalyzer>) -> Self {
        QueryParser {
            analyzer,
            default_field: "content".to_string(),
        }
    }

    /// Field searched by clauses without a `field:` qualifier.
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = field.into();
        self
    }

    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    pub fn parse(&self, query_str: &str) -> Result<Query> {
        let mut pairs = QueryStringParser::parse(Rule::query, query_str)
            .map_err(|e| LucerneError::query_syntax(format!("invalid query {query_str:?}: {e}")))?;

        let mut groups = Vec::new();
        if let Some(query) = pairs.next() {
            for pair in query.into_inner() {
                if pair.as_rule() == Rule::group {
                    groups.push(self.parse_group(pair)?);
                }
            }
        }

        Ok(match groups.len() {
            0 => Query::match_none(),
            1 => groups.remove(0),
            _ => {
                let mut disjunction = BooleanQuery::new();
                for group in groups {
                    disjunction.add_should(group);
                }
                disjunction.into()
            }
        })
    }

    fn parse_group(&self, pair: Pair<'_, Rule>) -> Result<Query> {
        let mut group = BooleanQuery::new();
        for clause in pair.into_inner() {
            if let Some((query, occur)) = self.parse_clause(clause)? {
                group.add_clause(BooleanClause::new(query, occur));
            }
        }

        // A single required clause needs no wrapper.
        if group.clauses().len() == 1 && group.clauses()[0].occur == Occur::Must {
            return Ok(group.clauses()[0].query.clone());
        }
        Ok(group.into())
    }

    fn parse_clause(&self, pair: Pair<'_, Rule>) -> Result<Option<(Query, Occur)>> {
        let mut occur = Occur::Must;
        let mut field = self.default_field.as_str();
        let mut value = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::negation => occur = Occur::MustNot,
                Rule::field_clause => {
                    for part in inner.into_inner() {
                        match part.as_rule() {
                            Rule::field_name => field = part.as_str(),
                            Rule::value => value = Some(part),
                            _ => {}
                        }
                    }
                }
                Rule::value => value = Some(inner),
                _ => {}
            }
        }

        let value = value.ok_or_else(|| LucerneError::query_syntax("clause without a value"))?;
        let query = match value.into_inner().next() {
            Some(v) if v.as_rule() == Rule::phrase => {
                let text = v.into_inner().next().map_or("", |t| t.as_str());
                self.phrase_query(field, text)
            }
            Some(v) => self.value_query(field, v.as_str()),
            None => None,
        };
        Ok(query.map(|q| (q, occur)))
    }

    /// The analyzed terms of `text` as a conjunction.
    fn value_query(&self, field: &str, text: &str) -> Option<Query> {
        let mut terms: Vec<Query> = self
            .analyzer
            .tokenize(text, field)
            .map(|term| Query::term(term.field(), term.text()))
            .collect();
        match terms.len() {
            0 => None,
            1 => terms.pop(),
            _ => {
                let mut conjunction = BooleanQuery::new();
                terms.into_iter().for_each(|t| conjunction.add_must(t));
                Some(conjunction.into())
            }
        }
    }

    fn phrase_query(&self, field: &str, text: &str) -> Option<Query> {
        let tokens: Vec<(String, u32)> = self
            .analyzer
            .analyze_field(field, text)
            .map(|token| (token.text, token.position))
            .collect();
        match tokens.len() {
            0 => None,
            1 => tokens
                .into_iter()
                .next()
                .map(|(text, _)| Query::term(field, text)),
            _ => Some(PhraseQuery::with_positions(field, tokens).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{PipelineAnalyzer, StopWords};

    fn parser() -> QueryParser {
        let analyzer = PerFieldAnalyzer::new(Arc::new(PipelineAnalyzer::standard(
            true,
            &StopWords::new(["the"], true),
        )))
        .with_analyzer("id", Arc::new(PipelineAnalyzer::keyword()));
        QueryParser::new(Arc::new(analyzer)).with_default_field("name")
    }

    #[test]
    fn test_single_term_uses_default_field() {
        assert_eq!(parser().parse("Rust").unwrap(), Query::term("name", "rust"));
    }

    #[test]
    fn test_field_qualifier_and_implicit_and() {
        let query = parser().parse("title:rust search").unwrap();
        assert_eq!(query.to_string(), "+title:rust +name:search");
    }

    #[test]
    fn test_multi_term_value_is_conjunction() {
        let query = parser().parse("name:追加").unwrap();
        assert_eq!(query.to_string(), "+name:追 +name:加");
    }

    #[test]
    fn test_keyword_field_keeps_value() {
        assert_eq!(parser().parse("id:AB-12").unwrap(), Query::term("id", "AB-12"));
    }

    #[test]
    fn test_negation_and_phrase() {
        let query = parser().parse("-draft \"hello world\"").unwrap();
        assert_eq!(query.to_string(), "-name:draft +name:\"hello world\"");
    }

    #[test]
    fn test_or_groups() {
        let query = parser().parse("rust OR go lang").unwrap();
        assert_eq!(query.to_string(), "name:rust (+name:go +name:lang)");
    }

    #[test]
    fn test_stop_words_only_value_is_dropped() {
        let query = parser().parse("the rust").unwrap();
        assert_eq!(query, Query::term("name", "rust"));
        assert_eq!(parser().parse("the").unwrap(), Query::match_none());
        assert_eq!(parser().parse("   ").unwrap(), Query::match_none());
    }

    #[test]
    fn test_oracle_is_not_an_operator() {
        assert_eq!(parser().parse("ORACLE").unwrap(), Query::term("name", "oracle"));
    }

    #[test]
    fn test_malformed_queries() {
        for bad in [":x", "name:", "a:b:c", "\"unclosed", "rust OR", "OR rust", "-", "name:-x"] {
            assert!(
                matches!(parser().parse(bad), Err(LucerneError::QuerySyntax(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
