//! Dictionary-based segmentation for CJK text.

use aho_corasick::{AhoCorasick, MatchKind};

use crate::analysis::token::{TokenStream, positioned};
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::cjk::ScriptRuns;
use crate::analysis::tokenizer::standard::word_pieces;
use crate::error::{LucerneError, Result};

/// Segments CJK runs by forward maximum matching against a user dictionary.
///
/// Within a CJK run the leftmost-longest dictionary word wins; characters not
/// covered by any dictionary word are emitted one by one. Non-CJK text is
/// split on word boundaries like [`StandardTokenizer`](super::StandardTokenizer).
#[derive(Debug, Clone)]
pub struct DictionaryTokenizer {
    matcher: Option<AhoCorasick>,
}

impl DictionaryTokenizer {
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        words.sort();
        words.dedup();

        let matcher = if words.is_empty() {
            None
        } else {
            let automaton = AhoCorasick::builder()
                .match_kind(MatchKind::LeftmostLongest)
                .build(&words)
                .map_err(|e| {
                    LucerneError::invalid_argument(format!("failed to build dictionary: {e}"))
                })?;
            Some(automaton)
        };

        Ok(DictionaryTokenizer { matcher })
    }

    fn segment(&self, run: &str, base: usize) -> Vec<(String, usize, usize)> {
        let mut pieces = Vec::new();
        let mut cursor = 0;

        let push_chars = |pieces: &mut Vec<(String, usize, usize)>, from: usize, to: usize| {
            for (i, c) in run[from..to].char_indices() {
                let start = base + from + i;
                pieces.push((c.to_string(), start, start + c.len_utf8()));
            }
        };

        if let Some(matcher) = &self.matcher {
            for m in matcher.find_iter(run) {
                push_chars(&mut pieces, cursor, m.start());
                pieces.push((
                    run[m.start()..m.end()].to_string(),
                    base + m.start(),
                    base + m.end(),
                ));
                cursor = m.end();
            }
        }
        push_chars(&mut pieces, cursor, run.len());
        pieces
    }
}

impl Tokenizer for DictionaryTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        positioned(ScriptRuns::new(text).flat_map(
            move |(start, run, cjk)| -> Box<dyn Iterator<Item = (String, usize, usize)> + 'a> {
                if cjk {
                    Box::new(self.segment(run, start).into_iter())
                } else {
                    Box::new(word_pieces(run, start))
                }
            },
        ))
    }

    fn name(&self) -> &'static str {
        "dictionary"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokenizer: &DictionaryTokenizer, text: &str) -> Vec<String> {
        tokenizer.tokenize(text).map(|t| t.text).collect()
    }

    #[test]
    fn test_longest_match_wins() {
        let tokenizer = DictionaryTokenizer::new(["北京", "北京市", "海淀区"]).unwrap();
        assert_eq!(texts(&tokenizer, "北京市海淀区"), vec!["北京市", "海淀区"]);
    }

    #[test]
    fn test_unknown_characters_become_unigrams() {
        let tokenizer = DictionaryTokenizer::new(["饭店"]).unwrap();
        assert_eq!(texts(&tokenizer, "追加饭店"), vec!["追", "加", "饭店"]);
    }

    #[test]
    fn test_empty_dictionary_degrades_to_unigrams() {
        let tokenizer = DictionaryTokenizer::new(Vec::<String>::new()).unwrap();
        assert_eq!(texts(&tokenizer, "红绿灯 S302"), vec!["红", "绿", "灯", "S302"]);
    }

    #[test]
    fn test_restartable() {
        let tokenizer = DictionaryTokenizer::new(["自助银行"]).unwrap();
        let first = texts(&tokenizer, "24小时自助银行");
        let second = texts(&tokenizer, "24小时自助银行");
        assert_eq!(first, second);
        assert_eq!(first, vec!["24", "小", "时", "自助银行"]);
    }
}
