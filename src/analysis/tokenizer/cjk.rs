//! Character-bigram tokenizer for scripts without word separators.

use crate::analysis::token::{TokenStream, positioned};
use crate::analysis::tokenizer::Tokenizer;
use crate::analysis::tokenizer::standard::word_pieces;

/// Whether `c` belongs to a script written without spaces between words
/// (Han, Hiragana, Katakana, Hangul).
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x309F        // Hiragana
        | 0x30A0..=0x30FF      // Katakana
        | 0x3400..=0x4DBF      // CJK Extension A
        | 0x4E00..=0x9FFF      // CJK Unified Ideographs
        | 0xAC00..=0xD7AF      // Hangul Syllables
        | 0x1100..=0x11FF      // Hangul Jamo
        | 0xF900..=0xFAFF      // CJK Compatibility Ideographs
        | 0x20000..=0x2A6DF    // CJK Extension B
    )
}

/// Splits text into maximal runs of CJK and non-CJK characters.
///
/// Yields `(byte offset, run, is_cjk)`.
pub(crate) struct ScriptRuns<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> ScriptRuns<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        ScriptRuns { text, pos: 0 }
    }
}

impl<'a> Iterator for ScriptRuns<'a> {
    type Item = (usize, &'a str, bool);

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.text[self.pos..];
        let first = rest.chars().next()?;
        let cjk = is_cjk(first);
        let len = rest
            .char_indices()
            .find(|&(_, c)| is_cjk(c) != cjk)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let start = self.pos;
        self.pos += len;
        Some((start, &rest[..len], cjk))
    }
}

/// Overlapping bigrams of a CJK run; a one-character run yields a unigram.
fn bigrams(run: &str, base: usize) -> Vec<(String, usize, usize)> {
    let chars: Vec<(usize, char)> = run.char_indices().collect();
    if chars.len() == 1 {
        let (i, c) = chars[0];
        return vec![(c.to_string(), base + i, base + i + c.len_utf8())];
    }

    chars
        .windows(2)
        .map(|pair| {
            let (i, a) = pair[0];
            let (j, b) = pair[1];
            let mut text = String::with_capacity(a.len_utf8() + b.len_utf8());
            text.push(a);
            text.push(b);
            (text, base + i, base + j + b.len_utf8())
        })
        .collect()
}

/// Emits overlapping character bigrams over CJK runs and standard word
/// tokens for everything else.
///
/// "北京市" becomes "北京", "京市". The bigram approach needs no dictionary
/// but produces many redundant terms.
#[derive(Debug, Clone, Default)]
pub struct CjkBigramTokenizer;

impl CjkBigramTokenizer {
    pub fn new() -> Self {
        CjkBigramTokenizer
    }
}

impl Tokenizer for CjkBigramTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        positioned(ScriptRuns::new(text).flat_map(
            |(start, run, cjk)| -> Box<dyn Iterator<Item = (String, usize, usize)> + 'a> {
                if cjk {
                    Box::new(bigrams(run, start).into_iter())
                } else {
                    Box::new(word_pieces(run, start))
                }
            },
        ))
    }

    fn name(&self) -> &'static str {
        "cjk"
    }
}
