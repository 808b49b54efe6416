//! Letter-run tokenizer.

use crate::analysis::token::{TokenStream, offset_in, positioned};
use crate::analysis::tokenizer::Tokenizer;

/// Emits maximal runs of alphabetic characters. Digits, punctuation and
/// whitespace all act as separators, so numbers never produce tokens.
#[derive(Debug, Clone, Default)]
pub struct LetterTokenizer;

impl LetterTokenizer {
    pub fn new() -> Self {
        LetterTokenizer
    }
}

impl Tokenizer for LetterTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        positioned(
            text.split(|c: char| !c.is_alphabetic())
                .filter(|run| !run.is_empty())
                .map(move |run| {
                    let start = offset_in(text, run);
                    (run.to_string(), start, start + run.len())
                }),
        )
    }

    fn name(&self) -> &'static str {
        "letter"
    }
}
