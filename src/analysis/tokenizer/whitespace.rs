//! Whitespace tokenizer.

use crate::analysis::token::{TokenStream, offset_in, positioned};
use crate::analysis::tokenizer::Tokenizer;

/// Splits text on whitespace only; punctuation stays attached to words.
#[derive(Debug, Clone, Default)]
pub struct WhitespaceTokenizer;

impl WhitespaceTokenizer {
    pub fn new() -> Self {
        WhitespaceTokenizer
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        positioned(text.split_whitespace().map(move |word| {
            let start = offset_in(text, word);
            (word.to_string(), start, start + word.len())
        }))
    }

    fn name(&self) -> &'static str {
        "whitespace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_whitespace_only() {
        let tokens: Vec<_> = WhitespaceTokenizer::new()
            .tokenize(" 北京798  天津路,海德花园\tS302 ")
            .collect();
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["北京798", "天津路,海德花园", "S302"]);
        assert_eq!(tokens[0].start_offset, 1);
        assert!(tokens.iter().all(|t| t.text.trim() == t.text));
    }
}
