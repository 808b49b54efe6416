//! Keyword tokenizer.

use crate::analysis::token::{TokenStream, offset_in, positioned};
use crate::analysis::tokenizer::Tokenizer;

/// Emits the whole input as one token, minus surrounding whitespace.
#[derive(Debug, Clone, Default)]
pub struct KeywordTokenizer;

impl KeywordTokenizer {
    pub fn new() -> Self {
        KeywordTokenizer
    }
}

impl Tokenizer for KeywordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let trimmed = text.trim();
        let start = offset_in(text, trimmed);
        positioned(std::iter::once((
            trimmed.to_string(),
            start,
            start + trimmed.len(),
        )))
    }

    fn name(&self) -> &'static str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_input_single_token() {
        let tokens: Vec<_> = KeywordTokenizer::new().tokenize("  Hello World ").collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "Hello World");
        assert_eq!(tokens[0].start_offset, 2);
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert_eq!(KeywordTokenizer::new().tokenize("   ").count(), 0);
    }
}
