//! Unicode word-boundary tokenizer.

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{TokenStream, positioned};
use crate::analysis::tokenizer::Tokenizer;

/// Splits text on UAX #29 word boundaries and keeps the pieces that contain
/// at least one letter or digit.
///
/// Han ideographs have no word-joining rule, so each one becomes its own
/// token. Token text is NFKC-normalized, which folds full-width Latin letters
/// and digits into their ASCII forms.
#[derive(Debug, Clone, Default)]
pub struct StandardTokenizer;

impl StandardTokenizer {
    pub fn new() -> Self {
        StandardTokenizer
    }
}

/// Word pieces of `text` as `(normalized text, start, end)`, with offsets
/// shifted by `base`.
///
/// NFKC can expand a single letter into text containing a space (U+037A
/// becomes `" \u{345}"`), so normalized words are split on whitespace again.
/// Every piece keeps the offsets of the word it came from.
pub(crate) fn word_pieces(text: &str, base: usize) -> impl Iterator<Item = (String, usize, usize)> + '_ {
    text.split_word_bound_indices()
        .filter(|(_, word)| word.chars().any(char::is_alphanumeric))
        .flat_map(move |(start, word)| {
            let normalized: String = word.nfkc().collect();
            let (start, end) = (base + start, base + start + word.len());
            normalized
                .split_whitespace()
                .filter(|piece| piece.chars().any(char::is_alphanumeric))
                .map(|piece| (piece.to_string(), start, end))
                .collect::<Vec<_>>()
        })
}

impl Tokenizer for StandardTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        positioned(word_pieces(text, 0))
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        StandardTokenizer::new().tokenize(text).map(|t| t.text).collect()
    }

    #[test]
    fn test_latin_words_and_punctuation() {
        assert_eq!(
            texts("I have a lot of dreams."),
            vec!["I", "have", "a", "lot", "of", "dreams"]
        );
    }

    #[test]
    fn test_han_characters_split_individually() {
        assert_eq!(texts("北京市"), vec!["北", "京", "市"]);
    }

    #[test]
    fn test_mixed_script_and_digits() {
        assert_eq!(texts("学业路302号"), vec!["学", "业", "路", "302", "号"]);
    }

    #[test]
    fn test_full_width_folding() {
        assert_eq!(texts("Ｓ３０２"), vec!["S302"]);
    }

    #[test]
    fn test_offsets_and_positions() {
        let tokens: Vec<_> = StandardTokenizer::new().tokenize("ab, cd").collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!((tokens[1].start_offset, tokens[1].end_offset), (4, 6));
        assert_eq!(tokens[1].position, 1);
    }

    #[test]
    fn test_normalization_never_leaves_spaces() {
        let tokens = texts("x \u{037A} y");
        assert_eq!(tokens.first().map(String::as_str), Some("x"));
        assert_eq!(tokens.last().map(String::as_str), Some("y"));
        assert!(tokens.iter().all(|t| !t.is_empty() && !t.contains(char::is_whitespace)));
    }

    #[test]
    fn test_empty_text() {
        assert!(texts("").is_empty());
        assert!(texts("  ,.;  ").is_empty());
    }
}
