//! Tokenizers split text into raw tokens.

pub mod cjk;
pub mod dictionary;
pub mod keyword;
pub mod letter;
pub mod standard;
pub mod whitespace;

use std::fmt::Debug;

use crate::analysis::token::TokenStream;

pub use cjk::CjkBigramTokenizer;
pub use dictionary::DictionaryTokenizer;
pub use keyword::KeywordTokenizer;
pub use letter::LetterTokenizer;
pub use standard::StandardTokenizer;
pub use whitespace::WhitespaceTokenizer;

/// Splits text into a lazy token stream.
///
/// Tokenizing never consumes the tokenizer, so the same text can be
/// tokenized again and yields the same stream.
pub trait Tokenizer: Send + Sync + Debug {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a>;

    fn name(&self) -> &'static str;
}
