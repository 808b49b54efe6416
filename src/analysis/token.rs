//! Token representation.

/// A single token produced by a tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token text after normalization.
    pub text: String,

    /// Position in the token stream. Filters that drop tokens keep the
    /// positions of the remaining ones, so gaps are possible.
    pub position: u32,

    /// Byte offset of the token start in the original text.
    pub start_offset: usize,

    /// Byte offset one past the token end in the original text.
    pub end_offset: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, position: u32, start_offset: usize, end_offset: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }
}

/// A lazy stream of tokens borrowing the analyzed text.
pub type TokenStream<'a> = Box<dyn Iterator<Item = Token> + 'a>;

/// Number raw `(text, start, end)` pieces into tokens.
pub(crate) fn positioned<'a, I>(pieces: I) -> TokenStream<'a>
where
    I: Iterator<Item = (String, usize, usize)> + 'a,
{
    Box::new(
        pieces
            .filter(|(text, _, _)| !text.is_empty())
            .enumerate()
            .map(|(pos, (text, start, end))| Token::new(text, pos as u32, start, end)),
    )
}

/// Byte offset of `part` inside `whole`. `part` must be a subslice of `whole`.
pub(crate) fn offset_in(whole: &str, part: &str) -> usize {
    part.as_ptr() as usize - whole.as_ptr() as usize
}
