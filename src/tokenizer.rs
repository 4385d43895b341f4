//! The tokenizer seam.
//!
//! Every budget in this crate is measured in tokens, and every token count
//! comes from one [`Tokenizer`]. The segmentation engine never tokenizes on
//! its own: it asks the tokenizer to count, encode, and decode, and it
//! assumes one fixed vocabulary for the whole run. Mixing two tokenizers
//! across a run makes overlaps and budgets meaningless.
//!
//! ## Built-in Tokenizers
//!
//! | Tokenizer | Vocabulary | Use |
//! |-----------|------------|-----|
//! | [`WordTokenizer`] | Unicode word boundaries, interned per instance | Tests, offline runs |
//! | `Cl100kTokenizer` | `cl100k_base` BPE (feature `tiktoken`) | Matching a GPT-style model budget |
//!
//! `WordTokenizer` is lossless: decoding the tokens of any text gives back
//! exactly that text, whitespace included.
//!
//! ```text
//! "Call me Ishmael.\n"
//!  -> ["Call", " me", " Ishmael", ".", "\n"]
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, Result};

/// A token identifier.
pub type Token = u32;

/// Counts, encodes, and decodes text with one fixed vocabulary.
///
/// Implementations must be deterministic: the same text always encodes to
/// the same tokens, and `decode(encode(text))` should reproduce `text` as
/// closely as the vocabulary allows.
pub trait Tokenizer: Send + Sync {
    /// Encode text into tokens.
    ///
    /// # Errors
    ///
    /// Implementations report their own failures as [`Error::Tokenizer`].
    fn encode(&self, text: &str) -> Result<Vec<Token>>;

    /// Decode tokens back into text.
    ///
    /// # Errors
    ///
    /// Fails on ids outside the vocabulary.
    fn decode(&self, tokens: &[Token]) -> Result<String>;

    /// Count the tokens in `text`.
    ///
    /// # Errors
    ///
    /// Propagates [`encode`](Self::encode) failures.
    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }
}

/// Lossless word-boundary tokenizer.
///
/// Splits on UAX #29 word boundaries and attaches each whitespace run to
/// the token that follows it, the way BPE vocabularies fold a leading space
/// into a word. Each distinct piece is interned on first sight, so ids are
/// stable for the lifetime of one instance.
///
/// ```rust
/// use quire::{Tokenizer, WordTokenizer};
///
/// let tokenizer = WordTokenizer::new();
/// let tokens = tokenizer.encode("The quick  brown fox.").unwrap();
/// assert_eq!(tokens.len(), 5);
/// assert_eq!(tokenizer.decode(&tokens).unwrap(), "The quick  brown fox.");
/// ```
#[derive(Debug, Default)]
pub struct WordTokenizer {
    vocab: RwLock<Vocab>,
}

#[derive(Debug, Default)]
struct Vocab {
    ids: HashMap<String, Token>,
    pieces: Vec<String>,
}

impl WordTokenizer {
    /// Create a tokenizer with an empty vocabulary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pieces seen so far.
    pub fn vocab_size(&self) -> usize {
        self.vocab.read().map(|v| v.pieces.len()).unwrap_or(0)
    }
}

/// Split text into word pieces with leading whitespace attached.
fn pieces(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;

    for (idx, segment) in text.split_word_bound_indices() {
        if segment.chars().all(char::is_whitespace) {
            continue;
        }
        let end = idx + segment.len();
        out.push(&text[start..end]);
        start = end;
    }

    // Trailing whitespace becomes its own piece
    if start < text.len() {
        out.push(&text[start..]);
    }

    out
}

impl Tokenizer for WordTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<Token>> {
        let mut vocab = self
            .vocab
            .write()
            .map_err(|_| Error::tokenizer("word vocabulary lock poisoned"))?;

        let tokens = pieces(text)
            .into_iter()
            .map(|piece| {
                if let Some(&id) = vocab.ids.get(piece) {
                    return id;
                }
                let id = vocab.pieces.len() as Token;
                vocab.pieces.push(piece.to_string());
                vocab.ids.insert(piece.to_string(), id);
                id
            })
            .collect();

        Ok(tokens)
    }

    fn decode(&self, tokens: &[Token]) -> Result<String> {
        let vocab = self
            .vocab
            .read()
            .map_err(|_| Error::tokenizer("word vocabulary lock poisoned"))?;

        let mut text = String::new();
        for &token in tokens {
            let piece = vocab
                .pieces
                .get(token as usize)
                .ok_or_else(|| Error::tokenizer(format!("unknown token id {token}")))?;
            text.push_str(piece);
        }
        Ok(text)
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(pieces(text).len())
    }
}

/// `cl100k_base` BPE tokenizer backed by `tiktoken-rs`.
#[cfg(feature = "tiktoken")]
pub struct Cl100kTokenizer {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl Cl100kTokenizer {
    /// Load the `cl100k_base` vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tokenizer`] if the vocabulary cannot be loaded.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().map_err(Error::tokenizer)?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl std::fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cl100kTokenizer").finish_non_exhaustive()
    }
}

#[cfg(feature = "tiktoken")]
impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<Token>> {
        Ok(self.bpe.encode_with_special_tokens(text))
    }

    fn decode(&self, tokens: &[Token]) -> Result<String> {
        self.bpe.decode(tokens.to_vec()).map_err(Error::tokenizer)
    }
}
