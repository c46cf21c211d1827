use std::fmt;
use std::io::Read;

use crate::dialect::{DialectParameters, Quote};
use crate::error::Result;
use crate::scanner::{Tokenizer, TokenizerBuilder};

/// A (separator, quote) combination with its combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SepQuoteScore {
    /// `None` when no separator could be found in strict mode.
    pub separator: Option<u8>,
    pub quote: Quote,
    pub score: usize,
}

impl fmt::Display for SepQuoteScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.separator {
            Some(sep) => write!(f, "<{}>", sep as char)?,
            None => write!(f, "<none>")?,
        }
        write!(f, "<{}> -> {}", self.quote, self.score)
    }
}

/// Parameters guessed from a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guess {
    pub parameters: DialectParameters,
    /// True when tokenizing the sample with the parameters gave rows of a
    /// consistent width.
    pub verified: bool,
}

/// What the sniffer learned about an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// The detected dialect.
    pub dialect: DialectParameters,
    /// Whether the dialect was confirmed on the sample.
    pub verified: bool,
    /// Bytes to skip before the data, BOM included.
    pub preamble_len: usize,
    /// Whether the input starts with a UTF-8 BOM.
    pub has_bom: bool,
    /// Whether the sample is valid UTF-8.
    pub is_utf8: bool,
    /// Every (separator, quote) combination, best first.
    pub scores: Vec<SepQuoteScore>,
}

impl Metadata {
    /// A fuzzy tokenizer using the detected dialect.
    ///
    /// The reader should already be past the preamble.
    pub fn tokenizer<R: Read>(&self, reader: R) -> Result<Tokenizer<R>> {
        TokenizerBuilder::from_dialect(self.dialect.clone()).from_reader(reader)
    }
}
