//! Sniffer builder and sniff methods.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::dialect::{DialectParameters, Quote};
use crate::encoding::detect_encoding;
use crate::error::{Error, Result};
use crate::heuristics::{guess_comment, guess_escape, rank_sep_quote, rows_consistent};
use crate::metadata::{Guess, Metadata, SepQuoteScore};
use crate::preamble::preamble_len;
use crate::sample::{SampleSize, read_sample};

/// A candidate escape byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscapeCandidate {
    /// The escape is the quote character itself (doubled quotes).
    SameAsQuote,
    /// A fixed escape byte.
    Byte(u8),
}

impl EscapeCandidate {
    /// The escape byte when quoting with `quote`.
    pub fn resolve(self, quote: u8) -> u8 {
        match self {
            EscapeCandidate::SameAsQuote => quote,
            EscapeCandidate::Byte(b) => b,
        }
    }
}

/// Dialect sniffer.
///
/// Scores the separator and quote candidates found in a sample, ranks their
/// combinations, then keeps the best one that tokenizes the sample into rows
/// of the same width. In lenient mode (the default) the best combination is
/// returned unverified when none can be confirmed; in strict mode nothing is.
///
/// # Example
///
/// ```
/// use csv_scout::{Quote, Sniffer};
///
/// let metadata = Sniffer::new()
///     .sniff_bytes(b"name;city\n'Smith; J.';Paris\nDoe;Rome\n")
///     .unwrap();
///
/// assert_eq!(metadata.dialect.separator, Some(b';'));
/// assert_eq!(metadata.dialect.quote, Quote::Some(b'\''));
/// assert!(metadata.verified);
/// ```
#[derive(Debug, Clone)]
pub struct Sniffer {
    sample_size: SampleSize,
    separators: Vec<u8>,
    quotes: Vec<u8>,
    escapes: Vec<EscapeCandidate>,
    comments: Vec<Vec<u8>>,
    strict: bool,
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sniffer {
    /// Separators `,` `;` TAB `|` `&`, quotes `"` `'` `` ` ``, escapes
    /// doubled-quote and `\`, comments `#` and `//`, lenient, 100 records.
    pub fn new() -> Self {
        Self {
            sample_size: SampleSize::default(),
            separators: b",;\t|&".to_vec(),
            quotes: b"\"'`".to_vec(),
            escapes: vec![EscapeCandidate::SameAsQuote, EscapeCandidate::Byte(b'\\')],
            comments: vec![b"#".to_vec(), b"//".to_vec()],
            strict: false,
        }
    }

    /// Set the sample size for [`sniff_reader`](Self::sniff_reader) and
    /// [`sniff_path`](Self::sniff_path).
    pub fn sample_size(&mut self, sample_size: SampleSize) -> &mut Self {
        self.sample_size = sample_size;
        self
    }

    /// Candidate separators, in order of preference.
    pub fn separators(&mut self, separators: &[u8]) -> &mut Self {
        self.separators = separators.to_vec();
        self
    }

    /// Candidate quote characters, in order of preference.
    pub fn quotes(&mut self, quotes: &[u8]) -> &mut Self {
        self.quotes = quotes.to_vec();
        self
    }

    /// Candidate escapes, in order of preference.
    pub fn escapes(&mut self, escapes: &[EscapeCandidate]) -> &mut Self {
        self.escapes = escapes.to_vec();
        self
    }

    /// Candidate comment prefixes, in order of preference.
    pub fn comments(&mut self, comments: &[&[u8]]) -> &mut Self {
        self.comments = comments.iter().map(|c| c.to_vec()).collect();
        self
    }

    /// In strict mode, parameters without evidence are left unset and an
    /// unverified guess is no guess.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Every (separator, quote) combination of `data`, best first. Never
    /// empty.
    pub fn sep_quote_scores(&self, data: &[u8]) -> Vec<SepQuoteScore> {
        rank_sep_quote(data, &self.separators, &self.quotes, self.strict)
    }

    /// The best separator and quote of `data`.
    pub fn best_sep_quote(&self, data: &[u8]) -> (Option<u8>, Quote) {
        match self.sep_quote_scores(data).first() {
            Some(best) => (best.separator, best.quote),
            None => (None, Quote::None),
        }
    }

    /// The most likely comment prefix of `data`.
    pub fn guess_comment(&self, data: &[u8]) -> Option<Vec<u8>> {
        guess_comment(data, &self.comments, self.strict).map(<[u8]>::to_vec)
    }

    /// The most likely escape byte for `quote` in `data`.
    pub fn guess_escape(&self, data: &[u8], quote: Quote) -> Option<u8> {
        guess_escape(data, quote, &self.escapes, self.strict)
    }

    /// Guess the full set of parameters of `data`.
    ///
    /// Combinations are tried best first and the first one that verifies
    /// wins. Failing that, lenient mode returns the best combination
    /// unverified and strict mode returns `None`. Parameters that fail
    /// [`DialectParameters::validate`] never verify, so the unverified
    /// fallback may hold them.
    pub fn guess_parameters(&self, data: &[u8]) -> Option<Guess> {
        let comment = self.guess_comment(data).unwrap_or_default();
        let candidates: Vec<DialectParameters> = self
            .sep_quote_scores(data)
            .into_iter()
            .map(|s| {
                DialectParameters::new(s.separator, s.quote)
                    .with_escape(self.guess_escape(data, s.quote))
                    .with_comment(comment.clone())
            })
            .collect();

        for parameters in &candidates {
            let verified = rows_consistent(data, parameters);
            tracing::debug!(parameters = %parameters, verified, "candidate checked");
            if verified {
                return Some(Guess {
                    parameters: parameters.clone(),
                    verified: true,
                });
            }
        }
        if self.strict {
            return None;
        }
        candidates.into_iter().next().map(|parameters| Guess {
            parameters,
            verified: false,
        })
    }

    /// Sniff a file, reading the configured sample from its start.
    pub fn sniff_path<P: AsRef<Path>>(&self, path: P) -> Result<Metadata> {
        let file = File::open(path.as_ref())?;
        self.sniff_reader(BufReader::new(file))
    }

    /// Sniff the configured sample fetched from `url`.
    #[cfg(feature = "http")]
    pub fn sniff_url(&self, url: &str) -> Result<Metadata> {
        let sample = crate::http::fetch_sample(url, self.sample_size)?;
        self.sniff_bytes(&sample.data)
    }

    /// Sniff the configured sample read from `reader`.
    pub fn sniff_reader<R: Read>(&self, reader: R) -> Result<Metadata> {
        let data = read_sample(reader, self.sample_size)?;
        self.sniff_bytes(&data)
    }

    /// Sniff a sample held in memory.
    ///
    /// The preamble (and BOM) is located first and the guess is made on
    /// the bytes after it.
    pub fn sniff_bytes(&self, data: &[u8]) -> Result<Metadata> {
        if data.is_empty() {
            return Err(Error::EmptyData);
        }
        let encoding = detect_encoding(data);
        let preamble_len = preamble_len(data);
        let body = &data[preamble_len..];
        tracing::debug!(
            sample_len = data.len(),
            preamble_len,
            has_bom = encoding.has_bom,
            "sniffing sample"
        );

        let Some(guess) = self.guess_parameters(body) else {
            return Err(Error::NoDialectDetected(
                "no candidate dialect could be verified".to_string(),
            ));
        };
        Ok(Metadata {
            dialect: guess.parameters,
            verified: guess.verified,
            preamble_len,
            has_bom: encoding.has_bom,
            is_utf8: encoding.is_utf8,
            scores: self.sep_quote_scores(body),
        })
    }
}
